use crate::entities::{
    OrderStatus, OrderType, order_entity, order_item_entity, payment_entity,
};
use crate::error::{AppError, AppResult};
use crate::models::UserDetail;
use crate::utils::{has_at_most_two_places, to_cents};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// 收货地址（额外字段原样保留）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 配送信息（额外字段原样保留）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShippingInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 从数据库中的 JSON 文本解析，失败时返回空结构
pub fn parse_json_text<T: DeserializeOwned + Default>(raw: &str) -> T {
    serde_json::from_str(raw).unwrap_or_default()
}

/// 客户端可以直接传对象，也可以传 JSON 字符串；其他情况一律视为空对象
pub fn json_object_text(value: &Value) -> String {
    let obj = match value {
        Value::Object(map) => Some(map.clone()),
        Value::String(s) => serde_json::from_str::<Map<String, Value>>(s).ok(),
        _ => None,
    };
    Value::Object(obj.unwrap_or_default()).to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct OrderItemInput {
    pub name: String,
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,
    pub quantity: Option<i32>,
    #[serde(alias = "points")]
    pub pts: Option<i32>,
    pub variants: Option<String>,
    /// data URI、图片 URL 或 `{ "uri": ... }`
    #[schema(value_type = Option<Object>)]
    pub image: Option<Value>,
}

/// 校验后的订单项字段（图片另行处理）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedItem {
    pub name: String,
    pub price_cents: i64,
    pub quantity: i32,
    pub points: i32,
    pub variants: Option<String>,
}

impl OrderItemInput {
    pub fn validate(&self) -> AppResult<ValidatedItem> {
        let name = self.name.trim();
        if name.is_empty() || name.chars().count() > 255 {
            return Err(AppError::ValidationError(
                "Item name must be between 1 and 255 characters".to_string(),
            ));
        }
        Ok(ValidatedItem {
            name: name.to_string(),
            price_cents: validate_price(self.price.unwrap_or(Decimal::ZERO))?,
            quantity: validate_quantity(self.quantity.unwrap_or(1))?,
            points: self.pts.unwrap_or(0),
            variants: self.variants.clone(),
        })
    }
}

pub fn validate_price(price: Decimal) -> AppResult<i64> {
    if price < Decimal::ZERO || !has_at_most_two_places(price) {
        return Err(AppError::ValidationError(
            "Item price must be a non-negative amount with at most 2 decimals".to_string(),
        ));
    }
    to_cents(price).ok_or_else(|| AppError::ValidationError("Item price is too large".to_string()))
}

pub fn validate_quantity(quantity: i32) -> AppResult<i32> {
    if quantity < 1 {
        return Err(AppError::ValidationError(
            "Item quantity must be at least 1".to_string(),
        ));
    }
    Ok(quantity)
}

/// 部分更新订单项，未提供的字段保持不变
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct OrderItemPatch {
    pub name: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,
    pub quantity: Option<i32>,
    #[serde(alias = "points")]
    pub pts: Option<i32>,
    pub variants: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub image: Option<Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct PaymentInput {
    pub method: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreateOrderRequest {
    pub user_id: Option<i32>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub address: Value,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub shipping: Value,
    /// 缺省为 pending
    pub status: Option<String>,
    #[serde(default)]
    pub product: Vec<OrderItemInput>,
    #[serde(default)]
    pub payment: Vec<PaymentInput>,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

/// 解析订单状态，非法值返回 "Invalid status"
pub fn parse_order_status(raw: &str) -> AppResult<OrderStatus> {
    raw.parse()
        .map_err(|_| AppError::ValidationError("Invalid status".to_string()))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct OrderQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub order_type: Option<OrderType>,
    pub status: Option<OrderStatus>,
    pub user_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: i32,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub price: Decimal,
    pub quantity: i32,
    pub pts: i32,
    pub variants: Option<String>,
    pub image: Option<String>,
}

impl From<order_item_entity::Model> for OrderItemResponse {
    fn from(m: order_item_entity::Model) -> Self {
        Self {
            price: m.price(),
            id: m.id,
            name: m.name,
            quantity: m.quantity,
            pts: m.points,
            variants: m.variants,
            image: m.image,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaymentResponse {
    pub id: i32,
    pub method: String,
    pub status: String,
}

impl From<payment_entity::Model> for PaymentResponse {
    fn from(m: payment_entity::Model) -> Self {
        Self {
            id: m.id,
            method: m.method,
            status: m.status,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: i32,
    pub user_detail: Option<UserDetail>,
    #[schema(value_type = Object)]
    pub address: AddressInfo,
    #[schema(value_type = Object)]
    pub shipping: ShippingInfo,
    pub status: OrderStatus,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub items: Vec<OrderItemResponse>,
    pub payments: Vec<PaymentResponse>,
    pub created_at: DateTime<Utc>,
}

impl OrderResponse {
    pub fn from_parts(
        order: order_entity::Model,
        user_detail: Option<UserDetail>,
        items: Vec<order_item_entity::Model>,
        payments: Vec<payment_entity::Model>,
    ) -> Self {
        Self {
            id: order.id,
            user_detail,
            address: parse_json_text(&order.address),
            shipping: parse_json_text(&order.shipping),
            status: order.status,
            order_type: order.order_type,
            items: items.into_iter().map(Into::into).collect(),
            payments: payments.into_iter().map(Into::into).collect(),
            created_at: order.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_json_object_text_accepts_object_or_encoded_string() {
        let from_obj = json_object_text(&json!({"city": "Austin"}));
        assert_eq!(from_obj, r#"{"city":"Austin"}"#);

        let from_str = json_object_text(&json!(r#"{"city":"Austin"}"#));
        assert_eq!(from_str, from_obj);

        assert_eq!(json_object_text(&json!("not json")), "{}");
        assert_eq!(json_object_text(&json!([1, 2])), "{}");
        assert_eq!(json_object_text(&Value::Null), "{}");
    }

    #[test]
    fn test_parse_address_keeps_unknown_fields() {
        let address: AddressInfo =
            parse_json_text(r#"{"street":"1 Main St","city":"Austin","unit":"4B"}"#);
        assert_eq!(address.street.as_deref(), Some("1 Main St"));
        assert_eq!(address.extra.get("unit"), Some(&json!("4B")));

        let reencoded = serde_json::to_value(&address).expect("serialize");
        assert_eq!(reencoded["unit"], json!("4B"));
    }

    #[test]
    fn test_parse_failure_yields_empty_structure() {
        let address: AddressInfo = parse_json_text("{'city': 'Austin'}");
        assert_eq!(address, AddressInfo::default());
        let shipping: ShippingInfo = parse_json_text("");
        assert_eq!(shipping, ShippingInfo::default());
    }

    #[test]
    fn test_item_defaults() {
        let input: OrderItemInput =
            serde_json::from_value(json!({"name": "Mug"})).expect("item");
        let item = input.validate().expect("valid");
        assert_eq!(item.price_cents, 0);
        assert_eq!(item.quantity, 1);
        assert_eq!(item.points, 0);
    }

    #[test]
    fn test_item_accepts_points_alias_and_string_price() {
        let input: OrderItemInput =
            serde_json::from_value(json!({"name": "Mug", "price": "12.50", "points": -40}))
                .expect("item");
        let item = input.validate().expect("valid");
        assert_eq!(item.price_cents, 1250);
        assert_eq!(item.points, -40);
    }

    #[test]
    fn test_item_validation_errors() {
        assert!(validate_price(dec!(-1)).is_err());
        assert!(validate_price(dec!(1.999)).is_err());
        assert!(validate_quantity(0).is_err());
        assert!(matches!(
            validate_price(Decimal::MAX),
            Err(AppError::ValidationError(msg)) if msg == "Item price is too large"
        ));

        let blank: OrderItemInput =
            serde_json::from_value(json!({"name": "  "})).expect("item");
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_parse_order_status() {
        assert_eq!(parse_order_status("on_the_way").ok(), Some(OrderStatus::OnTheWay));
        assert!(parse_order_status("shipped").is_err());
    }
}
