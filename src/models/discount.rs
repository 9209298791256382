use crate::entities::{DiscountType, discount_entity};
use crate::error::{AppError, AppResult};
use crate::services::coupon_engine::{
    COUPON_APPLIED_MESSAGE, CartItem, CartRequest, CouponRejection, PricingDecision,
};
use crate::utils::{decimal_from_json, has_at_most_two_places, integer_from_json, validate_coupon_code};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// 优惠券校验请求
///
/// 客户端传入的字段类型并不统一（数字或数字字符串），因此先按原始 JSON 接收，
/// 再通过 [`ValidateCouponRequest::normalize`] 转换为计价请求。
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ValidateCouponRequest {
    #[serde(default)]
    #[schema(value_type = String, example = "SAVE10")]
    pub code: Value,
    #[serde(default)]
    #[schema(value_type = f64, example = 99.99)]
    pub total: Value,
    #[serde(default)]
    #[schema(value_type = Vec<i32>)]
    pub products: Value,
    #[serde(default)]
    #[schema(value_type = Vec<CartItemInput>)]
    pub items: Value,
}

/// 购物车商品（仅用于文档）
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartItemInput {
    pub id: i32,
    #[schema(value_type = f64)]
    pub price: Decimal,
    pub quantity: i32,
}

impl ValidateCouponRequest {
    pub fn normalize(&self) -> Result<CartRequest, CouponRejection> {
        let code = match &self.code {
            Value::String(s) if !s.is_empty() => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return Err(CouponRejection::MissingCode),
        };

        // 缺省或空值按 0 处理
        let claimed_total = match &self.total {
            Value::Null => Decimal::ZERO,
            Value::String(s) if s.trim().is_empty() => Decimal::ZERO,
            other => decimal_from_json(other)
                .filter(|total| *total >= Decimal::ZERO)
                .ok_or(CouponRejection::InvalidTotal)?,
        };

        let product_ids = match &self.products {
            Value::Null => Vec::new(),
            Value::Array(values) => values
                .iter()
                .map(json_id)
                .collect::<Option<Vec<i32>>>()
                .ok_or(CouponRejection::InvalidItems)?,
            _ => return Err(CouponRejection::InvalidItems),
        };

        let items = match &self.items {
            Value::Null => Vec::new(),
            Value::Array(values) => values
                .iter()
                .map(cart_item_from_json)
                .collect::<Option<Vec<CartItem>>>()
                .ok_or(CouponRejection::InvalidItems)?,
            _ => return Err(CouponRejection::InvalidItems),
        };

        Ok(CartRequest {
            code,
            claimed_total,
            product_ids,
            items,
        })
    }
}

fn json_id(value: &Value) -> Option<i32> {
    integer_from_json(value).and_then(|id| i32::try_from(id).ok())
}

/// 单价缺省为 0，数量缺省为 1
fn cart_item_from_json(value: &Value) -> Option<CartItem> {
    let obj = value.as_object()?;
    let id = json_id(obj.get("id")?)?;

    let price = match obj.get("price") {
        None | Some(Value::Null) => Decimal::ZERO,
        Some(v) => decimal_from_json(v)?,
    };
    if price < Decimal::ZERO {
        return None;
    }

    let quantity = match obj.get("quantity") {
        None | Some(Value::Null) => 1,
        Some(v) => i32::try_from(integer_from_json(v)?).ok()?,
    };
    if quantity < 1 {
        return None;
    }

    Some(CartItem {
        id,
        price,
        quantity,
    })
}

/// 优惠券校验结果（不使用统一响应结构）
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CouponValidationResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_type: Option<DiscountType>,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<f64>)]
    pub value: Option<Decimal>,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<f64>)]
    pub discount_amount: Option<Decimal>,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<f64>)]
    pub final_total: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_product_ids: Option<Vec<i32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub message: String,
}

impl From<PricingDecision> for CouponValidationResponse {
    fn from(d: PricingDecision) -> Self {
        Self {
            valid: true,
            code: Some(d.code),
            discount_type: Some(d.discount_type),
            value: Some(d.value),
            discount_amount: Some(d.discount_amount),
            final_total: Some(d.final_total),
            applied_product_ids: Some(d.applied_product_ids),
            reason: None,
            message: COUPON_APPLIED_MESSAGE.to_string(),
        }
    }
}

impl From<CouponRejection> for CouponValidationResponse {
    fn from(r: CouponRejection) -> Self {
        Self {
            valid: false,
            code: None,
            discount_type: None,
            value: None,
            discount_amount: None,
            final_total: None,
            applied_product_ids: None,
            reason: Some(r.reason().to_string()),
            message: r.to_string(),
        }
    }
}

/// 创建 / 更新优惠券（PUT 为整体替换）
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DiscountRequest {
    pub title: String,
    pub code: String,
    pub discount_type: DiscountType,
    #[schema(value_type = f64, example = 10.0)]
    pub value: Decimal,
    #[serde(default = "default_true")]
    pub active: bool,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub apply_all_products: bool,
    #[serde(default)]
    pub apply_all_users: bool,
    pub max_uses: Option<i32>,
    /// apply_all_products 为 false 时生效
    #[serde(default)]
    pub products: Vec<i32>,
    /// apply_all_users 为 false 时生效
    #[serde(default)]
    pub users: Vec<i32>,
}

fn default_true() -> bool {
    true
}

impl DiscountRequest {
    /// 字段级校验（不访问数据库）
    pub fn validate(&self) -> AppResult<()> {
        let title_len = self.title.trim().chars().count();
        if title_len == 0 || title_len > 50 {
            return Err(AppError::ValidationError(
                "Title length must be between 1 and 50 characters".to_string(),
            ));
        }

        validate_coupon_code(&self.code)?;

        if self.value <= Decimal::ZERO {
            return Err(AppError::ValidationError(
                "Value must be greater than 0".to_string(),
            ));
        }
        if !has_at_most_two_places(self.value) {
            return Err(AppError::ValidationError(
                "Value must have at most 2 decimal places".to_string(),
            ));
        }
        if self.discount_type == DiscountType::Percentage && self.value > Decimal::ONE_HUNDRED {
            return Err(AppError::ValidationError(
                "Percentage value must not exceed 100".to_string(),
            ));
        }
        if self.end_date < self.start_date {
            return Err(AppError::ValidationError(
                "End date must not be before start date".to_string(),
            ));
        }
        if matches!(self.max_uses, Some(n) if n < 1) {
            return Err(AppError::ValidationError(
                "max_uses must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// 实际需要写入关联表的商品
    pub fn scoped_products(&self) -> &[i32] {
        if self.apply_all_products {
            &[]
        } else {
            &self.products
        }
    }

    /// 实际需要写入关联表的用户
    pub fn scoped_users(&self) -> &[i32] {
        if self.apply_all_users {
            &[]
        } else {
            &self.users
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DiscountResponse {
    pub id: i32,
    pub title: String,
    pub code: String,
    pub discount_type: DiscountType,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub value: Decimal,
    pub active: bool,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub apply_all_products: bool,
    pub apply_all_users: bool,
    pub max_uses: Option<i32>,
    pub used_count: i32,
    pub products: Vec<i32>,
    pub users: Vec<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DiscountResponse {
    pub fn from_parts(m: discount_entity::Model, products: Vec<i32>, users: Vec<i32>) -> Self {
        Self {
            value: m.value(),
            id: m.id,
            title: m.title,
            code: m.code,
            discount_type: m.discount_type,
            active: m.active,
            start_date: m.start_date,
            end_date: m.end_date,
            apply_all_products: m.apply_all_products,
            apply_all_users: m.apply_all_users,
            max_uses: m.max_uses,
            used_count: m.used_count,
            products,
            users,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DiscountQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub active: Option<bool>,
}
