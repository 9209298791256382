use crate::entities::{app_user_entity, product_entity};
use crate::error::{AppError, AppResult};
use crate::utils::from_cents;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub sku: Option<String>,
    #[serde(with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub regular_price: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub sale_price: Option<Decimal>,
    pub quantity: i32,
    pub points: i32,
    pub created_at: DateTime<Utc>,
}

impl From<product_entity::Model> for ProductResponse {
    fn from(m: product_entity::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            slug: m.slug,
            sku: m.sku,
            regular_price: m.regular_price_cents.map(from_cents),
            sale_price: m.sale_price_cents.map(from_cents),
            quantity: m.quantity,
            points: m.points,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AppUserResponse {
    pub id: i32,
    pub number: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<app_user_entity::Model> for AppUserResponse {
    fn from(m: app_user_entity::Model) -> Self {
        Self {
            id: m.id,
            number: m.number,
            name: m.name,
            email: m.email,
            created_at: m.created_at,
        }
    }
}

/// 注册 App 用户（手机号唯一）
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateAppUserRequest {
    #[schema(example = "+15550000001")]
    pub number: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

impl CreateAppUserRequest {
    /// 去除首尾空白，空字符串视为未填写
    pub fn normalized(&self) -> AppResult<(String, Option<String>, Option<String>)> {
        let number = self.number.trim();
        if number.is_empty() || number.chars().count() > 20 {
            return Err(AppError::ValidationError(
                "Number must be between 1 and 20 characters".to_string(),
            ));
        }

        let name = optional_text(self.name.as_deref());
        if name.as_ref().is_some_and(|n| n.chars().count() > 100) {
            return Err(AppError::ValidationError(
                "Name must be at most 100 characters".to_string(),
            ));
        }

        let email = optional_text(self.email.as_deref());
        if let Some(email) = &email
            && (email.chars().count() > 254 || !email.contains('@'))
        {
            return Err(AppError::ValidationError("Invalid email".to_string()));
        }

        Ok((number.to_string(), name, email))
    }
}

fn optional_text(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(number: &str, email: Option<&str>) -> CreateAppUserRequest {
        CreateAppUserRequest {
            number: number.to_string(),
            name: Some("  ".to_string()),
            email: email.map(str::to_string),
        }
    }

    #[test]
    fn test_blank_optional_fields_become_none() {
        let (number, name, email) = request(" +15550000001 ", Some(""))
            .normalized()
            .expect("valid");
        assert_eq!(number, "+15550000001");
        assert_eq!(name, None);
        assert_eq!(email, None);
    }

    #[test]
    fn test_rejects_bad_number_or_email() {
        assert!(request("", None).normalized().is_err());
        assert!(request("123456789012345678901", None).normalized().is_err());
        assert!(request("+1555", Some("not-an-email")).normalized().is_err());
    }

    #[test]
    fn test_product_prices_are_json_numbers() {
        let body = serde_json::to_value(ProductResponse::from(product_entity::Model {
            id: 1,
            name: "Tee".to_string(),
            slug: "tee".to_string(),
            sku: None,
            regular_price_cents: Some(1999),
            sale_price_cents: None,
            quantity: 3,
            points: 10,
            created_at: Utc::now(),
        }))
        .expect("serialize");
        assert_eq!(body["regular_price"].as_f64(), Some(19.99));
        assert!(body["sale_price"].is_null());
    }
}
