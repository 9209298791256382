use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// 商品目录（只读协作方）
///
/// 价格以美分存储；优惠券的商品范围通过 discount_products 关联
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub sku: Option<String>,
    pub regular_price_cents: Option<i64>,
    pub sale_price_cents: Option<i64>,
    pub quantity: i32,
    pub points: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
