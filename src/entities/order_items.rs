use crate::utils::from_cents;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

/// 订单项
///
/// - price_cents: 单价(美分)，积分兑换的订单项为 0
/// - points: 积分，可为 0 或负数
/// - image: 媒体目录下的相对路径
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "order_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub order_id: i32,
    pub name: String,
    pub price_cents: i64,
    pub quantity: i32,
    pub points: i32,
    pub variants: Option<String>,
    pub image: Option<String>,
}

impl Model {
    pub fn price(&self) -> Decimal {
        from_cents(self.price_cents)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
