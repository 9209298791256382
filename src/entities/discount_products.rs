use sea_orm::entity::prelude::*;

/// 优惠券适用商品（apply_all_products = false 时生效）
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "discount_products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub discount_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub product_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
