use sea_orm::entity::prelude::*;

/// 优惠券适用用户（apply_all_users = false 时生效）
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "discount_users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub discount_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
