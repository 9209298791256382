use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

/// 订单状态，任意状态之间都可以直接切换
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    ToSchema,
    DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(20))")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "process")]
    Process,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "on_the_way")]
    OnTheWay,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "pending"),
            OrderStatus::Process => write!(f, "process"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
            OrderStatus::Delivered => write!(f, "delivered"),
            OrderStatus::OnTheWay => write!(f, "on_the_way"),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "process" => Ok(OrderStatus::Process),
            "cancelled" => Ok(OrderStatus::Cancelled),
            "delivered" => Ok(OrderStatus::Delivered),
            "on_the_way" => Ok(OrderStatus::OnTheWay),
            _ => Err(()),
        }
    }
}

/// 订单类型：由订单项价格推导，不允许直接设置
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    ToSchema,
    DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(20))")]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    #[sea_orm(string_value = "normal")]
    Normal,
    #[sea_orm(string_value = "redeem")]
    Redeem,
}

impl OrderType {
    /// 至少一个订单项且全部单价为 0 时为积分兑换订单，否则为普通订单（空订单为普通订单）
    pub fn classify<I>(price_cents: I) -> Self
    where
        I: IntoIterator<Item = i64>,
    {
        let mut has_items = false;
        for cents in price_cents {
            if cents != 0 {
                return OrderType::Normal;
            }
            has_items = true;
        }
        if has_items {
            OrderType::Redeem
        } else {
            OrderType::Normal
        }
    }
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderType::Normal => write!(f, "normal"),
            OrderType::Redeem => write!(f, "redeem"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: Option<i32>,
    /// JSON 文本
    pub address: String,
    /// JSON 文本
    pub shipping: String,
    pub status: OrderStatus,
    pub order_type: OrderType,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
