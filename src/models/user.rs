use crate::entities::app_user_entity;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 订单中展示的下单用户信息
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserDetail {
    pub id: i32,
    pub number: String,
    pub name: Option<String>,
    pub email: Option<String>,
    /// 已送达普通订单积分 - 已送达兑换订单积分
    pub total_points: i64,
}

impl UserDetail {
    pub fn new(user: app_user_entity::Model, total_points: i64) -> Self {
        Self {
            id: user.id,
            number: user.number,
            name: user.name,
            email: user.email,
            total_points,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PointsResponse {
    pub user_id: i32,
    pub total_points: i64,
}
