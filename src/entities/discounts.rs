use crate::utils::from_cents;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use utoipa::ToSchema;

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
pub enum DiscountType {
    #[sea_orm(string_value = "percentage")]
    #[serde(alias = "percent")]
    Percentage,
    #[sea_orm(string_value = "fixed")]
    Fixed,
}

impl std::fmt::Display for DiscountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscountType::Percentage => write!(f, "percentage"),
            DiscountType::Fixed => write!(f, "fixed"),
        }
    }
}

/// 优惠券
///
/// 概念说明:
/// - value_hundredths: 面值 × 100（百分比 10% -> 1000，固定金额 $5.00 -> 500）
/// - start_date / end_date: 有效期，两端均包含
/// - max_uses: NULL 表示不限次数
/// - used_count: 已使用次数，只增不减
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "discounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub code: String,
    pub discount_type: DiscountType,
    pub value_hundredths: i64,
    pub active: bool,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub apply_all_products: bool,
    pub apply_all_users: bool,
    pub max_uses: Option<i32>,
    pub used_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn value(&self) -> Decimal {
        from_cents(self.value_hundredths)
    }

    /// 当前时间是否在有效期内（两端包含）
    pub fn is_within_window(&self, now: DateTime<Utc>) -> bool {
        self.start_date <= now && now <= self.end_date
    }

    pub fn has_remaining_uses(&self) -> bool {
        match self.max_uses {
            None => true,
            Some(max) => self.used_count < max,
        }
    }

    /// 用户在 `now` 时刻能否使用此券
    ///
    /// `scoped_users` 为券关联的用户集合，apply_all_users 时忽略
    pub fn is_usable_by(
        &self,
        user_id: i32,
        scoped_users: &HashSet<i32>,
        now: DateTime<Utc>,
    ) -> bool {
        self.active
            && self.is_within_window(now)
            && self.has_remaining_uses()
            && (self.apply_all_users || scoped_users.contains(&user_id))
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn coupon(now: DateTime<Utc>) -> Model {
        Model {
            id: 1,
            title: "Ten off".to_string(),
            code: "SAVE10".to_string(),
            discount_type: DiscountType::Percentage,
            value_hundredths: 1000,
            active: true,
            start_date: now - Duration::days(1),
            end_date: now + Duration::days(1),
            apply_all_products: true,
            apply_all_users: false,
            max_uses: Some(2),
            used_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_usable_by_scoped_user() {
        let now = Utc::now();
        let c = coupon(now);
        let users: HashSet<i32> = [7].into_iter().collect();
        assert!(c.is_usable_by(7, &users, now));
        assert!(!c.is_usable_by(8, &users, now));
    }

    #[test]
    fn test_apply_all_users_ignores_user_set() {
        let now = Utc::now();
        let mut c = coupon(now);
        c.apply_all_users = true;
        assert!(c.is_usable_by(8, &HashSet::new(), now));
    }

    #[test]
    fn test_inactive_or_exhausted_coupon_is_unusable() {
        let now = Utc::now();
        let users: HashSet<i32> = [7].into_iter().collect();

        let mut inactive = coupon(now);
        inactive.active = false;
        assert!(!inactive.is_usable_by(7, &users, now));

        let mut exhausted = coupon(now);
        exhausted.used_count = 2;
        assert!(!exhausted.is_usable_by(7, &users, now));

        let mut unlimited = coupon(now);
        unlimited.max_uses = None;
        unlimited.used_count = 1_000;
        assert!(unlimited.is_usable_by(7, &users, now));
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let now = Utc::now();
        let c = coupon(now);
        assert!(c.is_within_window(c.start_date));
        assert!(c.is_within_window(c.end_date));
        assert!(!c.is_within_window(c.end_date + Duration::seconds(1)));
        assert!(!c.is_within_window(c.start_date - Duration::seconds(1)));
    }

    #[test]
    fn test_value_from_hundredths() {
        let now = Utc::now();
        let mut c = coupon(now);
        c.value_hundredths = 1250;
        assert_eq!(c.value(), Decimal::new(1250, 2));
    }
}
