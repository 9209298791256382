//! 优惠券计价引擎
//!
//! 纯计算：输入为优惠券条款与购物车，输出计价结果或拒绝原因，不访问数据库。
//! 所有金额使用 `Decimal` 精确计算，折扣额与最终金额截断到两位小数（不进位）。

use crate::entities::{DiscountType, discount_entity};
use crate::utils::truncate_cents;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashSet;
use thiserror::Error;

pub const COUPON_APPLIED_MESSAGE: &str = "Coupon applied successfully!";

/// 购物车中的一项（由调用方提供，不落库）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItem {
    pub id: i32,
    pub price: Decimal,
    pub quantity: i32,
}

impl CartItem {
    /// 单价 × 数量，溢出时返回 `None`
    pub fn line_total(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity))
    }
}

/// 已规范化的计价请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartRequest {
    pub code: String,
    /// 调用方声明的总价，仅在券适用全部商品时使用
    pub claimed_total: Decimal,
    pub product_ids: Vec<i32>,
    pub items: Vec<CartItem>,
}

/// 折扣规则，每种折扣一个变体
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscountRule {
    /// 百分比 (0-100)
    Percentage(Decimal),
    /// 固定金额，不超过计价基数
    Fixed(Decimal),
}

impl DiscountRule {
    pub fn new(kind: DiscountType, value: Decimal) -> Self {
        match kind {
            DiscountType::Percentage => DiscountRule::Percentage(value),
            DiscountType::Fixed => DiscountRule::Fixed(value),
        }
    }

    /// 针对 `base` 的折扣额，截断到两位小数；溢出时返回 `None`
    pub fn amount_off(&self, base: Decimal) -> Option<Decimal> {
        match *self {
            DiscountRule::Percentage(percent) => base
                .checked_mul(percent)?
                .checked_div(Decimal::ONE_HUNDRED)
                .map(truncate_cents),
            DiscountRule::Fixed(amount) => Some(truncate_cents(amount.min(base))),
        }
    }
}

/// 计价失败原因；以结构化结果返回，不作为异常抛出
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CouponRejection {
    #[error("Invalid request body.")]
    InvalidRequest,
    #[error("Coupon code is required.")]
    MissingCode,
    #[error("Invalid total amount.")]
    InvalidTotal,
    #[error("Invalid cart items.")]
    InvalidItems,
    #[error("Invalid coupon code.")]
    CouponNotFound,
    #[error("Coupon not active yet.")]
    CouponNotYetActive,
    #[error("Coupon expired.")]
    CouponExpired,
    #[error("No products provided for coupon.")]
    NoProductsSpecified,
}

impl CouponRejection {
    pub fn reason(&self) -> &'static str {
        match self {
            CouponRejection::InvalidRequest => "INVALID_REQUEST",
            CouponRejection::MissingCode => "MISSING_CODE",
            CouponRejection::InvalidTotal => "INVALID_TOTAL",
            CouponRejection::InvalidItems => "INVALID_ITEMS",
            CouponRejection::CouponNotFound => "COUPON_NOT_FOUND",
            CouponRejection::CouponNotYetActive => "COUPON_NOT_YET_ACTIVE",
            CouponRejection::CouponExpired => "COUPON_EXPIRED",
            CouponRejection::NoProductsSpecified => "NO_PRODUCTS_SPECIFIED",
        }
    }
}

/// 计价所需的优惠券条款快照
#[derive(Debug, Clone)]
pub struct CouponTerms {
    pub code: String,
    pub discount_type: DiscountType,
    pub value: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub apply_all_products: bool,
    /// apply_all_products 时忽略
    pub eligible_product_ids: HashSet<i32>,
}

impl CouponTerms {
    pub fn from_model(model: &discount_entity::Model, eligible_product_ids: HashSet<i32>) -> Self {
        Self {
            code: model.code.clone(),
            discount_type: model.discount_type,
            value: model.value(),
            start_date: model.start_date,
            end_date: model.end_date,
            apply_all_products: model.apply_all_products,
            eligible_product_ids,
        }
    }

    pub fn rule(&self) -> DiscountRule {
        DiscountRule::new(self.discount_type, self.value)
    }
}

/// 计价成功结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingDecision {
    pub code: String,
    pub discount_type: DiscountType,
    pub value: Decimal,
    pub discount_amount: Decimal,
    pub final_total: Decimal,
    pub applied_product_ids: Vec<i32>,
}

/// 计算优惠券对购物车的折扣
///
/// 逻辑:
/// 1. 校验有效期（两端包含）
/// 2. 券仅适用部分商品时：只对购物车中符合条件的商品计折扣，其余商品原价计入
/// 3. 券适用全部商品时：直接以调用方声明的总价计折扣
/// 4. 最终金额小于 0 时置为 0
///
/// 金额溢出视为请求无效：总价溢出为 `InvalidTotal`，商品金额溢出为 `InvalidItems`。
pub fn price_cart(
    terms: &CouponTerms,
    cart: &CartRequest,
    now: DateTime<Utc>,
) -> Result<PricingDecision, CouponRejection> {
    if now < terms.start_date {
        return Err(CouponRejection::CouponNotYetActive);
    }
    if now > terms.end_date {
        return Err(CouponRejection::CouponExpired);
    }

    let rule = terms.rule();

    let (discount_amount, final_total, applied_product_ids) = if terms.apply_all_products {
        let discount_amount = rule
            .amount_off(cart.claimed_total)
            .ok_or(CouponRejection::InvalidTotal)?;
        let final_total = cart
            .claimed_total
            .checked_sub(discount_amount)
            .map(truncate_cents)
            .ok_or(CouponRejection::InvalidTotal)?;
        (discount_amount, final_total, cart.product_ids.clone())
    } else {
        if cart.product_ids.is_empty() {
            return Err(CouponRejection::NoProductsSpecified);
        }

        let (eligible, rest): (Vec<&CartItem>, Vec<&CartItem>) = cart
            .items
            .iter()
            .partition(|item| terms.eligible_product_ids.contains(&item.id));

        let eligible_total = sum_lines(&eligible).ok_or(CouponRejection::InvalidItems)?;
        let non_eligible_total = sum_lines(&rest).ok_or(CouponRejection::InvalidItems)?;

        let discount_amount = rule
            .amount_off(eligible_total)
            .ok_or(CouponRejection::InvalidItems)?;
        let final_total = eligible_total
            .checked_sub(discount_amount)
            .and_then(|subtotal| subtotal.checked_add(non_eligible_total))
            .map(truncate_cents)
            .ok_or(CouponRejection::InvalidItems)?;
        let applied = eligible.iter().map(|item| item.id).collect();
        (discount_amount, final_total, applied)
    };

    let final_total = if final_total < Decimal::ZERO {
        truncate_cents(Decimal::ZERO)
    } else {
        final_total
    };

    Ok(PricingDecision {
        code: terms.code.clone(),
        discount_type: terms.discount_type,
        value: terms.value,
        discount_amount,
        final_total,
        applied_product_ids,
    })
}

fn sum_lines(items: &[&CartItem]) -> Option<Decimal> {
    items
        .iter()
        .try_fold(Decimal::ZERO, |acc, item| acc.checked_add(item.line_total()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn terms(kind: DiscountType, value: Decimal, products: &[i32]) -> CouponTerms {
        let now = Utc::now();
        CouponTerms {
            code: "SAVE10".to_string(),
            discount_type: kind,
            value,
            start_date: now - Duration::days(1),
            end_date: now + Duration::days(1),
            apply_all_products: products.is_empty(),
            eligible_product_ids: products.iter().copied().collect(),
        }
    }

    fn item(id: i32, price: Decimal, quantity: i32) -> CartItem {
        CartItem {
            id,
            price,
            quantity,
        }
    }

    fn cart(total: Decimal, product_ids: Vec<i32>, items: Vec<CartItem>) -> CartRequest {
        CartRequest {
            code: "save10".to_string(),
            claimed_total: total,
            product_ids,
            items,
        }
    }

    #[test]
    fn test_percentage_on_all_products_rounds_down() {
        let t = terms(DiscountType::Percentage, dec!(10), &[]);
        let c = cart(dec!(99.99), vec![1, 2], vec![]);

        let d = price_cart(&t, &c, Utc::now()).expect("coupon applies");
        assert_eq!(d.discount_amount, dec!(9.99));
        assert_eq!(d.final_total, dec!(90.00));
        assert_eq!(d.applied_product_ids, vec![1, 2]);
        assert_eq!(d.code, "SAVE10");
        assert_eq!(d.value, dec!(10));
    }

    #[test]
    fn test_fixed_on_scoped_products_caps_at_eligible_total() {
        let t = terms(DiscountType::Fixed, dec!(50), &[5, 6]);
        let c = cart(
            dec!(0),
            vec![5, 7],
            vec![item(5, dec!(20), 2), item(7, dec!(15), 1)],
        );

        let d = price_cart(&t, &c, Utc::now()).expect("coupon applies");
        assert_eq!(d.discount_amount, dec!(40.00));
        assert_eq!(d.final_total, dec!(15.00));
        assert_eq!(d.applied_product_ids, vec![5]);
    }

    #[test]
    fn test_fixed_covering_whole_cart_clamps_to_zero() {
        let t = terms(DiscountType::Fixed, dec!(150), &[]);
        let c = cart(dec!(120.50), vec![1], vec![]);

        let d = price_cart(&t, &c, Utc::now()).expect("coupon applies");
        assert_eq!(d.discount_amount, dec!(120.50));
        assert_eq!(d.final_total, dec!(0.00));
    }

    #[test]
    fn test_percentage_on_subset_ignores_non_eligible_prices() {
        let t = terms(DiscountType::Percentage, dec!(15), &[1]);
        let eligible = item(1, dec!(33.33), 3);

        let cheap = cart(dec!(0), vec![1, 2], vec![eligible.clone(), item(2, dec!(1), 1)]);
        let pricey = cart(
            dec!(0),
            vec![1, 2],
            vec![eligible.clone(), item(2, dec!(999.99), 4)],
        );

        let a = price_cart(&t, &cheap, Utc::now()).expect("coupon applies");
        let b = price_cart(&t, &pricey, Utc::now()).expect("coupon applies");
        // 99.99 * 15% = 14.9985
        assert_eq!(a.discount_amount, dec!(14.99));
        assert_eq!(a.discount_amount, b.discount_amount);
        assert_eq!(a.final_total, dec!(99.99) - dec!(14.99) + dec!(1));
        assert_eq!(b.final_total, dec!(99.99) - dec!(14.99) + dec!(3999.96));
    }

    #[test]
    fn test_all_items_eligible_matches_cart_total_minus_discount() {
        let t = terms(DiscountType::Percentage, dec!(12.5), &[1, 2]);
        let items = vec![item(1, dec!(10.10), 3), item(2, dec!(4.99), 1)];
        let total: Decimal = items
            .iter()
            .map(|i| i.line_total().expect("line total"))
            .sum();
        let c = cart(dec!(0), vec![1, 2], items);

        let d = price_cart(&t, &c, Utc::now()).expect("coupon applies");
        assert_eq!(d.final_total, total - d.discount_amount);
        assert_eq!(d.applied_product_ids, vec![1, 2]);
    }

    #[test]
    fn test_scoped_coupon_without_matching_items_gives_no_discount() {
        let t = terms(DiscountType::Percentage, dec!(50), &[9]);
        let c = cart(dec!(0), vec![1], vec![item(1, dec!(10), 2)]);

        let d = price_cart(&t, &c, Utc::now()).expect("coupon applies");
        assert_eq!(d.discount_amount, dec!(0.00));
        assert_eq!(d.final_total, dec!(20.00));
        assert!(d.applied_product_ids.is_empty());
    }

    #[test]
    fn test_scoped_coupon_requires_product_ids() {
        let t = terms(DiscountType::Fixed, dec!(5), &[1]);
        let c = cart(dec!(0), vec![], vec![item(1, dec!(10), 1)]);
        assert_eq!(
            price_cart(&t, &c, Utc::now()),
            Err(CouponRejection::NoProductsSpecified)
        );
    }

    #[test]
    fn test_expired_coupon_rejected_regardless_of_scope() {
        let now = Utc::now();
        for scope in [&[][..], &[1][..]] {
            let mut t = terms(DiscountType::Fixed, dec!(5), scope);
            t.start_date = now - Duration::days(10);
            t.end_date = now - Duration::days(1);
            let c = cart(dec!(10), vec![1], vec![item(1, dec!(10), 1)]);
            let rejection = price_cart(&t, &c, now).expect_err("expired");
            assert_eq!(rejection, CouponRejection::CouponExpired);
            assert_eq!(rejection.to_string(), "Coupon expired.");
        }
    }

    #[test]
    fn test_coupon_not_yet_active() {
        let now = Utc::now();
        let mut t = terms(DiscountType::Fixed, dec!(5), &[]);
        t.start_date = now + Duration::hours(1);
        let c = cart(dec!(10), vec![1], vec![]);
        assert_eq!(
            price_cart(&t, &c, now),
            Err(CouponRejection::CouponNotYetActive)
        );
    }

    #[test]
    fn test_window_bounds_are_valid() {
        let t = terms(DiscountType::Fixed, dec!(5), &[]);
        let c = cart(dec!(10), vec![1], vec![]);
        assert!(price_cart(&t, &c, t.start_date).is_ok());
        assert!(price_cart(&t, &c, t.end_date).is_ok());
    }

    #[test]
    fn test_pricing_is_idempotent() {
        let t = terms(DiscountType::Percentage, dec!(7), &[3]);
        let c = cart(
            dec!(0),
            vec![3, 4],
            vec![item(3, dec!(19.99), 2), item(4, dec!(5.55), 1)],
        );
        let now = Utc::now();
        assert_eq!(price_cart(&t, &c, now), price_cart(&t, &c, now));
    }

    #[test]
    fn test_percentage_above_hundred_clamps_final_total() {
        let t = terms(DiscountType::Percentage, dec!(150), &[]);
        let c = cart(dec!(20), vec![1], vec![]);
        let d = price_cart(&t, &c, Utc::now()).expect("coupon applies");
        assert_eq!(d.discount_amount, dec!(30.00));
        assert_eq!(d.final_total, dec!(0.00));
    }

    #[test]
    fn test_overflowing_item_amounts_are_rejected() {
        let t = terms(DiscountType::Percentage, dec!(10), &[5]);

        let huge_line = cart(dec!(0), vec![5], vec![item(5, Decimal::MAX, 2)]);
        assert_eq!(
            price_cart(&t, &huge_line, Utc::now()),
            Err(CouponRejection::InvalidItems)
        );

        // 单行不溢出，但合计溢出
        let huge_sum = cart(
            dec!(0),
            vec![5, 6],
            vec![item(6, Decimal::MAX, 1), item(6, Decimal::MAX, 1)],
        );
        assert_eq!(
            price_cart(&t, &huge_sum, Utc::now()),
            Err(CouponRejection::InvalidItems)
        );

        // 折扣计算溢出
        let huge_base = cart(dec!(0), vec![5], vec![item(5, Decimal::MAX, 1)]);
        assert_eq!(
            price_cart(&t, &huge_base, Utc::now()),
            Err(CouponRejection::InvalidItems)
        );
    }

    #[test]
    fn test_overflowing_total_is_rejected() {
        let t = terms(DiscountType::Percentage, dec!(10), &[]);
        let c = cart(Decimal::MAX, vec![1], vec![]);
        assert_eq!(
            price_cart(&t, &c, Utc::now()),
            Err(CouponRejection::InvalidTotal)
        );

        // 固定金额不做乘法，大额总价仍可计价
        let fixed = terms(DiscountType::Fixed, dec!(5), &[]);
        let d = price_cart(&fixed, &cart(dec!(1000000000000), vec![1], vec![]), Utc::now())
            .expect("coupon applies");
        assert_eq!(d.final_total, dec!(999999999995.00));
    }

    #[test]
    fn test_rejection_reasons() {
        assert_eq!(CouponRejection::CouponNotFound.reason(), "COUPON_NOT_FOUND");
        assert_eq!(CouponRejection::InvalidRequest.reason(), "INVALID_REQUEST");
        assert_eq!(
            CouponRejection::CouponNotFound.to_string(),
            "Invalid coupon code."
        );
        assert_eq!(
            CouponRejection::NoProductsSpecified.to_string(),
            "No products provided for coupon."
        );
    }
}
