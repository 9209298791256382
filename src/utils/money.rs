//! 金额工具
//!
//! 数据库中金额一律以“分”（i64）存储，计算时转换为 `Decimal`，
//! 对外输出时才转换为浮点数。

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;
use std::str::FromStr;

pub const MONEY_SCALE: u32 = 2;

/// 截断到两位小数（不进位），结果固定保留两位小数
pub fn truncate_cents(amount: Decimal) -> Decimal {
    let mut truncated = amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::ToZero);
    truncated.rescale(MONEY_SCALE);
    truncated
}

/// 分 -> 金额
pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, MONEY_SCALE)
}

/// 金额 -> 分，超过两位的小数按四舍五入处理；超出 i64 范围时返回 `None`
pub fn to_cents(amount: Decimal) -> Option<i64> {
    amount
        .round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
        .checked_mul(Decimal::ONE_HUNDRED)?
        .to_i64()
}

/// 是否最多两位小数（1.50 视为两位）
pub fn has_at_most_two_places(amount: Decimal) -> bool {
    amount.normalize().scale() <= MONEY_SCALE
}

/// 将 JSON 数字或数字字符串解析为 `Decimal`
pub fn decimal_from_json(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s.trim()),
        _ => None,
    }
}

/// 将 JSON 整数、整值浮点数或整数字符串解析为 i64
pub fn integer_from_json(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    if raw.is_empty() {
        return None;
    }
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_truncate_cents_never_rounds_up() {
        assert_eq!(truncate_cents(dec!(9.999)), dec!(9.99));
        assert_eq!(truncate_cents(dec!(0.005)), dec!(0.00));
        assert_eq!(truncate_cents(dec!(40)).to_string(), "40.00");
        assert_eq!(truncate_cents(dec!(90.0000)).to_string(), "90.00");
    }

    #[test]
    fn test_cents_conversion() {
        assert_eq!(from_cents(9999), dec!(99.99));
        assert_eq!(to_cents(dec!(99.99)), Some(9999));
        assert_eq!(to_cents(dec!(12.345)), Some(1235));
        assert_eq!(to_cents(dec!(0)), Some(0));
    }

    #[test]
    fn test_to_cents_out_of_range() {
        assert_eq!(to_cents(Decimal::MAX), None);
        assert_eq!(to_cents(dec!(100000000000000000000)), None);
    }

    #[test]
    fn test_has_at_most_two_places() {
        assert!(has_at_most_two_places(dec!(1.50)));
        assert!(has_at_most_two_places(dec!(1.500)));
        assert!(!has_at_most_two_places(dec!(1.505)));
    }

    #[test]
    fn test_decimal_from_json() {
        assert_eq!(decimal_from_json(&json!(19.99)), Some(dec!(19.99)));
        assert_eq!(decimal_from_json(&json!("19.99")), Some(dec!(19.99)));
        assert_eq!(decimal_from_json(&json!(20)), Some(dec!(20)));
        assert_eq!(decimal_from_json(&json!("1e2")), Some(dec!(100)));
        assert_eq!(decimal_from_json(&json!("abc")), None);
        assert_eq!(decimal_from_json(&json!("")), None);
        assert_eq!(decimal_from_json(&json!(true)), None);
        assert_eq!(decimal_from_json(&Value::Null), None);
    }

    #[test]
    fn test_integer_from_json() {
        assert_eq!(integer_from_json(&json!(3)), Some(3));
        assert_eq!(integer_from_json(&json!(3.0)), Some(3));
        assert_eq!(integer_from_json(&json!("3")), Some(3));
        assert_eq!(integer_from_json(&json!(2.5)), None);
        assert_eq!(integer_from_json(&json!("2.5")), None);
        assert_eq!(integer_from_json(&json!([1])), None);
    }
}
