use crate::error::AppResult;
use crate::utils::truncate_cents;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// 新优惠券通知内容
#[derive(Debug, Clone)]
pub struct CouponAnnouncement {
    pub title: String,
    pub code: String,
    pub value: Decimal,
    pub is_percentage: bool,
    pub end_date: DateTime<Utc>,
}

impl CouponAnnouncement {
    pub fn subject(&self) -> String {
        format!("New coupon: {}", self.title)
    }

    pub fn body(&self) -> String {
        let amount = if self.is_percentage {
            format!("{}% off", self.value.normalize())
        } else {
            format!("${} off", truncate_cents(self.value))
        };
        format!(
            "Use code {} for {amount}. Valid until {}.",
            self.code,
            self.end_date.format("%Y-%m-%d")
        )
    }
}

/// 优惠券通知发送接口
///
/// 发送失败由调用方记录日志，不影响优惠券本身的保存
pub trait CouponNotifier: Send + Sync {
    fn announce(&self, coupon: &CouponAnnouncement, recipients: &[String]) -> AppResult<()>;
}

/// 默认实现：仅写日志
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl CouponNotifier for LogNotifier {
    fn announce(&self, coupon: &CouponAnnouncement, recipients: &[String]) -> AppResult<()> {
        log::info!(
            "Coupon {} announced to {} recipient(s): {}",
            coupon.code,
            recipients.len(),
            coupon.subject()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_announcement_body() {
        let end = DateTime::parse_from_rfc3339("2025-12-31T23:59:59Z")
            .expect("date")
            .with_timezone(&Utc);
        let pct = CouponAnnouncement {
            title: "Winter".to_string(),
            code: "WINTER15".to_string(),
            value: dec!(15.00),
            is_percentage: true,
            end_date: end,
        };
        assert_eq!(pct.body(), "Use code WINTER15 for 15% off. Valid until 2025-12-31.");

        let fixed = CouponAnnouncement {
            is_percentage: false,
            value: dec!(5),
            ..pct
        };
        assert_eq!(fixed.body(), "Use code WINTER15 for $5.00 off. Valid until 2025-12-31.");
    }
}
