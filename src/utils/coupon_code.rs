use crate::error::{AppError, AppResult};
use regex::Regex;
use std::sync::LazyLock;

static COUPON_CODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,50}$").expect("coupon code pattern"));

/// 验证优惠码格式：1-50 位字母、数字、下划线或连字符
pub fn validate_coupon_code(code: &str) -> AppResult<()> {
    if !COUPON_CODE_REGEX.is_match(code) {
        return Err(AppError::ValidationError(
            "Coupon code must be 1-50 letters, digits, '_' or '-'".to_string(),
        ));
    }
    Ok(())
}

/// 优惠码比较统一使用小写
pub fn normalize_coupon_code(code: &str) -> String {
    code.to_lowercase()
}
