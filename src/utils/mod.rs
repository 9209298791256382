pub mod coupon_code;
pub mod money;

pub use coupon_code::{normalize_coupon_code, validate_coupon_code};
pub use money::*;
