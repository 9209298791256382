pub mod catalog_service;
pub mod coupon_engine;
pub mod discount_service;
pub mod order_service;

pub use catalog_service::*;
pub use coupon_engine::*;
pub use discount_service::*;
pub use order_service::*;
