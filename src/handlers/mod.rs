pub mod catalog;
pub mod discount;
pub mod order;
pub mod user;

pub use catalog::catalog_config;
pub use discount::{admin_config, discount_config};
pub use order::order_config;
pub use user::user_config;
