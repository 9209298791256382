pub mod app_users;
pub mod discount_products;
pub mod discount_users;
pub mod discounts;
pub mod order_items;
pub mod orders;
pub mod payments;
pub mod products;

pub use app_users as app_user_entity;
pub use discount_products as discount_product_entity;
pub use discount_users as discount_user_entity;
pub use discounts as discount_entity;
pub use order_items as order_item_entity;
pub use orders as order_entity;
pub use payments as payment_entity;
pub use products as product_entity;

pub use discounts::DiscountType;
pub use orders::{OrderStatus, OrderType};
