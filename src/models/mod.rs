pub mod catalog;
pub mod common;
pub mod discount;
pub mod order;
pub mod pagination;
pub mod user;

pub use catalog::*;
pub use common::*;
pub use discount::*;
pub use order::*;
pub use pagination::*;
pub use user::*;
