pub mod auth;
pub mod catalog;
pub mod coupons;
pub mod orders;
pub mod products;
