pub mod admin_service;
pub mod auth_service;
pub mod catalog_service;
pub mod coupon_service;
pub mod order_service;
