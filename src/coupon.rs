//! Coupon eligibility rules and discount arithmetic.
//!
//! Everything in this module is pure: the services fetch the coupon and the
//! customer's redemption row, these functions decide. All money amounts are
//! integer cents, so "two decimal places" currency precision is exact.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::entity::coupons::{DiscountType, Model as Coupon};

/// Why a coupon cannot be applied. Every failure is non-fatal: the caller
/// drops the code or proceeds without a discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CouponError {
    #[error("coupon code not found")]
    NotFound,
    #[error("coupon has been deactivated")]
    Deactivated,
    #[error("coupon is not active yet")]
    NotYetActive,
    #[error("coupon has expired")]
    Expired,
    #[error("coupon has no redemptions left")]
    Exhausted,
    #[error("per-customer usage limit reached")]
    PerCustomerLimitReached,
}

impl CouponError {
    /// Machine-readable rejection reason for the wire.
    pub fn reason(&self) -> &'static str {
        match self {
            CouponError::NotFound => "not_found",
            CouponError::Deactivated => "deactivated",
            CouponError::NotYetActive => "not_yet_active",
            CouponError::Expired => "expired",
            CouponError::Exhausted => "exhausted",
            CouponError::PerCustomerLimitReached => "per_customer_limit_reached",
        }
    }
}

/// Codes are compared case-insensitively; the canonical form is trimmed
/// uppercase, which is also how they are stored.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Checks the coupon's own terms in order: kill-switch, activation window,
/// global cap. Short-circuits at the first failure so each rejection carries
/// a distinct kind. The window is inclusive at both ends.
pub fn check_terms(coupon: &Coupon, now: DateTime<Utc>) -> Result<(), CouponError> {
    if !coupon.active {
        return Err(CouponError::Deactivated);
    }
    if now < coupon.active_from {
        return Err(CouponError::NotYetActive);
    }
    if now > coupon.active_until {
        return Err(CouponError::Expired);
    }
    if coupon.used_quantity >= coupon.total_quantity {
        return Err(CouponError::Exhausted);
    }
    Ok(())
}

/// Per-customer cap, checked only for authenticated customers. `times_used`
/// is how often this customer has already redeemed this coupon (0 when no
/// redemption row exists yet).
pub fn check_customer_limit(coupon: &Coupon, times_used: i32) -> Result<(), CouponError> {
    if times_used >= coupon.per_customer_limit {
        return Err(CouponError::PerCustomerLimitReached);
    }
    Ok(())
}

/// Discount in cents for a given subtotal in cents.
///
/// Percentage discounts round half-up to the cent (15% of 19.99 is 2.9985,
/// which yields 3.00). The result is clamped to the subtotal so an order can
/// never go negative.
pub fn compute_discount(discount_type: &DiscountType, discount_value: i64, subtotal: i64) -> i64 {
    let raw = match discount_type {
        DiscountType::Percentage => (subtotal * discount_value + 50) / 100,
        DiscountType::Fixed => discount_value,
    };
    raw.min(subtotal)
}
