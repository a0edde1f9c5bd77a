use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::coupons::DiscountType;
use crate::models::Coupon;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ValidateCouponRequest {
    pub code: String,
    /// Order subtotal in cents, before discount.
    pub subtotal: i64,
}

/// Successful validation: what the coupon is and what it is worth against
/// the given subtotal.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CouponQuote {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: i64,
    /// Computed discount in cents, already clamped to the subtotal.
    pub discount: i64,
}

/// Wire shape of `POST /coupons/validate`. Rejections are not HTTP errors:
/// the cart simply shows the reason and carries on without the discount.
/// The quote fields sit at the top level of the body, next to `valid`.
#[derive(Debug, Serialize, ToSchema)]
pub struct CouponValidation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    #[serde(flatten)]
    pub quote: Option<CouponQuote>,
}

impl CouponValidation {
    pub fn ok(quote: CouponQuote) -> Self {
        Self {
            valid: true,
            reason: None,
            quote: Some(quote),
        }
    }

    pub fn rejected(reason: &'static str) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
            quote: None,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RedemptionReceipt {
    pub code: String,
    /// Global counter after this redemption.
    pub used_quantity: i32,
    /// This customer's counter after this redemption; absent for guests.
    pub times_used: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCouponRequest {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: i64,
    pub total_quantity: i32,
    pub per_customer_limit: i32,
    pub active_from: DateTime<Utc>,
    pub active_until: DateTime<Utc>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCouponRequest {
    pub discount_type: Option<DiscountType>,
    pub discount_value: Option<i64>,
    pub total_quantity: Option<i32>,
    pub per_customer_limit: Option<i32>,
    pub active_from: Option<DateTime<Utc>>,
    pub active_until: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetCouponActiveRequest {
    pub active: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CouponList {
    pub items: Vec<Coupon>,
}
