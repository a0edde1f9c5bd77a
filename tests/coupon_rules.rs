use chrono::{Duration, Utc};
use storefront_api::coupon::{
    CouponError, check_customer_limit, check_terms, compute_discount, normalize_code,
};
use storefront_api::dto::coupons::{CouponQuote, CouponValidation};
use storefront_api::entity::coupons::{DiscountType, Model as Coupon};
use uuid::Uuid;

fn coupon(discount_type: DiscountType, discount_value: i64) -> Coupon {
    let now = Utc::now();
    Coupon {
        id: Uuid::new_v4(),
        code: "SAVE10".into(),
        discount_type,
        discount_value,
        total_quantity: 100,
        used_quantity: 0,
        per_customer_limit: 1,
        active_from: (now - Duration::days(1)).into(),
        active_until: (now + Duration::days(1)).into(),
        active: true,
        created_at: now.into(),
        updated_at: now.into(),
    }
}

#[test]
fn codes_normalize_to_trimmed_uppercase() {
    assert_eq!(normalize_code(" save10 "), "SAVE10");
    assert_eq!(normalize_code("Welcome5"), "WELCOME5");
    assert_eq!(normalize_code("SAVE10"), "SAVE10");
}

#[test]
fn kill_switch_beats_everything_else() {
    let now = Utc::now();
    let mut c = coupon(DiscountType::Percentage, 10);
    c.active = false;
    // Also expired and exhausted, but the kill-switch is checked first.
    c.active_until = (now - Duration::days(2)).into();
    c.used_quantity = c.total_quantity;
    assert_eq!(check_terms(&c, now), Err(CouponError::Deactivated));
}

#[test]
fn window_is_checked_in_order() {
    let now = Utc::now();
    let mut c = coupon(DiscountType::Percentage, 10);

    c.active_from = (now + Duration::hours(1)).into();
    assert_eq!(check_terms(&c, now), Err(CouponError::NotYetActive));

    c.active_from = (now - Duration::days(2)).into();
    c.active_until = (now - Duration::days(1)).into();
    assert_eq!(check_terms(&c, now), Err(CouponError::Expired));
}

#[test]
fn expired_wins_even_with_quantity_left() {
    let now = Utc::now();
    let mut c = coupon(DiscountType::Percentage, 5);
    c.total_quantity = 1000;
    c.used_quantity = 0;
    c.active_until = (now - Duration::seconds(1)).into();
    assert_eq!(check_terms(&c, now), Err(CouponError::Expired));
}

#[test]
fn window_boundaries_are_inclusive() {
    let now = Utc::now();
    let mut c = coupon(DiscountType::Fixed, 100);
    c.active_from = now.into();
    c.active_until = now.into();
    assert_eq!(check_terms(&c, now), Ok(()));
}

#[test]
fn global_cap_rejects_when_consumed() {
    let now = Utc::now();
    let mut c = coupon(DiscountType::Percentage, 10);
    c.total_quantity = 3;
    c.used_quantity = 3;
    assert_eq!(check_terms(&c, now), Err(CouponError::Exhausted));

    c.used_quantity = 2;
    assert_eq!(check_terms(&c, now), Ok(()));
}

#[test]
fn per_customer_limit_counts_prior_uses() {
    let mut c = coupon(DiscountType::Percentage, 10);
    c.per_customer_limit = 2;
    assert_eq!(check_customer_limit(&c, 0), Ok(()));
    assert_eq!(check_customer_limit(&c, 1), Ok(()));
    assert_eq!(
        check_customer_limit(&c, 2),
        Err(CouponError::PerCustomerLimitReached)
    );
}

#[test]
fn fixed_discount_clamps_to_subtotal() {
    // 50.00 off a 30.00 order is worth exactly 30.00.
    assert_eq!(compute_discount(&DiscountType::Fixed, 5000, 3000), 3000);
    assert_eq!(compute_discount(&DiscountType::Fixed, 500, 3000), 500);
}

#[test]
fn percentage_rounds_half_up_to_the_cent() {
    // 15% of 19.99 is 2.9985 -> 3.00.
    assert_eq!(compute_discount(&DiscountType::Percentage, 15, 1999), 300);
    // 10% of 100.00 is exactly 10.00.
    assert_eq!(compute_discount(&DiscountType::Percentage, 10, 10000), 1000);
    // 5% of 0.10 is 0.005 -> 0.01.
    assert_eq!(compute_discount(&DiscountType::Percentage, 5, 10), 1);
}

#[test]
fn percentage_never_exceeds_subtotal() {
    assert_eq!(compute_discount(&DiscountType::Percentage, 100, 1999), 1999);
    // Values over 100 are not enforced at the data level; the clamp holds.
    assert_eq!(compute_discount(&DiscountType::Percentage, 150, 1000), 1000);
}

#[test]
fn validation_body_carries_the_quote_at_top_level() {
    let body = serde_json::to_value(CouponValidation::ok(CouponQuote {
        code: "SAVE15".into(),
        discount_type: DiscountType::Percentage,
        discount_value: 15,
        discount: 300,
    }))
    .expect("json");

    assert_eq!(body["valid"], true);
    assert_eq!(body["code"], "SAVE15");
    assert_eq!(body["discount_type"], "percentage");
    assert_eq!(body["discount_value"], 15);
    assert_eq!(body["discount"], 300);
    assert!(body.get("quote").is_none(), "quote must not be nested");
    assert!(body.get("reason").is_none());
}

#[test]
fn rejected_validation_carries_only_the_reason() {
    let body = serde_json::to_value(CouponValidation::rejected(CouponError::Expired.reason()))
        .expect("json");

    assert_eq!(body["valid"], false);
    assert_eq!(body["reason"], "expired");
    assert!(body.get("discount").is_none());
    assert!(body.get("code").is_none());
}

#[test]
fn zero_subtotal_yields_zero_discount() {
    assert_eq!(compute_discount(&DiscountType::Percentage, 15, 0), 0);
    assert_eq!(compute_discount(&DiscountType::Fixed, 500, 0), 0);
}
