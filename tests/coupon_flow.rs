use chrono::{Duration, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use storefront_api::{
    coupon::CouponError,
    db::{create_orm_conn, create_pool, run_migrations},
    dto::orders::{CheckoutItem, CheckoutRequest, PayOrderRequest},
    entity::{
        CouponRedemptions, Coupons,
        coupons::{ActiveModel as CouponActive, DiscountType},
        products::ActiveModel as ProductActive,
        users::ActiveModel as UserActive,
    },
    error::AppError,
    middleware::auth::AuthUser,
    services::{coupon_service, order_service},
    state::AppState,
};
use uuid::Uuid;

// Each test seeds its own users and coupon codes, so they can run in
// parallel against the same database.

#[tokio::test]
async fn two_redeems_race_for_the_last_slot() -> anyhow::Result<()> {
    let Some(state) = try_setup().await? else {
        return Ok(());
    };

    let customer_a = create_user(&state, "customer").await?;
    let customer_b = create_user(&state, "customer").await?;
    let code = unique_code("RACE");
    create_coupon(&state, &code, DiscountType::Percentage, 10, 1, 1).await?;

    let (a, b) = tokio::join!(
        coupon_service::redeem(&state.orm, &code, Some(customer_a)),
        coupon_service::redeem(&state.orm, &code, Some(customer_b)),
    );

    let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(successes, 1, "exactly one redeem may win the last slot");

    let loser = if a.is_err() { a } else { b };
    match loser {
        Err(AppError::Coupon(CouponError::Exhausted)) => {}
        other => panic!("expected Exhausted, got {other:?}"),
    }

    let coupon = find_coupon(&state, &code).await?;
    assert_eq!(coupon.used_quantity, 1);
    assert_eq!(coupon.total_quantity, 1);

    Ok(())
}

#[tokio::test]
async fn per_customer_limit_blocks_the_second_redeem() -> anyhow::Result<()> {
    let Some(state) = try_setup().await? else {
        return Ok(());
    };

    let customer = create_user(&state, "customer").await?;
    let code = unique_code("LIMIT1");
    create_coupon(&state, &code, DiscountType::Fixed, 500, 10, 1).await?;

    let receipt = coupon_service::redeem(&state.orm, &code, Some(customer)).await?;
    assert_eq!(receipt.used_quantity, 1);
    assert_eq!(receipt.times_used, Some(1));

    match coupon_service::redeem(&state.orm, &code, Some(customer)).await {
        Err(AppError::Coupon(CouponError::PerCustomerLimitReached)) => {}
        other => panic!("expected PerCustomerLimitReached, got {other:?}"),
    }

    // The failed attempt must not have moved either counter.
    let coupon = find_coupon(&state, &code).await?;
    assert_eq!(coupon.used_quantity, 1);
    let redemption = CouponRedemptions::find_by_id((coupon.id, customer))
        .one(&state.orm)
        .await?
        .expect("redemption row");
    assert_eq!(redemption.times_used, 1);

    Ok(())
}

#[tokio::test]
async fn expired_coupon_is_rejected_despite_remaining_quantity() -> anyhow::Result<()> {
    let Some(state) = try_setup().await? else {
        return Ok(());
    };

    let code = unique_code("EXPIRED5");
    let now = Utc::now();
    CouponActive {
        id: Set(Uuid::new_v4()),
        code: Set(code.clone()),
        discount_type: Set(DiscountType::Percentage),
        discount_value: Set(5),
        total_quantity: Set(1000),
        used_quantity: Set(0),
        per_customer_limit: Set(1),
        active_from: Set((now - Duration::days(30)).into()),
        active_until: Set((now - Duration::days(1)).into()),
        active: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    match coupon_service::validate(&state.orm, &code, None, 10_000).await {
        Err(AppError::Coupon(CouponError::Expired)) => {}
        other => panic!("expected Expired, got {other:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn guest_validation_skips_the_per_customer_check() -> anyhow::Result<()> {
    let Some(state) = try_setup().await? else {
        return Ok(());
    };

    let customer = create_user(&state, "customer").await?;
    let code = unique_code("GUEST");
    create_coupon(&state, &code, DiscountType::Percentage, 10, 100, 1).await?;

    coupon_service::redeem(&state.orm, &code, Some(customer)).await?;

    match coupon_service::validate(&state.orm, &code, Some(customer), 1000).await {
        Err(AppError::Coupon(CouponError::PerCustomerLimitReached)) => {}
        other => panic!("expected PerCustomerLimitReached, got {other:?}"),
    }

    // Same coupon, guest caller: only the coupon's own terms apply.
    let quote = coupon_service::validate(&state.orm, &code, None, 1000).await?;
    assert_eq!(quote.discount, 100);

    Ok(())
}

#[tokio::test]
async fn validate_is_idempotent_and_read_only() -> anyhow::Result<()> {
    let Some(state) = try_setup().await? else {
        return Ok(());
    };

    let customer = create_user(&state, "customer").await?;
    let code = unique_code("IDEM");
    create_coupon(&state, &code, DiscountType::Percentage, 15, 50, 3).await?;

    for _ in 0..3 {
        let quote = coupon_service::validate(&state.orm, &code, Some(customer), 1999).await?;
        assert_eq!(quote.code, code);
        assert_eq!(quote.discount, 300);
    }

    let coupon = find_coupon(&state, &code).await?;
    assert_eq!(coupon.used_quantity, 0, "validate must not record usage");

    Ok(())
}

#[tokio::test]
async fn checkout_and_bizum_pay_redeem_exactly_once() -> anyhow::Result<()> {
    let Some(state) = try_setup().await? else {
        return Ok(());
    };

    let customer_id = create_user(&state, "customer").await?;
    let auth = AuthUser {
        user_id: customer_id,
        role: "customer".into(),
    };

    let code = unique_code("SAVE15");
    create_coupon(&state, &code, DiscountType::Percentage, 15, 100, 1).await?;

    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(format!("Test Widget {}", Uuid::new_v4())),
        description: Set(Some("A product for testing".into())),
        brand_id: Set(None),
        category_id: Set(None),
        price: Set(1999),
        stock: Set(10),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let checkout_resp = order_service::checkout(
        &state,
        &auth,
        CheckoutRequest {
            items: vec![CheckoutItem {
                product_id: product.id,
                quantity: 1,
            }],
            coupon_code: Some(format!(" {} ", code.to_lowercase())),
            shipping_address: "Calle Mayor 1, Madrid".into(),
            payment_method: "bizum".into(),
        },
    )
    .await?;
    let order = checkout_resp.data.expect("checkout data").order;
    assert_eq!(order.subtotal, 1999);
    assert_eq!(order.discount, 300);
    assert_eq!(order.total, 1699);
    assert_eq!(order.coupon_code.as_deref(), Some(code.as_str()));

    // Checkout only quotes; nothing is redeemed until payment.
    let coupon = find_coupon(&state, &code).await?;
    assert_eq!(coupon.used_quantity, 0);

    let pay_resp = order_service::pay_order(
        &state,
        &auth,
        order.id,
        PayOrderRequest {
            bizum_phone: Some("+34600111222".into()),
        },
    )
    .await?;
    let paid = pay_resp.data.expect("pay data").order;
    assert_eq!(paid.payment_status, "paid");

    let coupon = find_coupon(&state, &code).await?;
    assert_eq!(coupon.used_quantity, 1);
    let redemption = CouponRedemptions::find_by_id((coupon.id, customer_id))
        .one(&state.orm)
        .await?
        .expect("redemption row");
    assert_eq!(redemption.times_used, 1);

    // Paying twice is rejected and must not redeem again.
    match order_service::pay_order(
        &state,
        &auth,
        order.id,
        PayOrderRequest {
            bizum_phone: Some("+34600111222".into()),
        },
    )
    .await
    {
        Err(AppError::BadRequest(_)) => {}
        other => panic!("expected BadRequest for double pay, got {other:?}"),
    }
    let coupon = find_coupon(&state, &code).await?;
    assert_eq!(coupon.used_quantity, 1);

    Ok(())
}

async fn try_setup() -> anyhow::Result<Option<AppState>> {
    let database_url =
        match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            Ok(url) => url,
            Err(_) => {
                eprintln!(
                    "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
                );
                return Ok(None);
            }
        };

    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;
    let pool = create_pool(&database_url).await?;

    Ok(Some(AppState { pool, orm }))
}

async fn create_user(state: &AppState, role: &str) -> anyhow::Result<Uuid> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(format!("{}@example.com", Uuid::new_v4())),
        password_hash: Set("dummy".into()),
        role: Set(role.into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(user.id)
}

fn unique_code(prefix: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("{}{}", prefix, &suffix[..8])
}

async fn create_coupon(
    state: &AppState,
    code: &str,
    discount_type: DiscountType,
    discount_value: i64,
    total_quantity: i32,
    per_customer_limit: i32,
) -> anyhow::Result<()> {
    let now = Utc::now();
    CouponActive {
        id: Set(Uuid::new_v4()),
        code: Set(code.to_string()),
        discount_type: Set(discount_type),
        discount_value: Set(discount_value),
        total_quantity: Set(total_quantity),
        used_quantity: Set(0),
        per_customer_limit: Set(per_customer_limit),
        active_from: Set((now - Duration::days(1)).into()),
        active_until: Set((now + Duration::days(30)).into()),
        active: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(())
}

async fn find_coupon(
    state: &AppState,
    code: &str,
) -> anyhow::Result<storefront_api::entity::coupons::Model> {
    use sea_orm::{ColumnTrait, QueryFilter};

    let coupon = Coupons::find()
        .filter(storefront_api::entity::coupons::Column::Code.eq(code))
        .one(&state.orm)
        .await?
        .expect("coupon row");
    Ok(coupon)
}
