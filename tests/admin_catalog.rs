use chrono::{Duration, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set};
use storefront_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::catalog::{CreateBrandRequest, CreateCategoryRequest, UpdateBrandRequest, UpdateCategoryRequest},
    dto::coupons::{CreateCouponRequest, UpdateCouponRequest},
    entity::coupons::{ActiveModel as CouponActive, DiscountType},
    error::AppError,
    middleware::auth::AuthUser,
    services::admin_service,
    state::AppState,
};
use uuid::Uuid;

#[tokio::test]
async fn brand_and_category_renames_persist() -> anyhow::Result<()> {
    let Some(state) = try_setup().await? else {
        return Ok(());
    };
    let admin = admin_user();

    let brand = admin_service::create_brand(
        &state,
        &admin,
        CreateBrandRequest {
            name: format!("Brand {}", Uuid::new_v4()),
        },
    )
    .await?
    .data
    .expect("brand");
    let renamed_to = format!("Brand {}", Uuid::new_v4());
    let renamed = admin_service::update_brand(
        &state,
        &admin,
        brand.id,
        UpdateBrandRequest {
            name: renamed_to.clone(),
        },
    )
    .await?
    .data
    .expect("brand");
    assert_eq!(renamed.id, brand.id);
    assert_eq!(renamed.name, renamed_to);

    let category = admin_service::create_category(
        &state,
        &admin,
        CreateCategoryRequest {
            name: format!("Category {}", Uuid::new_v4()),
        },
    )
    .await?
    .data
    .expect("category");
    let renamed_to = format!("Category {}", Uuid::new_v4());
    let renamed = admin_service::update_category(
        &state,
        &admin,
        category.id,
        UpdateCategoryRequest {
            name: renamed_to.clone(),
        },
    )
    .await?
    .data
    .expect("category");
    assert_eq!(renamed.name, renamed_to);

    Ok(())
}

#[tokio::test]
async fn updating_a_missing_brand_is_not_found() -> anyhow::Result<()> {
    let Some(state) = try_setup().await? else {
        return Ok(());
    };
    let admin = admin_user();

    match admin_service::update_brand(
        &state,
        &admin,
        Uuid::new_v4(),
        UpdateBrandRequest {
            name: "Ghost".into(),
        },
    )
    .await
    {
        Err(AppError::NotFound) => {}
        other => panic!("expected NotFound, got {other:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn duplicate_coupon_codes_race_to_a_client_error() -> anyhow::Result<()> {
    let Some(state) = try_setup().await? else {
        return Ok(());
    };
    let admin = admin_user();

    let code = unique_code("DUP");
    let (a, b) = tokio::join!(
        admin_service::create_coupon(&state, &admin, coupon_request(&code)),
        admin_service::create_coupon(&state, &admin, coupon_request(&code)),
    );

    let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(successes, 1, "exactly one create may claim the code");

    // The loser gets a client error, never a store failure.
    let loser = if a.is_err() { a } else { b };
    match loser {
        Err(AppError::BadRequest(_)) => {}
        other => panic!("expected BadRequest, got {other:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn coupon_cap_cannot_drop_below_redeemed_count() -> anyhow::Result<()> {
    let Some(state) = try_setup().await? else {
        return Ok(());
    };
    let admin = admin_user();

    let now = Utc::now();
    let coupon = CouponActive {
        id: Set(Uuid::new_v4()),
        code: Set(unique_code("CAP")),
        discount_type: Set(DiscountType::Percentage),
        discount_value: Set(10),
        total_quantity: Set(10),
        used_quantity: Set(2),
        per_customer_limit: Set(1),
        active_from: Set((now - Duration::days(1)).into()),
        active_until: Set((now + Duration::days(30)).into()),
        active: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    match admin_service::update_coupon(
        &state,
        &admin,
        coupon.id,
        UpdateCouponRequest {
            total_quantity: Some(1),
            ..empty_update()
        },
    )
    .await
    {
        Err(AppError::BadRequest(_)) => {}
        other => panic!("expected BadRequest, got {other:?}"),
    }

    // Shrinking down to the redeemed count itself is still allowed.
    let updated = admin_service::update_coupon(
        &state,
        &admin,
        coupon.id,
        UpdateCouponRequest {
            total_quantity: Some(2),
            ..empty_update()
        },
    )
    .await?
    .data
    .expect("coupon");
    assert_eq!(updated.total_quantity, 2);
    assert_eq!(updated.used_quantity, 2);

    Ok(())
}

#[tokio::test]
async fn window_edit_cannot_invert_the_window() -> anyhow::Result<()> {
    let Some(state) = try_setup().await? else {
        return Ok(());
    };
    let admin = admin_user();

    let now = Utc::now();
    let coupon = admin_service::create_coupon(&state, &admin, coupon_request(&unique_code("WIN")))
        .await?
        .data
        .expect("coupon");

    // Editing only the upper bound must still respect the stored lower bound.
    match admin_service::update_coupon(
        &state,
        &admin,
        coupon.id,
        UpdateCouponRequest {
            active_until: Some(now - Duration::days(2)),
            ..empty_update()
        },
    )
    .await
    {
        Err(AppError::BadRequest(_)) => {}
        other => panic!("expected BadRequest, got {other:?}"),
    }

    // Moving both bounds together is fine.
    let updated = admin_service::update_coupon(
        &state,
        &admin,
        coupon.id,
        UpdateCouponRequest {
            active_from: Some(now + Duration::days(10)),
            active_until: Some(now + Duration::days(20)),
            ..empty_update()
        },
    )
    .await?;
    assert!(updated.data.is_some());

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

fn admin_user() -> AuthUser {
    AuthUser {
        user_id: Uuid::new_v4(),
        role: "admin".into(),
    }
}

fn unique_code(prefix: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("{}{}", prefix, &suffix[..8])
}

fn coupon_request(code: &str) -> CreateCouponRequest {
    let now = Utc::now();
    CreateCouponRequest {
        code: code.to_string(),
        discount_type: DiscountType::Percentage,
        discount_value: 10,
        total_quantity: 100,
        per_customer_limit: 1,
        active_from: now - Duration::days(1),
        active_until: now + Duration::days(30),
        active: Some(true),
    }
}

fn empty_update() -> UpdateCouponRequest {
    UpdateCouponRequest {
        discount_type: None,
        discount_value: None,
        total_quantity: None,
        per_customer_limit: None,
        active_from: None,
        active_until: None,
    }
}
