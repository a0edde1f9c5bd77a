//! The coupon engine: read-only validation quotes and transactional
//! redemption. Checkout calls [`validate`] while the customer is composing
//! an order; [`redeem`] runs only after payment is confirmed and re-checks
//! everything, because time may have passed and the cap may have been
//! consumed by concurrent orders in between.

use chrono::Utc;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    coupon::{CouponError, check_customer_limit, check_terms, compute_discount, normalize_code},
    db::OrmConn,
    dto::coupons::{CouponQuote, RedemptionReceipt},
    entity::{
        coupon_redemptions::{
            ActiveModel as RedemptionActive, Column as RedemptionCol, Entity as Redemptions,
        },
        coupons::{Column as CouponCol, Entity as Coupons, Model as CouponModel},
    },
    error::{AppError, AppResult},
};

async fn find_by_code<C: ConnectionTrait>(conn: &C, code: &str) -> AppResult<CouponModel> {
    let normalized = normalize_code(code);
    Coupons::find()
        .filter(CouponCol::Code.eq(normalized))
        .one(conn)
        .await?
        .ok_or(AppError::Coupon(CouponError::NotFound))
}

async fn times_used_by<C: ConnectionTrait>(
    conn: &C,
    coupon_id: Uuid,
    customer_id: Uuid,
) -> AppResult<i32> {
    let row = Redemptions::find_by_id((coupon_id, customer_id))
        .one(conn)
        .await?;
    Ok(row.map(|r| r.times_used).unwrap_or(0))
}

/// Checks a code against its terms and the caller's usage, and quotes the
/// discount for the given subtotal (cents). Read-only and idempotent: the
/// cart may call this on every update. A rejection comes back as
/// `AppError::Coupon` with the exact kind.
pub async fn validate<C: ConnectionTrait>(
    conn: &C,
    code: &str,
    customer_id: Option<Uuid>,
    subtotal: i64,
) -> AppResult<CouponQuote> {
    if subtotal < 0 {
        return Err(AppError::BadRequest("subtotal must not be negative".into()));
    }

    let coupon = find_by_code(conn, code).await?;
    check_terms(&coupon, Utc::now()).map_err(AppError::Coupon)?;

    if let Some(customer_id) = customer_id {
        let times_used = times_used_by(conn, coupon.id, customer_id).await?;
        check_customer_limit(&coupon, times_used).map_err(AppError::Coupon)?;
    }

    let discount = compute_discount(&coupon.discount_type, coupon.discount_value, subtotal);
    Ok(CouponQuote {
        code: coupon.code,
        discount_type: coupon.discount_type,
        discount_value: coupon.discount_value,
        discount,
    })
}

/// Commits one redemption. Re-runs the full validation sequence inside a
/// transaction; the global counter moves via a conditional increment
/// (`used_quantity < total_quantity` in the UPDATE itself), so two callers
/// racing for the last slot cannot both succeed — the loser sees zero rows
/// affected and fails with `Exhausted`, with no partial effect.
pub async fn redeem(
    orm: &OrmConn,
    code: &str,
    customer_id: Option<Uuid>,
) -> AppResult<RedemptionReceipt> {
    let txn = orm.begin().await?;

    let normalized = normalize_code(code);
    // The row lock serializes redemptions of one coupon, which also makes
    // the per-customer upsert below race-free.
    let coupon = Coupons::find()
        .filter(CouponCol::Code.eq(normalized))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::Coupon(CouponError::NotFound))?;

    check_terms(&coupon, Utc::now()).map_err(AppError::Coupon)?;

    let redemption = match customer_id {
        Some(customer_id) => {
            let row = Redemptions::find_by_id((coupon.id, customer_id))
                .one(&txn)
                .await?;
            let times_used = row.as_ref().map(|r| r.times_used).unwrap_or(0);
            check_customer_limit(&coupon, times_used).map_err(AppError::Coupon)?;
            Some((customer_id, row))
        }
        None => None,
    };

    let update = Coupons::update_many()
        .col_expr(
            CouponCol::UsedQuantity,
            Expr::col(CouponCol::UsedQuantity).add(1),
        )
        .col_expr(CouponCol::UpdatedAt, Expr::current_timestamp().into())
        .filter(
            Condition::all()
                .add(CouponCol::Id.eq(coupon.id))
                .add(Expr::col(CouponCol::UsedQuantity).lt(Expr::col(CouponCol::TotalQuantity))),
        )
        .exec(&txn)
        .await?;
    if update.rows_affected == 0 {
        // Dropping the transaction rolls everything back.
        return Err(AppError::Coupon(CouponError::Exhausted));
    }

    let times_used = match redemption {
        Some((customer_id, None)) => {
            RedemptionActive {
                coupon_id: Set(coupon.id),
                customer_id: Set(customer_id),
                times_used: Set(1),
                updated_at: Set(Utc::now().into()),
            }
            .insert(&txn)
            .await?;
            Some(1)
        }
        Some((customer_id, Some(row))) => {
            Some(bump_times_used(&txn, coupon.id, customer_id, row.times_used).await?)
        }
        None => None,
    };

    txn.commit().await?;

    Ok(RedemptionReceipt {
        code: coupon.code,
        used_quantity: coupon.used_quantity + 1,
        times_used,
    })
}

async fn bump_times_used<C: ConnectionTrait>(
    conn: &C,
    coupon_id: Uuid,
    customer_id: Uuid,
    prior: i32,
) -> AppResult<i32> {
    Redemptions::update_many()
        .col_expr(
            RedemptionCol::TimesUsed,
            Expr::col(RedemptionCol::TimesUsed).add(1),
        )
        .col_expr(RedemptionCol::UpdatedAt, Expr::current_timestamp().into())
        .filter(
            Condition::all()
                .add(RedemptionCol::CouponId.eq(coupon_id))
                .add(RedemptionCol::CustomerId.eq(customer_id)),
        )
        .exec(conn)
        .await?;
    Ok(prior + 1)
}
