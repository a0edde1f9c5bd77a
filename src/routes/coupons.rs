use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::coupons::{CouponValidation, ValidateCouponRequest},
    error::{AppError, AppResult},
    middleware::auth::MaybeAuthUser,
    response::{ApiResponse, Meta},
    services::coupon_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/validate", post(validate_coupon))
}

/// Guests may validate too; without a bearer token the per-customer check is
/// skipped. A rejected code is still a 200: the cart shows the reason and
/// the order proceeds undiscounted.
#[utoipa::path(
    post,
    path = "/api/coupons/validate",
    request_body = ValidateCouponRequest,
    responses(
        (status = 200, description = "Validation outcome", body = ApiResponse<CouponValidation>),
        (status = 400, description = "Malformed request"),
        (status = 503, description = "Store unavailable"),
    ),
    tag = "Coupons"
)]
pub async fn validate_coupon(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    Json(payload): Json<ValidateCouponRequest>,
) -> AppResult<Json<ApiResponse<CouponValidation>>> {
    let customer_id = user.map(|u| u.user_id);

    let validation = match coupon_service::validate(
        &state.orm,
        &payload.code,
        customer_id,
        payload.subtotal,
    )
    .await
    {
        Ok(quote) => CouponValidation::ok(quote),
        Err(AppError::Coupon(err)) => CouponValidation::rejected(err.reason()),
        Err(err) => return Err(err),
    };

    Ok(Json(ApiResponse::success(
        "Coupon validation",
        validation,
        Some(Meta::empty()),
    )))
}
