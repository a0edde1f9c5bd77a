use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, SqlErr,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    coupon::normalize_code,
    dto::catalog::{
        CreateBrandRequest, CreateCategoryRequest, UpdateBrandRequest, UpdateCategoryRequest,
    },
    dto::coupons::{CouponList, CreateCouponRequest, SetCouponActiveRequest, UpdateCouponRequest},
    dto::orders::{OrderList, OrderWithItems},
    dto::products::{CreateProductRequest, ProductList, UpdateProductRequest},
    entity::{
        brands::{ActiveModel as BrandActive, Entity as Brands, Model as BrandModel},
        categories::{ActiveModel as CategoryActive, Entity as Categories, Model as CategoryModel},
        coupons::{ActiveModel as CouponActive, Column as CouponCol, Entity as Coupons, Model as CouponModel},
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products, Model as ProductModel},
        users::{Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Brand, Category, Coupon, Order, Product},
    response::{ApiResponse, Meta},
    routes::admin::{StatsData, UpdateOrderStatusRequest},
    routes::params::{OrderListQuery, Pagination, SortOrder},
    services::order_service::{order_from_entity, order_item_from_entity},
    state::AppState,
};

// --- products ---

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    if payload.price < 0 {
        return Err(AppError::BadRequest("price must not be negative".into()));
    }
    if payload.stock < 0 {
        return Err(AppError::BadRequest("stock must not be negative".into()));
    }

    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        description: Set(payload.description),
        brand_id: Set(payload.brand_id),
        category_id: Set(payload.category_id),
        price: Set(payload.price),
        stock: Set(payload.stock),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit(state, user, "product_create", "products", product.id).await;

    Ok(ApiResponse::success(
        "Product created",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: ProductActive = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(brand_id) = payload.brand_id {
        active.brand_id = Set(Some(brand_id));
    }
    if let Some(category_id) = payload.category_id {
        active.category_id = Set(Some(category_id));
    }
    if let Some(price) = payload.price {
        if price < 0 {
            return Err(AppError::BadRequest("price must not be negative".into()));
        }
        active.price = Set(price);
    }
    if let Some(stock) = payload.stock {
        if stock < 0 {
            return Err(AppError::BadRequest("stock must not be negative".into()));
        }
        active.stock = Set(stock);
    }
    let product = active.update(&state.orm).await?;

    audit(state, user, "product_update", "products", product.id).await;

    Ok(ApiResponse::success(
        "Product updated",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Products::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit(state, user, "product_delete", "products", id).await;

    Ok(ApiResponse::success(
        "Product deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn list_low_stock(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
    threshold: Option<i32>,
) -> AppResult<ApiResponse<ProductList>> {
    ensure_admin(user)?;
    let threshold = threshold.unwrap_or(5);
    let (page, limit, offset) = pagination.normalize();

    let finder = Products::find()
        .filter(ProdCol::Stock.lte(threshold))
        .order_by_asc(ProdCol::Stock)
        .order_by_desc(ProdCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Low stock",
        ProductList { items },
        Some(meta),
    ))
}

// --- brands & categories ---

pub async fn create_brand(
    state: &AppState,
    user: &AuthUser,
    payload: CreateBrandRequest,
) -> AppResult<ApiResponse<Brand>> {
    ensure_admin(user)?;
    let brand = BrandActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit(state, user, "brand_create", "brands", brand.id).await;

    Ok(ApiResponse::success(
        "Brand created",
        brand_from_entity(brand),
        Some(Meta::empty()),
    ))
}

pub async fn update_brand(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateBrandRequest,
) -> AppResult<ApiResponse<Brand>> {
    ensure_admin(user)?;
    let existing = Brands::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: BrandActive = existing.into();
    active.name = Set(payload.name);
    let brand = active.update(&state.orm).await?;

    audit(state, user, "brand_update", "brands", brand.id).await;

    Ok(ApiResponse::success(
        "Brand updated",
        brand_from_entity(brand),
        Some(Meta::empty()),
    ))
}

pub async fn delete_brand(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Brands::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit(state, user, "brand_delete", "brands", id).await;

    Ok(ApiResponse::success(
        "Brand deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn create_category(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_admin(user)?;
    let category = CategoryActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit(state, user, "category_create", "categories", category.id).await;

    Ok(ApiResponse::success(
        "Category created",
        category_from_entity(category),
        Some(Meta::empty()),
    ))
}

pub async fn update_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_admin(user)?;
    let existing = Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: CategoryActive = existing.into();
    active.name = Set(payload.name);
    let category = active.update(&state.orm).await?;

    audit(state, user, "category_update", "categories", category.id).await;

    Ok(ApiResponse::success(
        "Category updated",
        category_from_entity(category),
        Some(Meta::empty()),
    ))
}

pub async fn delete_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Categories::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit(state, user, "category_delete", "categories", id).await;

    Ok(ApiResponse::success(
        "Category deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

// --- coupons ---

pub async fn create_coupon(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCouponRequest,
) -> AppResult<ApiResponse<Coupon>> {
    ensure_admin(user)?;
    let code = normalize_code(&payload.code);
    if code.is_empty() {
        return Err(AppError::BadRequest("code must not be empty".into()));
    }
    if payload.discount_value < 0 {
        return Err(AppError::BadRequest(
            "discount_value must not be negative".into(),
        ));
    }
    if payload.total_quantity < 0 || payload.per_customer_limit < 0 {
        return Err(AppError::BadRequest("caps must not be negative".into()));
    }
    if payload.active_until < payload.active_from {
        return Err(AppError::BadRequest(
            "active_until must not precede active_from".into(),
        ));
    }

    let exists = Coupons::find()
        .filter(CouponCol::Code.eq(code.clone()))
        .one(&state.orm)
        .await?;
    if exists.is_some() {
        return Err(AppError::BadRequest("Coupon code already exists".into()));
    }

    let inserted = CouponActive {
        id: Set(Uuid::new_v4()),
        code: Set(code),
        discount_type: Set(payload.discount_type),
        discount_value: Set(payload.discount_value),
        total_quantity: Set(payload.total_quantity),
        used_quantity: Set(0),
        per_customer_limit: Set(payload.per_customer_limit),
        active_from: Set(payload.active_from.into()),
        active_until: Set(payload.active_until.into()),
        active: Set(payload.active.unwrap_or(true)),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await;

    // The pre-check above races with concurrent creates; the unique index on
    // code is the arbiter, and losing to it is still a client error.
    let coupon = match inserted {
        Ok(coupon) => coupon,
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            return Err(AppError::BadRequest("Coupon code already exists".into()));
        }
        Err(err) => return Err(err.into()),
    };

    audit(state, user, "coupon_create", "coupons", coupon.id).await;

    Ok(ApiResponse::success(
        "Coupon created",
        coupon_from_entity(coupon),
        Some(Meta::empty()),
    ))
}

pub async fn list_coupons(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<CouponList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();

    let finder = Coupons::find().order_by_desc(CouponCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(coupon_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Coupons",
        CouponList { items },
        Some(meta),
    ))
}

/// Edits a coupon's terms. `used_quantity` is deliberately not editable:
/// the redemption counter only moves through the redeem path.
pub async fn update_coupon(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCouponRequest,
) -> AppResult<ApiResponse<Coupon>> {
    ensure_admin(user)?;
    let existing = Coupons::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    // Partial edits are checked against the row they land on, not just the
    // payload: shrinking the cap below what is already redeemed, or moving
    // one window bound past the other, must fail as a client error.
    let used_quantity = existing.used_quantity;
    let mut active_from = existing.active_from;
    let mut active_until = existing.active_until;

    let mut active: CouponActive = existing.into();
    if let Some(discount_type) = payload.discount_type {
        active.discount_type = Set(discount_type);
    }
    if let Some(discount_value) = payload.discount_value {
        if discount_value < 0 {
            return Err(AppError::BadRequest(
                "discount_value must not be negative".into(),
            ));
        }
        active.discount_value = Set(discount_value);
    }
    if let Some(total_quantity) = payload.total_quantity {
        if total_quantity < 0 {
            return Err(AppError::BadRequest("caps must not be negative".into()));
        }
        if total_quantity < used_quantity {
            return Err(AppError::BadRequest(
                "total_quantity must not drop below used_quantity".into(),
            ));
        }
        active.total_quantity = Set(total_quantity);
    }
    if let Some(per_customer_limit) = payload.per_customer_limit {
        if per_customer_limit < 0 {
            return Err(AppError::BadRequest("caps must not be negative".into()));
        }
        active.per_customer_limit = Set(per_customer_limit);
    }
    if let Some(from) = payload.active_from {
        active_from = from.into();
        active.active_from = Set(active_from);
    }
    if let Some(until) = payload.active_until {
        active_until = until.into();
        active.active_until = Set(active_until);
    }
    if active_until < active_from {
        return Err(AppError::BadRequest(
            "active_until must not precede active_from".into(),
        ));
    }
    active.updated_at = Set(Utc::now().into());
    let coupon = active.update(&state.orm).await?;

    audit(state, user, "coupon_update", "coupons", coupon.id).await;

    Ok(ApiResponse::success(
        "Coupon updated",
        coupon_from_entity(coupon),
        Some(Meta::empty()),
    ))
}

/// The kill-switch: flips `active` without touching the window or caps.
pub async fn set_coupon_active(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: SetCouponActiveRequest,
) -> AppResult<ApiResponse<Coupon>> {
    ensure_admin(user)?;
    let existing = Coupons::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: CouponActive = existing.into();
    active.active = Set(payload.active);
    active.updated_at = Set(Utc::now().into());
    let coupon = active.update(&state.orm).await?;

    audit(state, user, "coupon_set_active", "coupons", coupon.id).await;

    Ok(ApiResponse::success(
        "Coupon updated",
        coupon_from_entity(coupon),
        Some(Meta::empty()),
    ))
}

// --- orders ---

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let mut finder = Orders::find().filter(condition);

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Orders",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_admin(user)?;
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(order_from_entity)
        .ok_or(AppError::NotFound)?;

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();

    let data = OrderWithItems { order, items };
    Ok(ApiResponse::success("Order found", data, Some(Meta::empty())))
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    validate_order_status(&payload.status)?;

    let existing = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: OrderActive = existing.into();
    active.status = Set(payload.status);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    audit(state, user, "order_status_update", "orders", order.id).await;

    Ok(ApiResponse::success(
        "Order updated",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

// --- dashboard ---

pub async fn stats(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<StatsData>> {
    ensure_admin(user)?;

    let products = Products::find().count(&state.orm).await? as i64;
    let customers = Users::find()
        .filter(UserCol::Role.eq("customer"))
        .count(&state.orm)
        .await? as i64;
    let orders = Orders::find().count(&state.orm).await? as i64;

    let paid_revenue: (i64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(total), 0)::BIGINT FROM orders WHERE payment_status = 'paid'",
    )
    .fetch_one(&state.pool)
    .await?;

    let coupon_redemptions: (i64,) =
        sqlx::query_as("SELECT COALESCE(SUM(used_quantity), 0)::BIGINT FROM coupons")
            .fetch_one(&state.pool)
            .await?;

    let data = StatsData {
        products,
        customers,
        orders,
        paid_revenue: paid_revenue.0,
        coupon_redemptions: coupon_redemptions.0,
    };
    Ok(ApiResponse::success("Stats", data, Some(Meta::empty())))
}

fn validate_order_status(status: &str) -> Result<(), AppError> {
    const VALID: [&str; 5] = ["pending", "paid", "shipped", "completed", "cancelled"];
    if VALID.contains(&status) {
        Ok(())
    } else {
        Err(AppError::BadRequest("Invalid order status".into()))
    }
}

async fn audit(state: &AppState, user: &AuthUser, action: &str, resource: &str, id: Uuid) {
    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        action,
        Some(resource),
        Some(serde_json::json!({ "id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }
}

fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        name: model.name,
        description: model.description,
        brand_id: model.brand_id,
        category_id: model.category_id,
        price: model.price,
        stock: model.stock,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn brand_from_entity(model: BrandModel) -> Brand {
    Brand {
        id: model.id,
        name: model.name,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn category_from_entity(model: CategoryModel) -> Category {
    Category {
        id: model.id,
        name: model.name,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub fn coupon_from_entity(model: CouponModel) -> Coupon {
    Coupon {
        id: model.id,
        code: model.code,
        discount_type: model.discount_type,
        discount_value: model.discount_value,
        total_quantity: model.total_quantity,
        used_quantity: model.used_quantity,
        per_customer_limit: model.per_customer_limit,
        active_from: model.active_from.with_timezone(&Utc),
        active_until: model.active_until.with_timezone(&Utc),
        active: model.active,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
