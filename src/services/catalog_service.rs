use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::catalog::{BrandList, CategoryList},
    dto::products::ProductList,
    error::{AppError, AppResult},
    models::{Brand, Category, Product},
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
};

pub async fn list_products(
    pool: &DbPool,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    // Sort columns come from a closed enum, never from the raw query string.
    let sql = format!(
        r#"
        SELECT * FROM products
        WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%')
          AND ($2::uuid IS NULL OR brand_id = $2)
          AND ($3::uuid IS NULL OR category_id = $3)
          AND ($4::bigint IS NULL OR price >= $4)
          AND ($5::bigint IS NULL OR price <= $5)
        ORDER BY {} {}
        LIMIT $6 OFFSET $7
        "#,
        sort_by.as_sql(),
        sort_order.as_sql()
    );

    let items = sqlx::query_as::<_, Product>(&sql)
        .bind(query.q.as_deref())
        .bind(query.brand_id)
        .bind(query.category_id)
        .bind(query.min_price)
        .bind(query.max_price)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    let total: (i64,) = sqlx::query_as(
        r#"
        SELECT count(*) FROM products
        WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%')
          AND ($2::uuid IS NULL OR brand_id = $2)
          AND ($3::uuid IS NULL OR category_id = $3)
          AND ($4::bigint IS NULL OR price >= $4)
          AND ($5::bigint IS NULL OR price <= $5)
        "#,
    )
    .bind(query.q.as_deref())
    .bind(query.brand_id)
    .bind(query.category_id)
    .bind(query.min_price)
    .bind(query.max_price)
    .fetch_one(pool)
    .await?;

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(meta),
    ))
}

pub async fn get_product(pool: &DbPool, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("Product", product, None))
}

pub async fn list_brands(pool: &DbPool) -> AppResult<ApiResponse<BrandList>> {
    let items = sqlx::query_as::<_, Brand>("SELECT * FROM brands ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(ApiResponse::success(
        "Brands",
        BrandList { items },
        Some(Meta::empty()),
    ))
}

pub async fn list_categories(pool: &DbPool) -> AppResult<ApiResponse<CategoryList>> {
    let items = sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(ApiResponse::success(
        "Categories",
        CategoryList { items },
        Some(Meta::empty()),
    ))
}
