use axum::extract::Query;
use axum::http::Uri;
use storefront_api::routes::admin::LowStockQuery;
use storefront_api::routes::params::{OrderListQuery, ProductQuery};

fn uri(s: &str) -> Uri {
    s.parse().expect("uri")
}

#[test]
fn order_list_query_parses_explicit_paging() {
    let Query(query) =
        Query::<OrderListQuery>::try_from_uri(&uri("/api/orders?page=2&per_page=5&status=paid"))
            .expect("query should parse");
    let (page, per_page, offset) = query.pagination().normalize();
    assert_eq!((page, per_page, offset), (2, 5, 5));
    assert_eq!(query.status.as_deref(), Some("paid"));
}

#[test]
fn product_query_parses_paging_alongside_filters() {
    let Query(query) = Query::<ProductQuery>::try_from_uri(&uri(
        "/api/catalog/products?page=3&per_page=10&min_price=100&sort_by=price&sort_order=asc",
    ))
    .expect("query should parse");
    let (page, per_page, offset) = query.pagination().normalize();
    assert_eq!((page, per_page, offset), (3, 10, 20));
    assert_eq!(query.min_price, Some(100));
}

#[test]
fn low_stock_query_parses_paging_and_threshold() {
    let Query(query) = Query::<LowStockQuery>::try_from_uri(&uri(
        "/api/admin/inventory/low-stock?page=2&per_page=20&threshold=3",
    ))
    .expect("query should parse");
    let (page, per_page, offset) = query.pagination().normalize();
    assert_eq!((page, per_page, offset), (2, 20, 20));
    assert_eq!(query.threshold, Some(3));
}

#[test]
fn missing_paging_falls_back_to_defaults() {
    let Query(query) =
        Query::<OrderListQuery>::try_from_uri(&uri("/api/orders")).expect("query should parse");
    let (page, per_page, offset) = query.pagination().normalize();
    assert_eq!((page, per_page, offset), (1, 20, 0));
}
