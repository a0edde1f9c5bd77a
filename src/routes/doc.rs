use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        catalog::{BrandList, CategoryList, UpdateBrandRequest, UpdateCategoryRequest},
        coupons::{
            CouponList, CouponQuote, CouponValidation, CreateCouponRequest, RedemptionReceipt,
            SetCouponActiveRequest, UpdateCouponRequest, ValidateCouponRequest,
        },
        orders::{CheckoutItem, CheckoutRequest, OrderList, OrderWithItems, PayOrderRequest},
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
    },
    entity::coupons::DiscountType,
    models::{Brand, Category, Coupon, Order, OrderItem, Product, User},
    response::{ApiResponse, Meta},
    routes::{admin, auth, catalog, coupons, health, orders, params},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::register,
        catalog::list_products,
        catalog::get_product,
        catalog::list_brands,
        catalog::list_categories,
        coupons::validate_coupon,
        orders::list_orders,
        orders::checkout,
        orders::pay_order,
        orders::get_order,
        admin::create_product,
        admin::update_product,
        admin::delete_product,
        admin::create_brand,
        admin::update_brand,
        admin::delete_brand,
        admin::create_category,
        admin::update_category,
        admin::delete_category,
        admin::create_coupon,
        admin::list_coupons,
        admin::update_coupon,
        admin::set_coupon_active,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::list_low_stock,
        admin::stats
    ),
    components(
        schemas(
            User,
            Brand,
            Category,
            Product,
            Coupon,
            DiscountType,
            Order,
            OrderItem,
            BrandList,
            CategoryList,
            UpdateBrandRequest,
            UpdateCategoryRequest,
            ProductList,
            CouponList,
            CouponQuote,
            CouponValidation,
            ValidateCouponRequest,
            CreateCouponRequest,
            UpdateCouponRequest,
            SetCouponActiveRequest,
            RedemptionReceipt,
            CreateProductRequest,
            UpdateProductRequest,
            CheckoutItem,
            CheckoutRequest,
            PayOrderRequest,
            OrderList,
            OrderWithItems,
            admin::UpdateOrderStatusRequest,
            admin::LowStockQuery,
            admin::StatsData,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<Coupon>,
            ApiResponse<CouponValidation>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<ProductList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Catalog", description = "Public storefront catalog"),
        (name = "Coupons", description = "Coupon validation"),
        (name = "Orders", description = "Checkout and order endpoints"),
        (name = "Admin", description = "Administration panel endpoints"),
        (name = "Auth", description = "Authentication endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
