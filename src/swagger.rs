use actix_web::web;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{DiscountType, OrderStatus, OrderType};
use crate::handlers;
use crate::models::*;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::discount::validate_coupon,
        handlers::discount::list_discounts,
        handlers::discount::create_discount,
        handlers::discount::get_discount,
        handlers::discount::update_discount,
        handlers::discount::delete_discount,
        handlers::order::list_orders,
        handlers::order::create_order,
        handlers::order::get_order,
        handlers::order::update_order_status,
        handlers::order::delete_order,
        handlers::order::create_item,
        handlers::order::update_item,
        handlers::order::delete_item,
        handlers::user::get_points,
        handlers::user::list_app_users,
        handlers::user::create_app_user,
        handlers::catalog::list_products,
    ),
    components(
        schemas(
            ValidateCouponRequest,
            CartItemInput,
            CouponValidationResponse,
            DiscountRequest,
            DiscountResponse,
            DiscountQuery,
            DiscountType,
            CreateOrderRequest,
            OrderItemInput,
            OrderItemPatch,
            PaymentInput,
            UpdateOrderStatusRequest,
            OrderQuery,
            OrderResponse,
            OrderItemResponse,
            PaymentResponse,
            OrderStatus,
            OrderType,
            UserDetail,
            PointsResponse,
            ListQuery,
            ProductResponse,
            AppUserResponse,
            CreateAppUserRequest,
            ApiError,
        )
    ),
    tags(
        (name = "discount", description = "Coupon validation API"),
        (name = "order", description = "Order management API"),
        (name = "user", description = "App user and points API"),
        (name = "catalog", description = "Product catalog API"),
        (name = "admin", description = "Coupon administration API"),
    ),
    info(
        title = "Storefront Backend API",
        version = "1.0.0",
        description = "Storefront coupon pricing and order REST API documentation"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
