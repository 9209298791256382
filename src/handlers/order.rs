use crate::models::*;
use crate::services::OrderService;
use actix_web::{HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/orders",
    tag = "order",
    params(
        ("page" = Option<u64>, Query, description = "页码"),
        ("per_page" = Option<u64>, Query, description = "每页数量"),
        ("order_type" = Option<String>, Query, description = "订单类型: normal/redeem"),
        ("status" = Option<String>, Query, description = "订单状态"),
        ("user_id" = Option<i32>, Query, description = "用户 ID")
    ),
    responses(
        (status = 200, description = "获取订单列表成功")
    )
)]
pub async fn list_orders(
    order_service: web::Data<OrderService>,
    query: web::Query<OrderQuery>,
) -> Result<HttpResponse> {
    match order_service.list_orders(&query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(page))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/orders",
    tag = "order",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "创建订单成功", body = OrderResponse),
        (status = 400, description = "请求参数错误")
    )
)]
pub async fn create_order(
    order_service: web::Data<OrderService>,
    request: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse> {
    match order_service.create_order(request.into_inner()).await {
        Ok(order) => Ok(HttpResponse::Created().json(ApiResponse::success_with_message(
            order,
            "Order created successfully",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/orders/{id}",
    tag = "order",
    params(("id" = i32, Path, description = "订单 ID")),
    responses(
        (status = 200, description = "获取订单成功", body = OrderResponse),
        (status = 404, description = "订单不存在")
    )
)]
pub async fn get_order(
    order_service: web::Data<OrderService>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    match order_service.get_order(path.into_inner()).await {
        Ok(order) => Ok(HttpResponse::Ok().json(ApiResponse::success(order))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    patch,
    path = "/orders/{id}/status",
    tag = "order",
    params(("id" = i32, Path, description = "订单 ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "更新订单状态成功", body = OrderResponse),
        (status = 400, description = "状态无效"),
        (status = 404, description = "订单不存在")
    )
)]
pub async fn update_order_status(
    order_service: web::Data<OrderService>,
    path: web::Path<i32>,
    request: web::Json<UpdateOrderStatusRequest>,
) -> Result<HttpResponse> {
    match order_service
        .update_order_status(path.into_inner(), request.into_inner())
        .await
    {
        Ok(order) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            order,
            "Status updated",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/orders/{id}",
    tag = "order",
    params(("id" = i32, Path, description = "订单 ID")),
    responses(
        (status = 200, description = "删除订单成功"),
        (status = 404, description = "订单不存在")
    )
)]
pub async fn delete_order(
    order_service: web::Data<OrderService>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    match order_service.delete_order(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::message("Order deleted"))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/orders/{id}/items",
    tag = "order",
    params(("id" = i32, Path, description = "订单 ID")),
    request_body = OrderItemInput,
    responses(
        (status = 201, description = "新增订单项成功", body = OrderResponse),
        (status = 400, description = "请求参数错误"),
        (status = 404, description = "订单不存在")
    )
)]
pub async fn create_item(
    order_service: web::Data<OrderService>,
    path: web::Path<i32>,
    request: web::Json<OrderItemInput>,
) -> Result<HttpResponse> {
    match order_service
        .create_item(path.into_inner(), request.into_inner())
        .await
    {
        Ok(order) => Ok(HttpResponse::Created().json(ApiResponse::success(order))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/orders/{id}/items/{item_id}",
    tag = "order",
    params(
        ("id" = i32, Path, description = "订单 ID"),
        ("item_id" = i32, Path, description = "订单项 ID")
    ),
    request_body = OrderItemPatch,
    responses(
        (status = 200, description = "更新订单项成功", body = OrderResponse),
        (status = 400, description = "请求参数错误"),
        (status = 404, description = "订单项不存在")
    )
)]
pub async fn update_item(
    order_service: web::Data<OrderService>,
    path: web::Path<(i32, i32)>,
    request: web::Json<OrderItemPatch>,
) -> Result<HttpResponse> {
    let (order_id, item_id) = path.into_inner();
    match order_service
        .update_item(order_id, item_id, request.into_inner())
        .await
    {
        Ok(order) => Ok(HttpResponse::Ok().json(ApiResponse::success(order))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/orders/{id}/items/{item_id}",
    tag = "order",
    params(
        ("id" = i32, Path, description = "订单 ID"),
        ("item_id" = i32, Path, description = "订单项 ID")
    ),
    responses(
        (status = 200, description = "删除订单项成功", body = OrderResponse),
        (status = 404, description = "订单项不存在")
    )
)]
pub async fn delete_item(
    order_service: web::Data<OrderService>,
    path: web::Path<(i32, i32)>,
) -> Result<HttpResponse> {
    let (order_id, item_id) = path.into_inner();
    match order_service.delete_item(order_id, item_id).await {
        Ok(order) => Ok(HttpResponse::Ok().json(ApiResponse::success(order))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn order_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/orders")
            .route("", web::get().to(list_orders))
            .route("", web::post().to(create_order))
            .route("/{id}", web::get().to(get_order))
            .route("/{id}", web::delete().to(delete_order))
            .route("/{id}/status", web::patch().to(update_order_status))
            .route("/{id}/items", web::post().to(create_item))
            .route("/{id}/items/{item_id}", web::put().to(update_item))
            .route("/{id}/items/{item_id}", web::delete().to(delete_item)),
    );
}
