use crate::models::*;
use crate::services::{CatalogService, OrderService};
use actix_web::{HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/app-users",
    tag = "user",
    params(
        ("page" = Option<u64>, Query, description = "页码"),
        ("per_page" = Option<u64>, Query, description = "每页数量")
    ),
    responses(
        (status = 200, description = "获取用户列表成功")
    )
)]
pub async fn list_app_users(
    catalog_service: web::Data<CatalogService>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse> {
    match catalog_service.list_app_users(&query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(page))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/app-users",
    tag = "user",
    request_body = CreateAppUserRequest,
    responses(
        (status = 201, description = "注册成功", body = AppUserResponse),
        (status = 400, description = "请求参数错误或手机号已注册")
    )
)]
pub async fn create_app_user(
    catalog_service: web::Data<CatalogService>,
    request: web::Json<CreateAppUserRequest>,
) -> Result<HttpResponse> {
    match catalog_service.create_app_user(request.into_inner()).await {
        Ok(user) => Ok(HttpResponse::Created().json(ApiResponse::success(user))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/app-users/{id}/points",
    tag = "user",
    params(("id" = i32, Path, description = "用户 ID")),
    responses(
        (status = 200, description = "获取用户积分成功", body = PointsResponse),
        (status = 404, description = "用户不存在")
    )
)]
pub async fn get_points(
    order_service: web::Data<OrderService>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    match order_service.user_points(path.into_inner()).await {
        Ok(points) => Ok(HttpResponse::Ok().json(ApiResponse::success(points))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn user_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/app-users")
            .route("", web::get().to(list_app_users))
            .route("", web::post().to(create_app_user))
            .route("/{id}/points", web::get().to(get_points)),
    );
}
