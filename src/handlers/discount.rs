use crate::models::*;
use crate::services::{CouponRejection, DiscountService};
use actix_web::error::InternalError;
use actix_web::{HttpResponse, ResponseError, Result, web};
use chrono::Utc;

#[utoipa::path(
    post,
    path = "/discounts/validate",
    tag = "discount",
    request_body = ValidateCouponRequest,
    responses(
        (status = 200, description = "优惠券可用", body = CouponValidationResponse),
        (status = 400, description = "请求参数错误或优惠券不可用", body = CouponValidationResponse),
        (status = 404, description = "优惠码不存在", body = CouponValidationResponse)
    )
)]
pub async fn validate_coupon(
    discount_service: web::Data<DiscountService>,
    request: web::Json<ValidateCouponRequest>,
) -> Result<HttpResponse> {
    match discount_service.validate_coupon(&request, Utc::now()).await {
        Ok(Ok(decision)) => Ok(HttpResponse::Ok().json(CouponValidationResponse::from(decision))),
        Ok(Err(rejection)) => {
            let body = CouponValidationResponse::from(rejection);
            if rejection == CouponRejection::CouponNotFound {
                Ok(HttpResponse::NotFound().json(body))
            } else {
                Ok(HttpResponse::BadRequest().json(body))
            }
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/discounts",
    tag = "admin",
    params(
        ("page" = Option<u64>, Query, description = "页码"),
        ("per_page" = Option<u64>, Query, description = "每页数量"),
        ("active" = Option<bool>, Query, description = "是否启用")
    ),
    responses(
        (status = 200, description = "获取优惠券列表成功")
    )
)]
pub async fn list_discounts(
    discount_service: web::Data<DiscountService>,
    query: web::Query<DiscountQuery>,
) -> Result<HttpResponse> {
    match discount_service.list_discounts(&query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(page))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/discounts",
    tag = "admin",
    request_body = DiscountRequest,
    responses(
        (status = 201, description = "创建优惠券成功", body = DiscountResponse),
        (status = 400, description = "请求参数错误")
    )
)]
pub async fn create_discount(
    discount_service: web::Data<DiscountService>,
    request: web::Json<DiscountRequest>,
) -> Result<HttpResponse> {
    match discount_service.create_discount(request.into_inner()).await {
        Ok(discount) => Ok(HttpResponse::Created().json(ApiResponse::success_with_message(
            discount,
            "Discount created successfully",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/discounts/{id}",
    tag = "admin",
    params(("id" = i32, Path, description = "优惠券 ID")),
    responses(
        (status = 200, description = "获取优惠券成功", body = DiscountResponse),
        (status = 404, description = "优惠券不存在")
    )
)]
pub async fn get_discount(
    discount_service: web::Data<DiscountService>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    match discount_service.get_discount(path.into_inner()).await {
        Ok(discount) => Ok(HttpResponse::Ok().json(ApiResponse::success(discount))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/admin/discounts/{id}",
    tag = "admin",
    params(("id" = i32, Path, description = "优惠券 ID")),
    request_body = DiscountRequest,
    responses(
        (status = 200, description = "更新优惠券成功", body = DiscountResponse),
        (status = 400, description = "请求参数错误"),
        (status = 404, description = "优惠券不存在")
    )
)]
pub async fn update_discount(
    discount_service: web::Data<DiscountService>,
    path: web::Path<i32>,
    request: web::Json<DiscountRequest>,
) -> Result<HttpResponse> {
    match discount_service
        .update_discount(path.into_inner(), request.into_inner())
        .await
    {
        Ok(discount) => Ok(HttpResponse::Ok().json(ApiResponse::success(discount))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/admin/discounts/{id}",
    tag = "admin",
    params(("id" = i32, Path, description = "优惠券 ID")),
    responses(
        (status = 200, description = "删除优惠券成功"),
        (status = 404, description = "优惠券不存在")
    )
)]
pub async fn delete_discount(
    discount_service: web::Data<DiscountService>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    match discount_service.delete_discount(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::message("Discount deleted"))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 请求体无法解析时同样返回校验结果结构，而不是 actix 默认的纯文本错误
fn validate_json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        log::debug!("Coupon validation body rejected: {err}");
        let body = CouponValidationResponse::from(CouponRejection::InvalidRequest);
        InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
    })
}

pub fn discount_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/discounts")
            .app_data(validate_json_config())
            .route("/validate", web::post().to(validate_coupon)),
    );
}

pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin/discounts")
            .route("", web::get().to(list_discounts))
            .route("", web::post().to(create_discount))
            .route("/{id}", web::get().to(get_discount))
            .route("/{id}", web::put().to(update_discount))
            .route("/{id}", web::delete().to(delete_discount)),
    );
}
