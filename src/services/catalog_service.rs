use crate::entities::{app_user_entity as app_users, product_entity as products};
use crate::error::{AppError, AppResult};
use crate::models::*;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

/// 商品与 App 用户：下单和优惠券范围引用的基础数据
#[derive(Clone)]
pub struct CatalogService {
    pool: DatabaseConnection,
}

impl CatalogService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 商品列表，按 id 倒序
    pub async fn list_products(
        &self,
        query: &ListQuery,
    ) -> AppResult<PaginatedResponse<ProductResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let total = products::Entity::find().count(&self.pool).await?;
        let data = products::Entity::find()
            .order_by_desc(products::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?
            .into_iter()
            .map(ProductResponse::from)
            .collect();

        Ok(PaginatedResponse::new(data, params, total))
    }

    /// 用户列表，按注册时间倒序
    pub async fn list_app_users(
        &self,
        query: &ListQuery,
    ) -> AppResult<PaginatedResponse<AppUserResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let total = app_users::Entity::find().count(&self.pool).await?;
        let data = app_users::Entity::find()
            .order_by_desc(app_users::Column::CreatedAt)
            .order_by_desc(app_users::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?
            .into_iter()
            .map(AppUserResponse::from)
            .collect();

        Ok(PaginatedResponse::new(data, params, total))
    }

    pub async fn create_app_user(
        &self,
        request: CreateAppUserRequest,
    ) -> AppResult<AppUserResponse> {
        let (number, name, email) = request.normalized()?;

        let exists = app_users::Entity::find()
            .filter(app_users::Column::Number.eq(number.as_str()))
            .one(&self.pool)
            .await?;
        if exists.is_some() {
            return Err(AppError::ValidationError(
                "Number already registered".to_string(),
            ));
        }

        let user = app_users::ActiveModel {
            number: Set(number),
            name: Set(name),
            email: Set(email),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!("App user {} registered", user.id);

        Ok(user.into())
    }
}
