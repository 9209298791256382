use crate::entities::{
    DiscountType, app_user_entity as app_users, discount_entity as discounts,
    discount_product_entity as discount_products, discount_user_entity as discount_users,
    product_entity as products,
};
use crate::error::{AppError, AppResult};
use crate::external::{CouponAnnouncement, CouponNotifier};
use crate::models::*;
use crate::services::coupon_engine::{CouponRejection, CouponTerms, PricingDecision, price_cart};
use crate::utils::{normalize_coupon_code, to_cents};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

#[derive(Clone)]
pub struct DiscountService {
    pool: DatabaseConnection,
    notifier: Arc<dyn CouponNotifier>,
}

impl DiscountService {
    pub fn new(pool: DatabaseConnection, notifier: Arc<dyn CouponNotifier>) -> Self {
        Self { pool, notifier }
    }

    /// 校验优惠券并计算折扣
    ///
    /// 外层 `AppResult` 只承载数据库错误；业务上的拒绝原因放在内层 `Result` 中。
    /// 不检查 `active` 与使用次数，也不会增加 `used_count`。
    pub async fn validate_coupon(
        &self,
        request: &ValidateCouponRequest,
        now: DateTime<Utc>,
    ) -> AppResult<Result<PricingDecision, CouponRejection>> {
        let cart = match request.normalize() {
            Ok(cart) => cart,
            Err(rejection) => return Ok(Err(rejection)),
        };

        let Some(coupon) = self.find_by_code(&cart.code).await? else {
            log::debug!("Coupon {} rejected: not found", cart.code);
            return Ok(Err(CouponRejection::CouponNotFound));
        };

        let eligible = if coupon.apply_all_products {
            HashSet::new()
        } else {
            self.eligible_product_ids(coupon.id).await?
        };

        let terms = CouponTerms::from_model(&coupon, eligible);
        let result = price_cart(&terms, &cart, now);
        if let Err(rejection) = &result {
            log::debug!("Coupon {} rejected: {}", coupon.code, rejection.reason());
        }
        Ok(result)
    }

    /// 按优惠码查找（忽略大小写）
    pub async fn find_by_code(&self, code: &str) -> AppResult<Option<discounts::Model>> {
        find_by_code(&self.pool, code).await
    }

    /// 优惠券适用的商品 id
    pub async fn eligible_product_ids(&self, discount_id: i32) -> AppResult<HashSet<i32>> {
        let rows = discount_products::Entity::find()
            .filter(discount_products::Column::DiscountId.eq(discount_id))
            .all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|r| r.product_id).collect())
    }

    pub async fn create_discount(&self, request: DiscountRequest) -> AppResult<DiscountResponse> {
        request.validate()?;
        self.ensure_code_available(&request.code, None).await?;
        self.ensure_scope_exists(&request).await?;

        let now = Utc::now();
        let txn = self.pool.begin().await?;

        let model = discounts::ActiveModel {
            title: Set(request.title.trim().to_string()),
            code: Set(request.code.clone()),
            discount_type: Set(request.discount_type),
            value_hundredths: Set(value_hundredths(&request)?),
            active: Set(request.active),
            start_date: Set(request.start_date),
            end_date: Set(request.end_date),
            apply_all_products: Set(request.apply_all_products),
            apply_all_users: Set(request.apply_all_users),
            max_uses: Set(request.max_uses),
            used_count: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        write_scope(&txn, model.id, request.scoped_products(), request.scoped_users()).await?;

        txn.commit().await?;

        log::info!("Discount {} created with code {}", model.id, model.code);

        self.announce(&model).await;

        Ok(DiscountResponse::from_parts(
            model,
            sorted(request.scoped_products()),
            sorted(request.scoped_users()),
        ))
    }

    /// 整体替换优惠券配置与适用范围，`used_count` 保持不变，不重新发送通知
    pub async fn update_discount(
        &self,
        id: i32,
        request: DiscountRequest,
    ) -> AppResult<DiscountResponse> {
        request.validate()?;
        let existing = self.load(id).await?;
        self.ensure_code_available(&request.code, Some(id)).await?;
        self.ensure_scope_exists(&request).await?;

        let txn = self.pool.begin().await?;

        let mut am = existing.into_active_model();
        am.title = Set(request.title.trim().to_string());
        am.code = Set(request.code.clone());
        am.discount_type = Set(request.discount_type);
        am.value_hundredths = Set(value_hundredths(&request)?);
        am.active = Set(request.active);
        am.start_date = Set(request.start_date);
        am.end_date = Set(request.end_date);
        am.apply_all_products = Set(request.apply_all_products);
        am.apply_all_users = Set(request.apply_all_users);
        am.max_uses = Set(request.max_uses);
        am.updated_at = Set(Utc::now());
        let model = am.update(&txn).await?;

        clear_scope(&txn, id).await?;
        write_scope(&txn, id, request.scoped_products(), request.scoped_users()).await?;

        txn.commit().await?;

        log::info!("Discount {id} updated");

        Ok(DiscountResponse::from_parts(
            model,
            sorted(request.scoped_products()),
            sorted(request.scoped_users()),
        ))
    }

    pub async fn get_discount(&self, id: i32) -> AppResult<DiscountResponse> {
        let model = self.load(id).await?;
        let mut products = self.scope_products(&[id]).await?;
        let mut users = self.scope_users(&[id]).await?;
        Ok(DiscountResponse::from_parts(
            model,
            products.remove(&id).unwrap_or_default(),
            users.remove(&id).unwrap_or_default(),
        ))
    }

    pub async fn list_discounts(
        &self,
        query: &DiscountQuery,
    ) -> AppResult<PaginatedResponse<DiscountResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut base_query = discounts::Entity::find();
        if let Some(active) = query.active {
            base_query = base_query.filter(discounts::Column::Active.eq(active));
        }

        let total = base_query.clone().count(&self.pool).await?;

        let models = base_query
            .order_by_desc(discounts::Column::CreatedAt)
            .order_by_desc(discounts::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?;

        let ids: Vec<i32> = models.iter().map(|m| m.id).collect();
        let mut products = self.scope_products(&ids).await?;
        let mut users = self.scope_users(&ids).await?;

        let items = models
            .into_iter()
            .map(|m| {
                let id = m.id;
                DiscountResponse::from_parts(
                    m,
                    products.remove(&id).unwrap_or_default(),
                    users.remove(&id).unwrap_or_default(),
                )
            })
            .collect();

        Ok(PaginatedResponse::new(items, params, total))
    }

    pub async fn delete_discount(&self, id: i32) -> AppResult<()> {
        self.load(id).await?;

        let txn = self.pool.begin().await?;
        clear_scope(&txn, id).await?;
        discounts::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        log::info!("Discount {id} deleted");
        Ok(())
    }

    // -----------------------------
    // 内部辅助方法
    // -----------------------------

    async fn load(&self, id: i32) -> AppResult<discounts::Model> {
        discounts::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Discount not found".to_string()))
    }

    /// 优惠码唯一（忽略大小写），更新时排除自身
    async fn ensure_code_available(&self, code: &str, current_id: Option<i32>) -> AppResult<()> {
        if let Some(found) = self.find_by_code(code).await?
            && Some(found.id) != current_id
        {
            return Err(AppError::ValidationError(
                "Coupon code already exists".to_string(),
            ));
        }
        Ok(())
    }

    async fn ensure_scope_exists(&self, request: &DiscountRequest) -> AppResult<()> {
        let wanted: BTreeSet<i32> = request.scoped_products().iter().copied().collect();
        if !wanted.is_empty() {
            let found: HashSet<i32> = products::Entity::find()
                .filter(products::Column::Id.is_in(wanted.iter().copied()))
                .all(&self.pool)
                .await?
                .into_iter()
                .map(|p| p.id)
                .collect();
            let missing: Vec<String> = wanted
                .iter()
                .filter(|id| !found.contains(id))
                .map(|id| id.to_string())
                .collect();
            if !missing.is_empty() {
                return Err(AppError::ValidationError(format!(
                    "Unknown product id(s): {}",
                    missing.join(", ")
                )));
            }
        }

        let wanted: BTreeSet<i32> = request.scoped_users().iter().copied().collect();
        if !wanted.is_empty() {
            let found: HashSet<i32> = app_users::Entity::find()
                .filter(app_users::Column::Id.is_in(wanted.iter().copied()))
                .all(&self.pool)
                .await?
                .into_iter()
                .map(|u| u.id)
                .collect();
            let missing: Vec<String> = wanted
                .iter()
                .filter(|id| !found.contains(id))
                .map(|id| id.to_string())
                .collect();
            if !missing.is_empty() {
                return Err(AppError::ValidationError(format!(
                    "Unknown user id(s): {}",
                    missing.join(", ")
                )));
            }
        }
        Ok(())
    }

    async fn scope_products(&self, ids: &[i32]) -> AppResult<HashMap<i32, Vec<i32>>> {
        let mut map: HashMap<i32, Vec<i32>> = HashMap::new();
        if ids.is_empty() {
            return Ok(map);
        }
        let rows = discount_products::Entity::find()
            .filter(discount_products::Column::DiscountId.is_in(ids.iter().copied()))
            .order_by_asc(discount_products::Column::ProductId)
            .all(&self.pool)
            .await?;
        for r in rows {
            map.entry(r.discount_id).or_default().push(r.product_id);
        }
        Ok(map)
    }

    async fn scope_users(&self, ids: &[i32]) -> AppResult<HashMap<i32, Vec<i32>>> {
        let mut map: HashMap<i32, Vec<i32>> = HashMap::new();
        if ids.is_empty() {
            return Ok(map);
        }
        let rows = discount_users::Entity::find()
            .filter(discount_users::Column::DiscountId.is_in(ids.iter().copied()))
            .order_by_asc(discount_users::Column::UserId)
            .all(&self.pool)
            .await?;
        for r in rows {
            map.entry(r.discount_id).or_default().push(r.user_id);
        }
        Ok(map)
    }

    /// 通知有邮箱的目标用户；失败只记录日志
    async fn announce(&self, coupon: &discounts::Model) {
        let recipients = match self.recipients(coupon).await {
            Ok(list) => list,
            Err(e) => {
                log::warn!("Failed to load recipients for coupon {}: {e}", coupon.code);
                return;
            }
        };
        if recipients.is_empty() {
            return;
        }

        let announcement = CouponAnnouncement {
            title: coupon.title.clone(),
            code: coupon.code.clone(),
            value: coupon.value(),
            is_percentage: coupon.discount_type == DiscountType::Percentage,
            end_date: coupon.end_date,
        };
        if let Err(e) = self.notifier.announce(&announcement, &recipients) {
            log::warn!("Failed to announce coupon {}: {e}", coupon.code);
        }
    }

    async fn recipients(&self, coupon: &discounts::Model) -> AppResult<Vec<String>> {
        let mut query = app_users::Entity::find()
            .filter(app_users::Column::Email.is_not_null())
            .order_by_asc(app_users::Column::Id);

        if !coupon.apply_all_users {
            let user_ids: Vec<i32> = discount_users::Entity::find()
                .filter(discount_users::Column::DiscountId.eq(coupon.id))
                .all(&self.pool)
                .await?
                .into_iter()
                .map(|r| r.user_id)
                .collect();
            if user_ids.is_empty() {
                return Ok(Vec::new());
            }
            query = query.filter(app_users::Column::Id.is_in(user_ids));
        }

        Ok(query
            .all(&self.pool)
            .await?
            .into_iter()
            .filter_map(|u| u.email)
            .filter(|email| !email.trim().is_empty())
            .collect())
    }
}

async fn find_by_code<C: ConnectionTrait>(
    conn: &C,
    code: &str,
) -> AppResult<Option<discounts::Model>> {
    let coupon = discounts::Entity::find()
        .filter(
            Expr::expr(Func::lower(Expr::col(discounts::Column::Code)))
                .eq(normalize_coupon_code(code)),
        )
        .one(conn)
        .await?;
    Ok(coupon)
}

fn value_hundredths(request: &DiscountRequest) -> AppResult<i64> {
    to_cents(request.value)
        .ok_or_else(|| AppError::ValidationError("Value is too large".to_string()))
}

fn sorted(ids: &[i32]) -> Vec<i32> {
    ids.iter().copied().collect::<BTreeSet<i32>>().into_iter().collect()
}

async fn clear_scope<C: ConnectionTrait>(conn: &C, discount_id: i32) -> AppResult<()> {
    discount_products::Entity::delete_many()
        .filter(discount_products::Column::DiscountId.eq(discount_id))
        .exec(conn)
        .await?;
    discount_users::Entity::delete_many()
        .filter(discount_users::Column::DiscountId.eq(discount_id))
        .exec(conn)
        .await?;
    Ok(())
}

async fn write_scope<C: ConnectionTrait>(
    conn: &C,
    discount_id: i32,
    product_ids: &[i32],
    user_ids: &[i32],
) -> AppResult<()> {
    let product_ids = sorted(product_ids);
    if !product_ids.is_empty() {
        discount_products::Entity::insert_many(product_ids.into_iter().map(|product_id| {
            discount_products::ActiveModel {
                discount_id: Set(discount_id),
                product_id: Set(product_id),
            }
        }))
        .exec_without_returning(conn)
        .await?;
    }

    let user_ids = sorted(user_ids);
    if !user_ids.is_empty() {
        discount_users::Entity::insert_many(user_ids.into_iter().map(|user_id| {
            discount_users::ActiveModel {
                discount_id: Set(discount_id),
                user_id: Set(user_id),
            }
        }))
        .exec_without_returning(conn)
        .await?;
    }
    Ok(())
}
