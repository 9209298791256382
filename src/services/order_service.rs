use crate::entities::{
    OrderStatus, OrderType, app_user_entity as app_users, order_entity as orders,
    order_item_entity as order_items, payment_entity as payments,
};
use crate::error::{AppError, AppResult};
use crate::external::MediaStore;
use crate::models::*;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    QueryTrait, Set, TransactionTrait,
};
use std::collections::HashMap;

#[derive(Clone)]
pub struct OrderService {
    pool: DatabaseConnection,
    media: MediaStore,
}

impl OrderService {
    pub fn new(pool: DatabaseConnection, media: MediaStore) -> Self {
        Self { pool, media }
    }

    /// 创建订单
    ///
    /// 逻辑:
    /// 1. 校验用户、状态与订单项
    /// 2. 在事务外处理订单项图片（失败时不带图片继续）
    /// 3. 单个事务内写入订单、订单项、订单类型与支付记录
    pub async fn create_order(&self, request: CreateOrderRequest) -> AppResult<OrderResponse> {
        let invalid_user = || AppError::ValidationError("Invalid user_id".to_string());
        let user_id = request.user_id.ok_or_else(invalid_user)?;
        app_users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(invalid_user)?;

        let status = match request.status.as_deref() {
            None => OrderStatus::Pending,
            Some(raw) => parse_order_status(raw)?,
        };

        let items = request
            .product
            .iter()
            .map(OrderItemInput::validate)
            .collect::<AppResult<Vec<_>>>()?;

        let mut images = Vec::with_capacity(request.product.len());
        for item in &request.product {
            images.push(self.media.resolve(item.image.as_ref()).await);
        }

        let txn = self.pool.begin().await?;
        let written = write_order(&txn, user_id, status, &request, items, &images).await;
        let order_id = match written {
            Ok(id) => {
                txn.commit().await?;
                id
            }
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    log::warn!("Failed to roll back order creation: {rollback_err}");
                }
                // 清理已落盘的图片
                for path in images.iter().flatten() {
                    self.media.discard(path).await;
                }
                return Err(e);
            }
        };

        log::info!("Order {order_id} created for user {user_id}");

        self.get_order(order_id).await
    }

    pub async fn get_order(&self, id: i32) -> AppResult<OrderResponse> {
        let order = self.load(id).await?;

        let items = order_items::Entity::find()
            .filter(order_items::Column::OrderId.eq(id))
            .order_by_asc(order_items::Column::Id)
            .all(&self.pool)
            .await?;
        let payments = payments::Entity::find()
            .filter(payments::Column::OrderId.eq(id))
            .order_by_asc(payments::Column::Id)
            .all(&self.pool)
            .await?;
        let user_detail = match order.user_id {
            Some(user_id) => self.user_detail(user_id).await?,
            None => None,
        };

        Ok(OrderResponse::from_parts(order, user_detail, items, payments))
    }

    /// 订单列表，按创建时间倒序
    pub async fn list_orders(
        &self,
        query: &OrderQuery,
    ) -> AppResult<PaginatedResponse<OrderResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut base_query = orders::Entity::find();
        if let Some(order_type) = query.order_type {
            base_query = base_query.filter(orders::Column::OrderType.eq(order_type));
        }
        if let Some(status) = query.status {
            base_query = base_query.filter(orders::Column::Status.eq(status));
        }
        if let Some(user_id) = query.user_id {
            base_query = base_query.filter(orders::Column::UserId.eq(user_id));
        }

        let total = base_query.clone().count(&self.pool).await?;

        let models = base_query
            .order_by_desc(orders::Column::CreatedAt)
            .order_by_desc(orders::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?;

        let ids: Vec<i32> = models.iter().map(|o| o.id).collect();
        let mut items_by_order: HashMap<i32, Vec<order_items::Model>> = HashMap::new();
        let mut payments_by_order: HashMap<i32, Vec<payments::Model>> = HashMap::new();
        if !ids.is_empty() {
            for item in order_items::Entity::find()
                .filter(order_items::Column::OrderId.is_in(ids.iter().copied()))
                .order_by_asc(order_items::Column::Id)
                .all(&self.pool)
                .await?
            {
                items_by_order.entry(item.order_id).or_default().push(item);
            }
            for payment in payments::Entity::find()
                .filter(payments::Column::OrderId.is_in(ids.iter().copied()))
                .order_by_asc(payments::Column::Id)
                .all(&self.pool)
                .await?
            {
                payments_by_order
                    .entry(payment.order_id)
                    .or_default()
                    .push(payment);
            }
        }

        // 同一用户只计算一次积分
        let mut users: HashMap<i32, Option<UserDetail>> = HashMap::new();
        for user_id in models.iter().filter_map(|o| o.user_id) {
            if !users.contains_key(&user_id) {
                let detail = self.user_detail(user_id).await?;
                users.insert(user_id, detail);
            }
        }

        let data = models
            .into_iter()
            .map(|order| {
                let user_detail = order
                    .user_id
                    .and_then(|uid| users.get(&uid).cloned().flatten());
                let items = items_by_order.remove(&order.id).unwrap_or_default();
                let payments = payments_by_order.remove(&order.id).unwrap_or_default();
                OrderResponse::from_parts(order, user_detail, items, payments)
            })
            .collect();

        Ok(PaginatedResponse::new(data, params, total))
    }

    /// 更新订单状态，任意状态之间都可以切换
    pub async fn update_order_status(
        &self,
        id: i32,
        request: UpdateOrderStatusRequest,
    ) -> AppResult<OrderResponse> {
        let status = parse_order_status(&request.status)?;
        let order = self.load(id).await?;

        let previous = order.status;
        let mut am = order.into_active_model();
        am.status = Set(status);
        am.update(&self.pool).await?;

        log::info!("Order {id} status changed: {previous} -> {status}");

        self.get_order(id).await
    }

    /// 删除订单及其订单项、支付记录
    pub async fn delete_order(&self, id: i32) -> AppResult<()> {
        self.load(id).await?;

        let txn = self.pool.begin().await?;
        let images: Vec<String> = order_items::Entity::find()
            .filter(order_items::Column::OrderId.eq(id))
            .all(&txn)
            .await?
            .into_iter()
            .filter_map(|item| item.image)
            .collect();
        order_items::Entity::delete_many()
            .filter(order_items::Column::OrderId.eq(id))
            .exec(&txn)
            .await?;
        payments::Entity::delete_many()
            .filter(payments::Column::OrderId.eq(id))
            .exec(&txn)
            .await?;
        orders::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        for path in &images {
            self.media.discard(path).await;
        }

        log::info!("Order {id} deleted");
        Ok(())
    }

    /// 新增订单项，并在同一事务内重新计算订单类型
    pub async fn create_item(
        &self,
        order_id: i32,
        input: OrderItemInput,
    ) -> AppResult<OrderResponse> {
        let item = input.validate()?;
        self.load(order_id).await?;
        let image = self.media.resolve(input.image.as_ref()).await;

        let txn = self.pool.begin().await?;
        insert_item(&txn, order_id, item, image).await?;
        let order_type = recompute_order_type(&txn, order_id).await?;
        txn.commit().await?;

        log::info!("Item added to order {order_id}, type is now {order_type}");

        self.get_order(order_id).await
    }

    /// 部分更新订单项，并在同一事务内重新计算订单类型
    pub async fn update_item(
        &self,
        order_id: i32,
        item_id: i32,
        patch: OrderItemPatch,
    ) -> AppResult<OrderResponse> {
        let existing = self.load_item(order_id, item_id).await?;

        let name = match &patch.name {
            Some(name) if name.trim().is_empty() => {
                return Err(AppError::ValidationError(
                    "Item name must not be empty".to_string(),
                ));
            }
            Some(name) => Some(name.trim().to_string()),
            None => None,
        };
        let price_cents = patch.price.map(validate_price).transpose()?;
        let quantity = patch.quantity.map(validate_quantity).transpose()?;

        // 新图片无法保存时保留原图
        let new_image = match &patch.image {
            Some(image) => self.media.resolve(Some(image)).await,
            None => None,
        };
        let old_image = existing.image.clone();

        let txn = self.pool.begin().await?;
        let mut am = existing.into_active_model();
        if let Some(name) = name {
            am.name = Set(name);
        }
        if let Some(cents) = price_cents {
            am.price_cents = Set(cents);
        }
        if let Some(quantity) = quantity {
            am.quantity = Set(quantity);
        }
        if let Some(points) = patch.pts {
            am.points = Set(points);
        }
        if let Some(variants) = patch.variants {
            am.variants = Set(Some(variants));
        }
        if let Some(path) = &new_image {
            am.image = Set(Some(path.clone()));
        }
        am.update(&txn).await?;
        let order_type = recompute_order_type(&txn, order_id).await?;
        txn.commit().await?;

        if new_image.is_some()
            && let Some(old) = old_image
        {
            self.media.discard(&old).await;
        }

        log::info!("Item {item_id} of order {order_id} updated, type is now {order_type}");

        self.get_order(order_id).await
    }

    /// 删除订单项，并在同一事务内重新计算订单类型
    pub async fn delete_item(&self, order_id: i32, item_id: i32) -> AppResult<OrderResponse> {
        let existing = self.load_item(order_id, item_id).await?;

        let txn = self.pool.begin().await?;
        order_items::Entity::delete_by_id(item_id).exec(&txn).await?;
        let order_type = recompute_order_type(&txn, order_id).await?;
        txn.commit().await?;

        if let Some(path) = existing.image {
            self.media.discard(&path).await;
        }

        log::info!("Item {item_id} removed from order {order_id}, type is now {order_type}");

        self.get_order(order_id).await
    }

    /// 重新计算订单类型（独立事务）
    pub async fn recompute_order_type(&self, order_id: i32) -> AppResult<OrderType> {
        let txn = self.pool.begin().await?;
        let order_type = recompute_order_type(&txn, order_id).await?;
        txn.commit().await?;
        Ok(order_type)
    }

    /// 用户积分：已送达普通订单积分之和 - 已送达兑换订单积分之和
    pub async fn user_points(&self, user_id: i32) -> AppResult<PointsResponse> {
        app_users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(PointsResponse {
            user_id,
            total_points: total_points(&self.pool, user_id).await?,
        })
    }

    // -----------------------------
    // 内部辅助方法
    // -----------------------------

    async fn load(&self, id: i32) -> AppResult<orders::Model> {
        orders::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))
    }

    async fn load_item(&self, order_id: i32, item_id: i32) -> AppResult<order_items::Model> {
        order_items::Entity::find_by_id(item_id)
            .filter(order_items::Column::OrderId.eq(order_id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Order item not found".to_string()))
    }

    async fn user_detail(&self, user_id: i32) -> AppResult<Option<UserDetail>> {
        let Some(user) = app_users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
        else {
            return Ok(None);
        };
        let points = total_points(&self.pool, user_id).await?;
        Ok(Some(UserDetail::new(user, points)))
    }
}

/// 读取订单全部订单项并写回推导出的订单类型
///
/// 必须与订单项写入处于同一事务中调用
pub async fn recompute_order_type<C: ConnectionTrait>(
    conn: &C,
    order_id: i32,
) -> AppResult<OrderType> {
    let order = orders::Entity::find_by_id(order_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    let prices: Vec<i64> = order_items::Entity::find()
        .select_only()
        .column(order_items::Column::PriceCents)
        .filter(order_items::Column::OrderId.eq(order_id))
        .into_tuple()
        .all(conn)
        .await?;

    let order_type = OrderType::classify(prices);
    if order_type != order.order_type {
        let mut am = order.into_active_model();
        am.order_type = Set(order_type);
        am.update(conn).await?;
    }
    Ok(order_type)
}

async fn write_order(
    txn: &DatabaseTransaction,
    user_id: i32,
    status: OrderStatus,
    request: &CreateOrderRequest,
    items: Vec<ValidatedItem>,
    images: &[Option<String>],
) -> AppResult<i32> {
    let order = orders::ActiveModel {
        user_id: Set(Some(user_id)),
        address: Set(json_object_text(&request.address)),
        shipping: Set(json_object_text(&request.shipping)),
        status: Set(status),
        order_type: Set(OrderType::Normal),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    for (item, image) in items.into_iter().zip(images.iter().cloned()) {
        insert_item(txn, order.id, item, image).await?;
    }

    recompute_order_type(txn, order.id).await?;

    for payment in &request.payment {
        payments::ActiveModel {
            order_id: Set(order.id),
            method: Set(payment
                .method
                .clone()
                .unwrap_or_else(|| "Unknown".to_string())),
            status: Set(payment
                .status
                .clone()
                .unwrap_or_else(|| "Pending".to_string())),
            ..Default::default()
        }
        .insert(txn)
        .await?;
    }

    Ok(order.id)
}

async fn insert_item<C: ConnectionTrait>(
    conn: &C,
    order_id: i32,
    item: ValidatedItem,
    image: Option<String>,
) -> AppResult<order_items::Model> {
    let model = order_items::ActiveModel {
        order_id: Set(order_id),
        name: Set(item.name),
        price_cents: Set(item.price_cents),
        quantity: Set(item.quantity),
        points: Set(item.points),
        variants: Set(item.variants),
        image: Set(image),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    Ok(model)
}

async fn points_for<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    order_type: OrderType,
) -> AppResult<i64> {
    let delivered_orders = orders::Entity::find()
        .select_only()
        .column(orders::Column::Id)
        .filter(orders::Column::UserId.eq(user_id))
        .filter(orders::Column::Status.eq(OrderStatus::Delivered))
        .filter(orders::Column::OrderType.eq(order_type))
        .into_query();

    let sum: Option<Option<i64>> = order_items::Entity::find()
        .select_only()
        .column_as(Expr::col(order_items::Column::Points).sum(), "total")
        .filter(order_items::Column::OrderId.in_subquery(delivered_orders))
        .into_tuple()
        .one(conn)
        .await?;

    Ok(sum.flatten().unwrap_or(0))
}

async fn total_points<C: ConnectionTrait>(conn: &C, user_id: i32) -> AppResult<i64> {
    let earned = points_for(conn, user_id, OrderType::Normal).await?;
    let spent = points_for(conn, user_id, OrderType::Redeem).await?;
    Ok(earned - spent)
}
