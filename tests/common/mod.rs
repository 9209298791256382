#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use migration::{Migrator, MigratorTrait};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait, Set,
};
use std::sync::{Arc, Mutex};
use storefront_backend::config::MediaConfig;
use storefront_backend::entities::{
    DiscountType, app_user_entity, discount_entity, discount_product_entity, product_entity,
};
use storefront_backend::error::AppResult;
use storefront_backend::external::{CouponAnnouncement, CouponNotifier, MediaStore};
use storefront_backend::services::{CatalogService, DiscountService, OrderService};
use storefront_backend::utils::to_cents;
use tempfile::TempDir;

/// 记录所有通知，便于断言
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, Vec<String>)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(String, Vec<String>)> {
        self.sent.lock().expect("notifier lock").clone()
    }
}

impl CouponNotifier for RecordingNotifier {
    fn announce(&self, coupon: &CouponAnnouncement, recipients: &[String]) -> AppResult<()> {
        self.sent
            .lock()
            .expect("notifier lock")
            .push((coupon.code.clone(), recipients.to_vec()));
        Ok(())
    }
}

/// 内存 SQLite + 临时媒体目录
pub struct TestContext {
    pub db: DatabaseConnection,
    pub media_dir: TempDir,
    pub media: MediaStore,
    pub notifier: Arc<RecordingNotifier>,
    pub discount_service: DiscountService,
    pub order_service: OrderService,
    pub catalog_service: CatalogService,
}

impl TestContext {
    pub async fn new() -> Self {
        let db = setup_db().await;
        let media_dir = tempfile::tempdir().expect("media tempdir");
        let media = MediaStore::new(&MediaConfig {
            root: media_dir.path().to_string_lossy().into_owned(),
            download_timeout_secs: 2,
        })
        .expect("media store");
        let notifier = Arc::new(RecordingNotifier::default());

        Self {
            discount_service: DiscountService::new(db.clone(), notifier.clone()),
            order_service: OrderService::new(db.clone(), media.clone()),
            catalog_service: CatalogService::new(db.clone()),
            db,
            media_dir,
            media,
            notifier,
        }
    }
}

/// 单连接，保证所有查询落在同一个内存库上
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("connect to sqlite memory database");
    Migrator::up(&db, None).await.expect("run migrations");
    db
}

pub async fn seed_user(db: &DatabaseConnection, number: &str, email: Option<&str>) -> i32 {
    app_user_entity::ActiveModel {
        number: Set(number.to_string()),
        name: Set(Some(format!("User {number}"))),
        email: Set(email.map(str::to_string)),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert user")
    .id
}

pub async fn seed_product(db: &DatabaseConnection, slug: &str, price: Decimal) -> i32 {
    product_entity::ActiveModel {
        name: Set(slug.replace('-', " ")),
        slug: Set(slug.to_string()),
        sku: Set(None),
        regular_price_cents: Set(to_cents(price)),
        sale_price_cents: Set(None),
        quantity: Set(10),
        points: Set(0),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert product")
    .id
}

pub struct CouponSeed<'a> {
    pub code: &'a str,
    pub discount_type: DiscountType,
    pub value: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub products: &'a [i32],
}

impl<'a> CouponSeed<'a> {
    /// 当前有效、适用全部商品
    pub fn active(code: &'a str, discount_type: DiscountType, value: Decimal) -> Self {
        let now = Utc::now();
        Self {
            code,
            discount_type,
            value,
            start_date: now - Duration::days(1),
            end_date: now + Duration::days(1),
            products: &[],
        }
    }
}

/// 直接写库，绕过创建接口的校验（用于构造历史数据）
pub async fn seed_coupon(db: &DatabaseConnection, seed: CouponSeed<'_>) -> i32 {
    let now = Utc::now();
    let coupon = discount_entity::ActiveModel {
        title: Set(format!("{} coupon", seed.code)),
        code: Set(seed.code.to_string()),
        discount_type: Set(seed.discount_type),
        value_hundredths: Set(to_cents(seed.value).expect("coupon value")),
        active: Set(true),
        start_date: Set(seed.start_date),
        end_date: Set(seed.end_date),
        apply_all_products: Set(seed.products.is_empty()),
        apply_all_users: Set(true),
        max_uses: Set(None),
        used_count: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert coupon");

    for product_id in seed.products {
        discount_product_entity::Entity::insert(discount_product_entity::ActiveModel {
            discount_id: Set(coupon.id),
            product_id: Set(*product_id),
        })
        .exec_without_returning(db)
        .await
        .expect("insert coupon product");
    }
    coupon.id
}
