pub use sea_orm_migration::prelude::*;

mod m20251001_000001_create_catalog;
mod m20251001_000002_create_discounts;
mod m20251001_000003_create_orders;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251001_000001_create_catalog::Migration),
            Box::new(m20251001_000002_create_discounts::Migration),
            Box::new(m20251001_000003_create_orders::Migration),
        ]
    }
}
