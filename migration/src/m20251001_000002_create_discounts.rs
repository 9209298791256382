use sea_orm_migration::prelude::*;

use crate::m20251001_000001_create_catalog::{AppUsers, Products};

/// 优惠券
///
/// value_hundredths 以 1/100 为单位：百分比 12.5% -> 1250，固定金额 $5.00 -> 500
#[derive(DeriveIden)]
pub enum Discounts {
    Table,
    Id,
    Title,
    Code,
    DiscountType,
    ValueHundredths,
    Active,
    StartDate,
    EndDate,
    ApplyAllProducts,
    ApplyAllUsers,
    MaxUses,
    UsedCount,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum DiscountProducts {
    Table,
    DiscountId,
    ProductId,
}

#[derive(DeriveIden)]
enum DiscountUsers {
    Table,
    DiscountId,
    UserId,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Discounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Discounts::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Discounts::Title).string_len(50).not_null())
                    .col(ColumnDef::new(Discounts::Code).string_len(50).not_null())
                    .col(
                        ColumnDef::new(Discounts::DiscountType)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Discounts::ValueHundredths)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Discounts::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Discounts::StartDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Discounts::EndDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Discounts::ApplyAllProducts)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Discounts::ApplyAllUsers)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Discounts::MaxUses).integer().null()) // NULL = 不限次数
                    .col(
                        ColumnDef::new(Discounts::UsedCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Discounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Discounts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // 大小写不敏感的唯一性由服务层保证，这里仅保证精确唯一
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_discounts_code_unique")
                    .table(Discounts::Table)
                    .col(Discounts::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DiscountProducts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DiscountProducts::DiscountId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DiscountProducts::ProductId)
                            .integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .name("pk_discount_products")
                            .col(DiscountProducts::DiscountId)
                            .col(DiscountProducts::ProductId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_discount_products_discount")
                            .from(DiscountProducts::Table, DiscountProducts::DiscountId)
                            .to(Discounts::Table, Discounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_discount_products_product")
                            .from(DiscountProducts::Table, DiscountProducts::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DiscountUsers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DiscountUsers::DiscountId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DiscountUsers::UserId).integer().not_null())
                    .primary_key(
                        Index::create()
                            .name("pk_discount_users")
                            .col(DiscountUsers::DiscountId)
                            .col(DiscountUsers::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_discount_users_discount")
                            .from(DiscountUsers::Table, DiscountUsers::DiscountId)
                            .to(Discounts::Table, Discounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_discount_users_user")
                            .from(DiscountUsers::Table, DiscountUsers::UserId)
                            .to(AppUsers::Table, AppUsers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 删除顺序：关联表 -> 优惠券
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(DiscountUsers::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(DiscountProducts::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Discounts::Table).to_owned())
            .await?;
        Ok(())
    }
}
