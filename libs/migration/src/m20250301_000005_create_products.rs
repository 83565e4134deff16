use crate::m20250301_000000_bootstrap::{drop_touch_trigger, touch_trigger};
use crate::m20250301_000001_create_users::Users;
use crate::m20250301_000002_create_companies::Companies;
use crate::m20250301_000004_create_categories::Categories;
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

fn money(col: Products) -> ColumnDef {
    ColumnDef::new(col).decimal_len(19, 2).null().to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(pk_uuid(Products::Id))
                    .col(string_len(Products::Name, 255))
                    .col(string_len(Products::Status, 32))
                    .col(string_len(Products::SellType, 32))
                    .col(string_len(Products::Condition, 32))
                    .col(string_len_null(Products::ConditionComment, 500))
                    .col(
                        ColumnDef::new(Products::Price)
                            .decimal_len(19, 2)
                            .not_null(),
                    )
                    .col(money(Products::OfferPrice))
                    .col(money(Products::ShippingCost))
                    .col(money(Products::EachAdditionalItemShippingCost))
                    .col(integer(Products::Quantity).default(0))
                    .col(string_len_null(Products::InventoryLocation, 255))
                    .col(string_len_null(Products::Warranty, 255))
                    .col(string_len_null(Products::Brand, 100))
                    .col(string_len_null(Products::ProductCode, 100))
                    .col(string_len_null(Products::ManufacturingPieceNumber, 100))
                    .col(date_null(Products::ManufacturingDate))
                    .col(date_null(Products::ExpirationDate))
                    .col(string_len_null(Products::Ean, 32))
                    .col(string_len_null(Products::ManufacturingPlace, 255))
                    .col(uuid(Products::CategoryId))
                    .col(uuid_null(Products::CompanyId))
                    .col(uuid(Products::AuthorId))
                    .col(big_integer(Products::ViewCount).default(0))
                    .col(big_integer(Products::FavoriteCount).default(0))
                    .col(boolean(Products::Deleted).default(false))
                    .col(
                        timestamp_with_time_zone(Products::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Products::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_products_category_id")
                            .from(Products::Table, Products::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_products_company_id")
                            .from(Products::Table, Products::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_products_author_id")
                            .from(Products::Table, Products::AuthorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        for (name, col) in [
            ("idx_products_category_id", Products::CategoryId),
            ("idx_products_company_id", Products::CompanyId),
            ("idx_products_author_id", Products::AuthorId),
            ("idx_products_created_at", Products::CreatedAt),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(Products::Table)
                        .col(col)
                        .to_owned(),
                )
                .await?;
        }

        manager
            .create_table(
                Table::create()
                    .table(ProductImages::Table)
                    .if_not_exists()
                    .col(pk_uuid(ProductImages::Id))
                    .col(uuid(ProductImages::ProductId))
                    .col(string_len(ProductImages::FileName, 255))
                    .col(string_len(ProductImages::ContentType, 100))
                    .col(big_integer(ProductImages::FileSize))
                    .col(string_len(ProductImages::FileExtension, 16))
                    .col(ColumnDef::new(ProductImages::Content).binary().not_null())
                    .col(ColumnDef::new(ProductImages::Thumbnail).binary().null())
                    .col(boolean(ProductImages::IsPrimary).default(false))
                    .col(integer(ProductImages::DisplayOrder).default(0))
                    .col(
                        timestamp_with_time_zone(ProductImages::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_images_product_id")
                            .from(ProductImages::Table, ProductImages::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_product_images_product_id")
                    .table(ProductImages::Table)
                    .col(ProductImages::ProductId)
                    .col(ProductImages::DisplayOrder)
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(&touch_trigger("products"))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProductImages::Table).to_owned())
            .await?;

        manager
            .get_connection()
            .execute_unprepared(&drop_touch_trigger("products"))
            .await?;

        manager
            .drop_table(Table::drop().table(Products::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden, Clone, Copy)]
pub(crate) enum Products {
    Table,
    Id,
    Name,
    Status,
    SellType,
    Condition,
    ConditionComment,
    Price,
    OfferPrice,
    ShippingCost,
    EachAdditionalItemShippingCost,
    Quantity,
    InventoryLocation,
    Warranty,
    Brand,
    ProductCode,
    ManufacturingPieceNumber,
    ManufacturingDate,
    ExpirationDate,
    Ean,
    ManufacturingPlace,
    CategoryId,
    CompanyId,
    AuthorId,
    ViewCount,
    FavoriteCount,
    Deleted,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ProductImages {
    Table,
    Id,
    ProductId,
    FileName,
    ContentType,
    FileSize,
    FileExtension,
    Content,
    Thumbnail,
    IsPrimary,
    DisplayOrder,
    CreatedAt,
}
