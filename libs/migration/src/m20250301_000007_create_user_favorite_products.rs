use crate::m20250301_000001_create_users::Users;
use crate::m20250301_000005_create_products::Products;
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserFavoriteProducts::Table)
                    .if_not_exists()
                    .col(uuid(UserFavoriteProducts::UserId))
                    .col(uuid(UserFavoriteProducts::ProductId))
                    .col(
                        timestamp_with_time_zone(UserFavoriteProducts::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .col(UserFavoriteProducts::UserId)
                            .col(UserFavoriteProducts::ProductId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_favorite_products_user_id")
                            .from(UserFavoriteProducts::Table, UserFavoriteProducts::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_favorite_products_product_id")
                            .from(UserFavoriteProducts::Table, UserFavoriteProducts::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Reverse lookup when a product is deleted or counted
        manager
            .create_index(
                Index::create()
                    .name("idx_user_favorite_products_product_id")
                    .table(UserFavoriteProducts::Table)
                    .col(UserFavoriteProducts::ProductId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(UserFavoriteProducts::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum UserFavoriteProducts {
    Table,
    UserId,
    ProductId,
    CreatedAt,
}
