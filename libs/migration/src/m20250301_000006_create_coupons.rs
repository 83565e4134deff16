use crate::m20250301_000000_bootstrap::{drop_touch_trigger, touch_trigger};
use crate::m20250301_000001_create_users::Users;
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Coupons::Table)
                    .if_not_exists()
                    .col(pk_uuid(Coupons::Id))
                    .col(
                        ColumnDef::new(Coupons::Code)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(string_len_null(Coupons::Description, 500))
                    .col(string_len(Coupons::State, 16).default("INACTIVE"))
                    .col(string_len(Coupons::Category, 32))
                    .col(string_len(Coupons::Scope, 16))
                    .col(string_len(Coupons::CouponType, 16))
                    .col(ColumnDef::new(Coupons::MinimumOrderAmount).decimal_len(19, 2).null())
                    .col(integer_null(Coupons::MaxUses))
                    .col(integer_null(Coupons::MaxUsesPerUser))
                    .col(timestamp_with_time_zone(Coupons::StartFrom))
                    .col(timestamp_with_time_zone(Coupons::EndAt))
                    .col(ColumnDef::new(Coupons::DiscountPercentage).decimal_len(5, 2).null())
                    .col(ColumnDef::new(Coupons::DiscountFixedAmount).decimal_len(19, 2).null())
                    .col(uuid(Coupons::AuthorId))
                    .col(
                        timestamp_with_time_zone(Coupons::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Coupons::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_coupons_author_id")
                            .from(Coupons::Table, Coupons::AuthorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_coupons_author_id")
                    .table(Coupons::Table)
                    .col(Coupons::AuthorId)
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(&touch_trigger("coupons"))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(&drop_touch_trigger("coupons"))
            .await?;

        manager
            .drop_table(Table::drop().table(Coupons::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Coupons {
    Table,
    Id,
    Code,
    Description,
    State,
    Category,
    Scope,
    CouponType,
    MinimumOrderAmount,
    MaxUses,
    MaxUsesPerUser,
    StartFrom,
    EndAt,
    DiscountPercentage,
    DiscountFixedAmount,
    AuthorId,
    CreatedAt,
    UpdatedAt,
}
