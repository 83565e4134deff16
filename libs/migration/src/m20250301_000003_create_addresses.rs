use crate::m20250301_000000_bootstrap::{drop_touch_trigger, touch_trigger};
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Owner is polymorphic (user or company), so no foreign key on owner_id.
        manager
            .create_table(
                Table::create()
                    .table(Addresses::Table)
                    .if_not_exists()
                    .col(pk_uuid(Addresses::Id))
                    .col(string_len(Addresses::OwnerKind, 16))
                    .col(uuid(Addresses::OwnerId))
                    .col(string_len(Addresses::Name, 100))
                    .col(string_len_null(Addresses::Email, 255))
                    .col(string_len_null(Addresses::PhoneNumber, 20))
                    .col(string_len(Addresses::AddressLine1, 255))
                    .col(string_len_null(Addresses::AddressLine2, 255))
                    .col(string_len(Addresses::City, 100))
                    .col(string_len_null(Addresses::State, 100))
                    .col(string_len(Addresses::PostalCode, 20))
                    .col(string_len(Addresses::Country, 100))
                    .col(string_len_null(Addresses::Reference, 255))
                    .col(string_len(Addresses::AddressType, 16))
                    .col(boolean(Addresses::IsDefault).default(false))
                    .col(
                        timestamp_with_time_zone(Addresses::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Addresses::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_addresses_owner")
                    .table(Addresses::Table)
                    .col(Addresses::OwnerKind)
                    .col(Addresses::OwnerId)
                    .to_owned(),
            )
            .await?;

        // At most one default per owner and address type.
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE UNIQUE INDEX uq_addresses_one_default
                    ON addresses (owner_kind, owner_id, address_type)
                    WHERE is_default
                "#,
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(&touch_trigger("addresses"))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(&drop_touch_trigger("addresses"))
            .await?;

        manager
            .drop_table(Table::drop().table(Addresses::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Addresses {
    Table,
    Id,
    OwnerKind,
    OwnerId,
    Name,
    Email,
    PhoneNumber,
    AddressLine1,
    AddressLine2,
    City,
    State,
    PostalCode,
    Country,
    Reference,
    AddressType,
    IsDefault,
    CreatedAt,
    UpdatedAt,
}
