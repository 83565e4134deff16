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
                    .table(Companies::Table)
                    .if_not_exists()
                    .col(pk_uuid(Companies::Id))
                    .col(
                        ColumnDef::new(Companies::Name)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Companies::LogoContent).binary().null())
                    .col(string_len_null(Companies::LogoContentType, 100))
                    .col(string_len_null(Companies::LogoFileExtension, 16))
                    .col(string_null(Companies::LogoUrl))
                    .col(string_len_null(Companies::RegistrationNumber, 100))
                    .col(string_len_null(Companies::VatNumber, 100))
                    .col(string_len_null(Companies::ContactEmail, 255))
                    .col(uuid_null(Companies::PrimaryAdminId))
                    .col(boolean(Companies::Deleted).default(false))
                    .col(uuid_null(Companies::DeletedBy))
                    .col(
                        timestamp_with_time_zone(Companies::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Companies::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_companies_primary_admin_id")
                            .from(Companies::Table, Companies::PrimaryAdminId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_foreign_key(
                ForeignKey::create()
                    .name("fk_users_company_id")
                    .from(Users::Table, Users::CompanyId)
                    .to(Companies::Table, Companies::Id)
                    .on_delete(ForeignKeyAction::SetNull)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CompanyAdminRights::Table)
                    .if_not_exists()
                    .col(pk_uuid(CompanyAdminRights::Id))
                    .col(uuid(CompanyAdminRights::CompanyId))
                    .col(uuid(CompanyAdminRights::UserId))
                    .col(boolean(CompanyAdminRights::CanAddRemoveSellers).default(false))
                    .col(boolean(CompanyAdminRights::CanPromoteDemoteAdmins).default(false))
                    .col(boolean(CompanyAdminRights::CanDelegateAdminRights).default(false))
                    .col(boolean(CompanyAdminRights::Approved).default(false))
                    .col(
                        timestamp_with_time_zone(CompanyAdminRights::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_company_admin_rights_company_id")
                            .from(CompanyAdminRights::Table, CompanyAdminRights::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_company_admin_rights_user_id")
                            .from(CompanyAdminRights::Table, CompanyAdminRights::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_company_admin_rights_company_user")
                    .table(CompanyAdminRights::Table)
                    .col(CompanyAdminRights::CompanyId)
                    .col(CompanyAdminRights::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(&touch_trigger("companies"))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CompanyAdminRights::Table).to_owned())
            .await?;

        manager
            .drop_foreign_key(
                ForeignKey::drop()
                    .name("fk_users_company_id")
                    .table(Users::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(&drop_touch_trigger("companies"))
            .await?;

        manager
            .drop_table(Table::drop().table(Companies::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
pub(crate) enum Companies {
    Table,
    Id,
    Name,
    LogoContent,
    LogoContentType,
    LogoFileExtension,
    LogoUrl,
    RegistrationNumber,
    VatNumber,
    ContactEmail,
    PrimaryAdminId,
    Deleted,
    DeletedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum CompanyAdminRights {
    Table,
    Id,
    CompanyId,
    UserId,
    CanAddRemoveSellers,
    CanPromoteDemoteAdmins,
    CanDelegateAdminRights,
    Approved,
    CreatedAt,
}
