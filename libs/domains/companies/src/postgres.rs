use async_trait::async_trait;
use database::{BaseRepository, name_contains};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    SqlErr,
};
use uuid::Uuid;

use crate::{
    entity::{admin_rights, company},
    error::{CompanyError, CompanyResult},
    models::{Company, CompanyAdminRights, CompanyFilter},
    repository::CompanyRepository,
};

#[derive(Clone)]
pub struct PgCompanyRepository {
    companies: BaseRepository<company::Entity>,
}

impl PgCompanyRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            companies: BaseRepository::new(db),
        }
    }

    fn db(&self) -> &DatabaseConnection {
        self.companies.db()
    }

    fn map_write_error(e: DbErr, name: &str) -> CompanyError {
        match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                CompanyError::DuplicateName(name.to_string())
            }
            _ => db_error(e),
        }
    }
}

fn db_error(e: DbErr) -> CompanyError {
    CompanyError::Internal(format!("Database error: {}", e))
}

#[async_trait]
impl CompanyRepository for PgCompanyRepository {
    async fn create(&self, company: Company) -> CompanyResult<Company> {
        let name = company.name.clone();
        let model = self
            .companies
            .insert(company::ActiveModel::from(company))
            .await
            .map_err(|e| Self::map_write_error(e, &name))?;

        tracing::info!(company_id = %model.id, "Created company");
        Ok(model.into())
    }

    async fn get_by_id(&self, id: Uuid) -> CompanyResult<Option<Company>> {
        let model = self.companies.find_by_id(id).await.map_err(db_error)?;
        Ok(model.map(Into::into))
    }

    async fn get_by_name(&self, name: &str) -> CompanyResult<Option<Company>> {
        let model = company::Entity::find()
            .filter(Expr::cust_with_values(
                "LOWER(name) = $1",
                [name.trim().to_lowercase()],
            ))
            .one(self.db())
            .await
            .map_err(db_error)?;

        Ok(model.map(Into::into))
    }

    async fn list(&self, filter: CompanyFilter) -> CompanyResult<Vec<Company>> {
        let mut query = company::Entity::find().filter(company::Column::Deleted.eq(false));

        if let Some(name) = filter.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            query = query.filter(name_contains(name));
        }

        let models = query
            .order_by_asc(company::Column::Name)
            .limit(filter.limit as u64)
            .offset(filter.offset as u64)
            .all(self.db())
            .await
            .map_err(db_error)?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn update(&self, company: Company) -> CompanyResult<Company> {
        let name = company.name.clone();
        let model = self
            .companies
            .update(company::ActiveModel::from(company))
            .await
            .map_err(|e| match e {
                DbErr::RecordNotUpdated => CompanyError::NotFound,
                other => Self::map_write_error(other, &name),
            })?;

        Ok(model.into())
    }

    async fn get_rights(
        &self,
        company_id: Uuid,
        user_id: Uuid,
    ) -> CompanyResult<Option<CompanyAdminRights>> {
        let model = admin_rights::Entity::find()
            .filter(admin_rights::Column::CompanyId.eq(company_id))
            .filter(admin_rights::Column::UserId.eq(user_id))
            .one(self.db())
            .await
            .map_err(db_error)?;

        Ok(model.map(Into::into))
    }

    async fn list_rights(&self, company_id: Uuid) -> CompanyResult<Vec<CompanyAdminRights>> {
        let models = admin_rights::Entity::find()
            .filter(admin_rights::Column::CompanyId.eq(company_id))
            .order_by_asc(admin_rights::Column::CreatedAt)
            .all(self.db())
            .await
            .map_err(db_error)?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn save_rights(&self, rights: CompanyAdminRights) -> CompanyResult<CompanyAdminRights> {
        let model = admin_rights::Entity::insert(admin_rights::ActiveModel::from(rights))
            .on_conflict(
                OnConflict::columns([
                    admin_rights::Column::CompanyId,
                    admin_rights::Column::UserId,
                ])
                .update_columns([
                    admin_rights::Column::CanAddRemoveSellers,
                    admin_rights::Column::CanPromoteDemoteAdmins,
                    admin_rights::Column::CanDelegateAdminRights,
                    admin_rights::Column::Approved,
                ])
                .to_owned(),
            )
            .exec_with_returning(self.db())
            .await
            .map_err(db_error)?;

        Ok(model.into())
    }

    async fn delete_rights(&self, company_id: Uuid, user_id: Uuid) -> CompanyResult<bool> {
        let result = admin_rights::Entity::delete_many()
            .filter(admin_rights::Column::CompanyId.eq(company_id))
            .filter(admin_rights::Column::UserId.eq(user_id))
            .exec(self.db())
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected > 0)
    }

    async fn delete_company_rights(&self, company_id: Uuid) -> CompanyResult<u64> {
        let result = admin_rights::Entity::delete_many()
            .filter(admin_rights::Column::CompanyId.eq(company_id))
            .exec(self.db())
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected)
    }
}
