use async_trait::async_trait;
use database::BaseRepository;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    SqlErr,
};
use uuid::Uuid;

use crate::{
    entity,
    error::{UserError, UserResult},
    models::{User, UserFilter},
    repository::UserRepository,
};

#[derive(Clone)]
pub struct PgUserRepository {
    base: BaseRepository<entity::Entity>,
}

impl PgUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    fn map_write_error(e: DbErr, email: &str) -> UserError {
        match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                UserError::DuplicateEmail(email.to_string())
            }
            _ => UserError::Internal(format!("Database error: {}", e)),
        }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: User) -> UserResult<User> {
        let email = user.email.clone();
        let model = self
            .base
            .insert(entity::ActiveModel::from(user))
            .await
            .map_err(|e| Self::map_write_error(e, &email))?;

        tracing::info!(user_id = %model.id, "Created user");
        Ok(model.into())
    }

    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        let model = self
            .base
            .find_by_id(id)
            .await
            .map_err(|e| UserError::Internal(format!("Database error: {}", e)))?;

        Ok(model.map(Into::into))
    }

    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let model = entity::Entity::find()
            .filter(entity::Column::Email.eq(email.trim().to_lowercase()))
            .one(self.base.db())
            .await
            .map_err(|e| UserError::Internal(format!("Database error: {}", e)))?;

        Ok(model.map(Into::into))
    }

    async fn list(&self, filter: UserFilter) -> UserResult<Vec<User>> {
        let mut query = entity::Entity::find();

        if let Some(deleted) = filter.deleted {
            query = query.filter(entity::Column::Deleted.eq(deleted));
        }
        if let Some(blocked) = filter.blocked {
            query = query.filter(entity::Column::Blocked.eq(blocked));
        }
        if let Some(role) = filter.role {
            query = query.filter(Expr::cust_with_values("$1 = ANY(roles)", [role.to_string()]));
        }

        let models = query
            .order_by_desc(entity::Column::CreatedAt)
            .limit(filter.limit as u64)
            .offset(filter.offset as u64)
            .all(self.base.db())
            .await
            .map_err(|e| UserError::Internal(format!("Database error: {}", e)))?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn list_by_company(&self, company_id: Uuid) -> UserResult<Vec<User>> {
        let models = entity::Entity::find()
            .filter(entity::Column::CompanyId.eq(company_id))
            .all(self.base.db())
            .await
            .map_err(|e| UserError::Internal(format!("Database error: {}", e)))?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn update(&self, user: User) -> UserResult<User> {
        let email = user.email.clone();
        let model = self
            .base
            .update(entity::ActiveModel::from(user))
            .await
            .map_err(|e| match e {
                DbErr::RecordNotUpdated => UserError::NotFound,
                other => Self::map_write_error(other, &email),
            })?;

        Ok(model.into())
    }

    async fn email_exists(&self, email: &str) -> UserResult<bool> {
        Ok(self.get_by_email(email).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn row(email: &str) -> entity::Model {
        entity::Model {
            id: Uuid::now_v7(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: email.into(),
            phone_number: None,
            password_hash: "hash".into(),
            roles: vec!["BUYER".into(), "SELLER".into(), "LEGACY".into()],
            company_id: None,
            activated: true,
            blocked: false,
            block_reason: None,
            deleted: false,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_get_by_email_maps_roles() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row("ada@shop.test")]])
            .into_connection();

        let repo = PgUserRepository::new(db);
        let user = repo.get_by_email("ADA@shop.test").await.unwrap().unwrap();

        assert_eq!(user.email, "ada@shop.test");
        assert_eq!(user.roles.len(), 2);
    }

    #[tokio::test]
    async fn test_database_failure_is_internal() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([DbErr::Custom("connection reset".into())])
            .into_connection();

        let repo = PgUserRepository::new(db);
        let result = repo.get_by_id(Uuid::now_v7()).await;
        assert!(matches!(result, Err(UserError::Internal(_))));
    }
}
