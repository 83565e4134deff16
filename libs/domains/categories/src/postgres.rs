use async_trait::async_trait;
use database::{BaseRepository, name_contains};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    SqlErr,
};
use uuid::Uuid;

use crate::{
    entity,
    error::{CategoryError, CategoryResult},
    models::{Category, CategoryFilter},
    repository::CategoryRepository,
};

#[derive(Clone)]
pub struct PgCategoryRepository {
    base: BaseRepository<entity::Entity>,
}

impl PgCategoryRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    fn map_write_error(e: DbErr, name: &str) -> CategoryError {
        match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                CategoryError::DuplicateName(name.to_string())
            }
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => CategoryError::ParentNotFound,
            _ => CategoryError::Internal(format!("Database error: {}", e)),
        }
    }

    async fn all_where(&self, condition: Condition) -> CategoryResult<Vec<Category>> {
        let models = entity::Entity::find()
            .filter(condition)
            .order_by_asc(entity::Column::Name)
            .all(self.base.db())
            .await
            .map_err(|e| CategoryError::Internal(format!("Database error: {}", e)))?;

        Ok(models.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn create(&self, category: Category) -> CategoryResult<Category> {
        let name = category.name.clone();
        let model = self
            .base
            .insert(entity::ActiveModel::from(category))
            .await
            .map_err(|e| Self::map_write_error(e, &name))?;

        tracing::info!(category_id = %model.id, "Created category");
        Ok(model.into())
    }

    async fn get_by_id(&self, id: Uuid) -> CategoryResult<Option<Category>> {
        let model = self
            .base
            .find_by_id(id)
            .await
            .map_err(|e| CategoryError::Internal(format!("Database error: {}", e)))?;

        Ok(model.map(Into::into))
    }

    async fn get_by_name(&self, name: &str) -> CategoryResult<Option<Category>> {
        let model = entity::Entity::find()
            .filter(Expr::cust_with_values(
                "LOWER(name) = $1",
                [name.trim().to_lowercase()],
            ))
            .one(self.base.db())
            .await
            .map_err(|e| CategoryError::Internal(format!("Database error: {}", e)))?;

        Ok(model.map(Into::into))
    }

    async fn search_by_name(&self, fragment: &str) -> CategoryResult<Vec<Category>> {
        self.all_where(Condition::all().add(name_contains(fragment.trim())))
            .await
    }

    async fn list_all(&self) -> CategoryResult<Vec<Category>> {
        self.all_where(Condition::all()).await
    }

    async fn list(&self, filter: CategoryFilter) -> CategoryResult<Vec<Category>> {
        let models = entity::Entity::find()
            .order_by_asc(entity::Column::Name)
            .limit(filter.limit as u64)
            .offset(filter.offset as u64)
            .all(self.base.db())
            .await
            .map_err(|e| CategoryError::Internal(format!("Database error: {}", e)))?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn list_children(&self, parent_id: Uuid) -> CategoryResult<Vec<Category>> {
        let models = entity::Entity::find()
            .filter(entity::Column::ParentId.eq(parent_id))
            .order_by_asc(entity::Column::Name)
            .all(self.base.db())
            .await
            .map_err(|e| CategoryError::Internal(format!("Database error: {}", e)))?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn list_roots(&self) -> CategoryResult<Vec<Category>> {
        let models = entity::Entity::find()
            .filter(entity::Column::ParentId.is_null())
            .order_by_asc(entity::Column::Name)
            .all(self.base.db())
            .await
            .map_err(|e| CategoryError::Internal(format!("Database error: {}", e)))?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn list_leaves(&self) -> CategoryResult<Vec<Category>> {
        self.all_where(Condition::all().add(Expr::cust(
            "NOT EXISTS (SELECT 1 FROM categories child WHERE child.parent_id = categories.id)",
        )))
        .await
    }

    async fn update(&self, category: Category) -> CategoryResult<Category> {
        let name = category.name.clone();
        let model = self
            .base
            .update(entity::ActiveModel::from(category))
            .await
            .map_err(|e| match e {
                DbErr::RecordNotUpdated => CategoryError::NotFound,
                other => Self::map_write_error(other, &name),
            })?;

        Ok(model.into())
    }

    async fn delete(&self, id: Uuid) -> CategoryResult<bool> {
        let rows = self.base.delete_by_id(id).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => CategoryError::Validation(
                "Category is still referenced by products or subcategories".to_string(),
            ),
            _ => CategoryError::Internal(format!("Database error: {}", e)),
        })?;

        Ok(rows > 0)
    }

    async fn exists(&self, id: Uuid) -> CategoryResult<bool> {
        Ok(self.get_by_id(id).await?.is_some())
    }
}
