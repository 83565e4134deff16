use async_trait::async_trait;
use database::BaseRepository;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    SqlErr,
};
use uuid::Uuid;

use crate::{
    entity,
    error::{CouponError, CouponResult},
    models::{Coupon, CouponState},
    repository::CouponRepository,
};

#[derive(Clone)]
pub struct PgCouponRepository {
    base: BaseRepository<entity::Entity>,
}

impl PgCouponRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    fn db(&self) -> &DatabaseConnection {
        self.base.db()
    }

    fn map_write_error(e: DbErr, code: &str) -> CouponError {
        match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                CouponError::Validation(format!("Coupon code already exists: {}", code))
            }
            _ => db_error(e),
        }
    }
}

fn db_error(e: DbErr) -> CouponError {
    CouponError::Internal(format!("Database error: {}", e))
}

fn to_coupon(model: entity::Model) -> CouponResult<Coupon> {
    Coupon::try_from(model).map_err(db_error)
}

#[async_trait]
impl CouponRepository for PgCouponRepository {
    async fn create(&self, coupon: Coupon) -> CouponResult<Coupon> {
        let code = coupon.code.clone();
        let model = self
            .base
            .insert(entity::ActiveModel::from(coupon))
            .await
            .map_err(|e| Self::map_write_error(e, &code))?;

        tracing::info!(coupon_id = %model.id, "Created coupon");
        to_coupon(model)
    }

    async fn get_by_id(&self, id: Uuid) -> CouponResult<Option<Coupon>> {
        let model = self.base.find_by_id(id).await.map_err(db_error)?;
        model.map(to_coupon).transpose()
    }

    async fn get_by_code(&self, code: &str) -> CouponResult<Option<Coupon>> {
        let model = entity::Entity::find()
            .filter(entity::Column::Code.eq(code))
            .one(self.db())
            .await
            .map_err(db_error)?;
        model.map(to_coupon).transpose()
    }

    async fn code_taken(&self, code: &str, exclude: Option<Uuid>) -> CouponResult<bool> {
        let mut query = entity::Entity::find().filter(entity::Column::Code.eq(code));
        if let Some(id) = exclude {
            query = query.filter(entity::Column::Id.ne(id));
        }
        let count = query.count(self.db()).await.map_err(db_error)?;
        Ok(count > 0)
    }

    async fn list_by_author(&self, author_id: Uuid) -> CouponResult<Vec<Coupon>> {
        let models = entity::Entity::find()
            .filter(entity::Column::AuthorId.eq(author_id))
            .filter(entity::Column::State.ne(CouponState::Deleted.to_string()))
            .order_by_desc(entity::Column::CreatedAt)
            .all(self.db())
            .await
            .map_err(db_error)?;

        models.into_iter().map(to_coupon).collect()
    }

    async fn update(&self, coupon: Coupon) -> CouponResult<Coupon> {
        let (id, code) = (coupon.id, coupon.code.clone());
        let model = self
            .base
            .update(entity::ActiveModel::from(coupon))
            .await
            .map_err(|e| match e {
                DbErr::RecordNotUpdated => CouponError::NotFound(id.to_string()),
                other => Self::map_write_error(other, &code),
            })?;

        to_coupon(model)
    }
}
