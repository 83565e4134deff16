use async_trait::async_trait;
use database::{BaseRepository, name_contains};
use domain_categories::CategoryMetric;
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::{Expr, ExprTrait};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, JoinType, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    entity::{product, product_image, user_favorite},
    error::{ProductError, ProductResult},
    models::{Product, ProductFilter, ProductImage},
    repository::ProductRepository,
};

#[derive(Clone)]
pub struct PgProductRepository {
    products: BaseRepository<product::Entity>,
    images: BaseRepository<product_image::Entity>,
}

impl PgProductRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            products: BaseRepository::new(db.clone()),
            images: BaseRepository::new(db),
        }
    }

    fn db(&self) -> &DatabaseConnection {
        self.products.db()
    }
}

fn db_error(e: DbErr) -> ProductError {
    ProductError::Internal(format!("Database error: {}", e))
}

/// SQL aggregate for a metric; cast because SUM over BIGINT yields NUMERIC.
fn metric_sql(metric: CategoryMetric) -> &'static str {
    match metric {
        CategoryMetric::Favorites => "COALESCE(SUM(favorite_count), 0)::BIGINT",
        CategoryMetric::Views => "COALESCE(SUM(view_count), 0)::BIGINT",
        CategoryMetric::Quantity => "COALESCE(SUM(quantity), 0)::BIGINT",
        CategoryMetric::ProductCount => "COUNT(*)::BIGINT",
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn create(&self, product: Product) -> ProductResult<Product> {
        let model = self
            .products
            .insert(product::ActiveModel::from(product))
            .await
            .map_err(db_error)?;

        tracing::info!(product_id = %model.id, "Created product");
        Ok(model.into())
    }

    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>> {
        let model = self.products.find_by_id(id).await.map_err(db_error)?;
        Ok(model.map(Into::into))
    }

    async fn list(&self, filter: ProductFilter) -> ProductResult<Vec<Product>> {
        let mut query = product::Entity::find().filter(product::Column::Deleted.eq(false));

        if let Some(category_id) = filter.category_id {
            query = query.filter(product::Column::CategoryId.eq(category_id));
        }
        if let Some(author_id) = filter.author_id {
            query = query.filter(product::Column::AuthorId.eq(author_id));
        }
        if let Some(company_id) = filter.company_id {
            query = query.filter(product::Column::CompanyId.eq(company_id));
        }
        if let Some(name) = filter.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            query = query.filter(name_contains(name));
        }

        let models = query
            .order_by_desc(product::Column::CreatedAt)
            .limit(filter.limit as u64)
            .offset(filter.offset as u64)
            .all(self.db())
            .await
            .map_err(db_error)?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn update(&self, product: Product) -> ProductResult<Product> {
        let id = product.id;
        let model = self
            .products
            .update(product::ActiveModel::from(product))
            .await
            .map_err(|e| match e {
                DbErr::RecordNotUpdated => ProductError::NotFound(id),
                other => db_error(other),
            })?;

        Ok(model.into())
    }

    async fn increment_views(&self, id: Uuid) -> ProductResult<()> {
        product::Entity::update_many()
            .col_expr(
                product::Column::ViewCount,
                Expr::col(product::Column::ViewCount).add(1),
            )
            .filter(product::Column::Id.eq(id))
            .exec(self.db())
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn detach_company(&self, company_id: Uuid) -> ProductResult<u64> {
        let result = product::Entity::update_many()
            .col_expr(product::Column::CompanyId, Expr::value(Option::<Uuid>::None))
            .filter(product::Column::CompanyId.eq(company_id))
            .exec(self.db())
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected)
    }

    async fn category_totals(&self, metric: CategoryMetric) -> ProductResult<Vec<(Uuid, i64)>> {
        product::Entity::find()
            .select_only()
            .column(product::Column::CategoryId)
            .column_as(Expr::cust(metric_sql(metric)), "total")
            .filter(product::Column::Deleted.eq(false))
            .group_by(product::Column::CategoryId)
            .into_tuple::<(Uuid, i64)>()
            .all(self.db())
            .await
            .map_err(db_error)
    }

    async fn add_image(&self, image: ProductImage) -> ProductResult<ProductImage> {
        let model = self
            .images
            .insert(product_image::ActiveModel::from(image))
            .await
            .map_err(db_error)?;
        Ok(model.into())
    }

    async fn list_images(&self, product_id: Uuid) -> ProductResult<Vec<ProductImage>> {
        let models = product_image::Entity::find()
            .filter(product_image::Column::ProductId.eq(product_id))
            .order_by_asc(product_image::Column::DisplayOrder)
            .order_by_asc(product_image::Column::CreatedAt)
            .all(self.db())
            .await
            .map_err(db_error)?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn get_image(
        &self,
        product_id: Uuid,
        image_id: Uuid,
    ) -> ProductResult<Option<ProductImage>> {
        let model = product_image::Entity::find_by_id(image_id)
            .filter(product_image::Column::ProductId.eq(product_id))
            .one(self.db())
            .await
            .map_err(db_error)?;

        Ok(model.map(Into::into))
    }

    async fn update_image(&self, image: ProductImage) -> ProductResult<ProductImage> {
        let id = image.id;
        let model = self
            .images
            .update(product_image::ActiveModel::from(image))
            .await
            .map_err(|e| match e {
                DbErr::RecordNotUpdated => ProductError::ImageNotFound(id),
                other => db_error(other),
            })?;
        Ok(model.into())
    }

    async fn delete_image(&self, product_id: Uuid, image_id: Uuid) -> ProductResult<bool> {
        let result = product_image::Entity::delete_many()
            .filter(product_image::Column::Id.eq(image_id))
            .filter(product_image::Column::ProductId.eq(product_id))
            .exec(self.db())
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected > 0)
    }

    async fn delete_images(&self, product_id: Uuid) -> ProductResult<u64> {
        let result = product_image::Entity::delete_many()
            .filter(product_image::Column::ProductId.eq(product_id))
            .exec(self.db())
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected)
    }

    async fn clear_primary(&self, product_id: Uuid) -> ProductResult<()> {
        product_image::Entity::update_many()
            .col_expr(product_image::Column::IsPrimary, Expr::value(false))
            .filter(product_image::Column::ProductId.eq(product_id))
            .filter(product_image::Column::IsPrimary.eq(true))
            .exec(self.db())
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn toggle_favorite(&self, user_id: Uuid, product_id: Uuid) -> ProductResult<bool> {
        let txn = self.db().begin().await.map_err(db_error)?;

        let removed = user_favorite::Entity::delete_many()
            .filter(user_favorite::Column::UserId.eq(user_id))
            .filter(user_favorite::Column::ProductId.eq(product_id))
            .exec(&txn)
            .await
            .map_err(db_error)?
            .rows_affected
            > 0;

        if !removed {
            user_favorite::Entity::insert(user_favorite::ActiveModel {
                user_id: Set(user_id),
                product_id: Set(product_id),
                created_at: Set(chrono::Utc::now().into()),
            })
            .exec_without_returning(&txn)
            .await
            .map_err(db_error)?;
        }

        let delta: i64 = if removed { -1 } else { 1 };
        let updated = product::Entity::update_many()
            .col_expr(
                product::Column::FavoriteCount,
                Expr::col(product::Column::FavoriteCount).add(delta),
            )
            .filter(product::Column::Id.eq(product_id))
            .exec(&txn)
            .await
            .map_err(db_error)?;
        if updated.rows_affected == 0 {
            return Err(ProductError::NotFound(product_id));
        }

        txn.commit().await.map_err(db_error)?;
        tracing::debug!(%user_id, %product_id, favorited = !removed, "Toggled favorite");
        Ok(!removed)
    }

    async fn list_favorites(
        &self,
        user_id: Uuid,
        limit: usize,
        offset: usize,
    ) -> ProductResult<Vec<Product>> {
        let models = product::Entity::find()
            .join_rev(JoinType::InnerJoin, user_favorite::Relation::Product.def())
            .filter(user_favorite::Column::UserId.eq(user_id))
            .filter(product::Column::Deleted.eq(false))
            .order_by_desc(user_favorite::Column::CreatedAt)
            .limit(limit as u64)
            .offset(offset as u64)
            .all(self.db())
            .await
            .map_err(db_error)?;

        Ok(models.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn row() -> product::Model {
        product::Model {
            id: Uuid::now_v7(),
            name: "Kettle".into(),
            status: "OUT_OF_STOCK".into(),
            sell_type: "AUCTION".into(),
            condition: "UNKNOWN".into(),
            condition_comment: None,
            price: Decimal::new(2599, 2),
            offer_price: None,
            shipping_cost: None,
            each_additional_item_shipping_cost: None,
            quantity: 0,
            inventory_location: None,
            warranty: None,
            brand: None,
            product_code: None,
            manufacturing_piece_number: None,
            manufacturing_date: None,
            expiration_date: None,
            ean: None,
            manufacturing_place: None,
            category_id: Uuid::now_v7(),
            company_id: None,
            author_id: Uuid::now_v7(),
            view_count: 1,
            favorite_count: 0,
            deleted: false,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_get_by_id_maps_enum_columns() {
        use crate::models::{ProductCondition, ProductSellType, ProductStatus};

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row()]])
            .into_connection();

        let repo = PgProductRepository::new(db);
        let product = repo.get_by_id(Uuid::now_v7()).await.unwrap().unwrap();

        assert_eq!(product.status, ProductStatus::OutOfStock);
        assert_eq!(product.sell_type, ProductSellType::Auction);
        // Unknown names fall back to the default
        assert_eq!(product.condition, ProductCondition::New);
    }

    #[tokio::test]
    async fn test_detach_company_reports_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 4,
            }])
            .into_connection();

        let repo = PgProductRepository::new(db);
        assert_eq!(repo.detach_company(Uuid::now_v7()).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_name_filter_matches_wildcards_literally() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<product::Model>::new()])
            .into_connection();

        let repo = PgProductRepository::new(db.clone());
        let filter = ProductFilter {
            name: Some(" 50%_off ".into()),
            ..Default::default()
        };
        assert!(repo.list(filter).await.unwrap().is_empty());

        let log = db.into_transaction_log();
        let statement = &log[0].statements()[0];
        assert!(statement.sql.contains(r"name ILIKE $2 ESCAPE '\'"));
        let values = statement.values.as_ref().unwrap();
        assert!(values.0.contains(&sea_orm::Value::from(r"%50\%\_off%")));
    }

    #[tokio::test]
    async fn test_toggle_favorite_adds_when_absent() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([
                // delete: nothing to remove
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
                // insert
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                // favorite_count + 1
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();

        let repo = PgProductRepository::new(db.clone());
        assert!(
            repo.toggle_favorite(Uuid::now_v7(), Uuid::now_v7())
                .await
                .unwrap()
        );

        let log = db.into_transaction_log();
        let statements = log[0].statements();
        assert_eq!(statements.first().map(|s| s.sql.as_str()), Some("BEGIN"));
        assert!(statements[2].sql.starts_with(r#"INSERT INTO "user_favorite_products""#));
        assert!(statements[3].sql.contains(r#""favorite_count" + $1"#));
        assert_eq!(statements.last().map(|s| s.sql.as_str()), Some("COMMIT"));
    }

    #[tokio::test]
    async fn test_toggle_favorite_removes_when_present() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();

        let repo = PgProductRepository::new(db.clone());
        assert!(
            !repo
                .toggle_favorite(Uuid::now_v7(), Uuid::now_v7())
                .await
                .unwrap()
        );

        let log = db.into_transaction_log();
        let update = &log[0].statements()[2];
        assert!(update.sql.starts_with(r#"UPDATE "products""#));
        let values = update.values.as_ref().unwrap();
        assert!(values.0.contains(&sea_orm::Value::from(-1i64)));
    }

    #[tokio::test]
    async fn test_toggle_favorite_on_missing_product_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
            ])
            .into_connection();

        let repo = PgProductRepository::new(db);
        let product_id = Uuid::now_v7();
        assert!(matches!(
            repo.toggle_favorite(Uuid::now_v7(), product_id).await,
            Err(ProductError::NotFound(id)) if id == product_id
        ));
    }

    #[tokio::test]
    async fn test_list_favorites_joins_and_orders_by_favorite_time() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row()]])
            .into_connection();

        let repo = PgProductRepository::new(db.clone());
        let favorites = repo.list_favorites(Uuid::now_v7(), 20, 0).await.unwrap();
        assert_eq!(favorites.len(), 1);

        let log = db.into_transaction_log();
        let sql = &log[0].statements()[0].sql;
        assert!(sql.contains(r#"INNER JOIN "user_favorite_products""#));
        assert!(sql.contains(r#"ORDER BY "user_favorite_products"."created_at" DESC"#));
    }

    #[tokio::test]
    async fn test_database_failure_is_internal() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([DbErr::Custom("connection reset".into())])
            .into_connection();

        let repo = PgProductRepository::new(db);
        let result = repo.list(ProductFilter::default()).await;
        assert!(matches!(result, Err(ProductError::Internal(_))));
    }
}
