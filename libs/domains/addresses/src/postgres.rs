use async_trait::async_trait;
use database::BaseRepository;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, SqlErr, TransactionTrait,
};
use std::future::Future;
use uuid::Uuid;

use crate::{
    entity,
    error::{AddressError, AddressResult},
    models::{Address, AddressOwner, AddressType},
    repository::AddressRepository,
};

#[derive(Clone)]
pub struct PgAddressRepository {
    base: BaseRepository<entity::Entity>,
}

impl PgAddressRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    fn db(&self) -> &DatabaseConnection {
        self.base.db()
    }
}

fn db_error(e: DbErr) -> AddressError {
    tracing::error!(error = %e, "Address query failed");
    AddressError::Internal(format!("Database error: {}", e))
}

/// The partial unique index on `(owner, address_type) WHERE is_default`
/// rejected the write: a concurrent request committed its own default after
/// our unset ran.
fn write_error(e: DbErr, address_type: AddressType) -> AddressError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AddressError::DefaultConflict(address_type),
        _ => db_error(e),
    }
}

/// Runs a default-changing write, once more if it lost the race for the
/// default slot. The second attempt sees the committed rival and unsets it.
async fn retry_default_clash<T, F, Fut>(mut write: F) -> AddressResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AddressResult<T>>,
{
    match write().await {
        Err(AddressError::DefaultConflict(address_type)) => {
            tracing::warn!(%address_type, "Concurrent default address write, retrying");
            write().await
        }
        other => other,
    }
}

fn owned_by(owner: AddressOwner) -> Select<entity::Entity> {
    entity::Entity::find()
        .filter(entity::Column::OwnerKind.eq(owner.kind()))
        .filter(entity::Column::OwnerId.eq(owner.id()))
}

fn in_display_order(query: Select<entity::Entity>) -> Select<entity::Entity> {
    query
        .order_by_desc(entity::Column::IsDefault)
        .order_by_asc(entity::Column::CreatedAt)
}

fn to_addresses(models: Vec<entity::Model>) -> AddressResult<Vec<Address>> {
    models
        .into_iter()
        .map(|m| Address::try_from(m).map_err(db_error))
        .collect()
}

/// Clears `is_default` on every other address of the same owner and type.
async fn unset_defaults<C: ConnectionTrait>(
    conn: &C,
    owner: AddressOwner,
    address_type: AddressType,
    keep: Uuid,
) -> Result<u64, DbErr> {
    let result = entity::Entity::update_many()
        .col_expr(entity::Column::IsDefault, Expr::value(false))
        .filter(entity::Column::OwnerKind.eq(owner.kind()))
        .filter(entity::Column::OwnerId.eq(owner.id()))
        .filter(entity::Column::AddressType.eq(address_type.to_string()))
        .filter(entity::Column::IsDefault.eq(true))
        .filter(entity::Column::Id.ne(keep))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

impl PgAddressRepository {
    async fn insert_once(&self, address: Address) -> AddressResult<Address> {
        let address_type = address.address_type;
        let txn = self.db().begin().await.map_err(db_error)?;

        if address.is_default {
            unset_defaults(&txn, address.owner, address_type, address.id)
                .await
                .map_err(db_error)?;
        }
        let model = entity::ActiveModel::from(address)
            .insert(&txn)
            .await
            .map_err(|e| write_error(e, address_type))?;

        txn.commit()
            .await
            .map_err(|e| write_error(e, address_type))?;
        tracing::info!(address_id = %model.id, owner = %model.owner_kind, "Created address");
        Address::try_from(model).map_err(db_error)
    }

    async fn update_once(&self, address: Address) -> AddressResult<Address> {
        let owner = address.owner;
        let address_type = address.address_type;
        let txn = self.db().begin().await.map_err(db_error)?;

        if address.is_default {
            unset_defaults(&txn, owner, address_type, address.id)
                .await
                .map_err(db_error)?;
        }
        let model = async {
            entity::Entity::update(entity::ActiveModel::from(address))
                .validate()?
                .filter(entity::Column::OwnerKind.eq(owner.kind()))
                .filter(entity::Column::OwnerId.eq(owner.id()))
                .exec(&txn)
                .await
        }
        .await
        .map_err(|e| match e {
            DbErr::RecordNotUpdated => AddressError::NotFound,
            other => write_error(other, address_type),
        })?;

        txn.commit()
            .await
            .map_err(|e| write_error(e, address_type))?;
        Address::try_from(model).map_err(db_error)
    }

    async fn set_default_once(
        &self,
        owner: AddressOwner,
        id: Uuid,
    ) -> AddressResult<Option<Address>> {
        let txn = self.db().begin().await.map_err(db_error)?;

        let Some(model) = owned_by(owner)
            .filter(entity::Column::Id.eq(id))
            .one(&txn)
            .await
            .map_err(db_error)?
        else {
            return Ok(None);
        };

        let mut address = Address::try_from(model).map_err(db_error)?;
        let address_type = address.address_type;
        unset_defaults(&txn, owner, address_type, id)
            .await
            .map_err(db_error)?;

        address.is_default = true;
        address.updated_at = chrono::Utc::now();
        let model = entity::ActiveModel::from(address)
            .update(&txn)
            .await
            .map_err(|e| write_error(e, address_type))?;

        txn.commit()
            .await
            .map_err(|e| write_error(e, address_type))?;
        Address::try_from(model).map(Some).map_err(db_error)
    }
}

#[async_trait]
impl AddressRepository for PgAddressRepository {
    async fn insert(&self, address: Address) -> AddressResult<Address> {
        retry_default_clash(move || self.insert_once(address.clone())).await
    }

    async fn update(&self, address: Address) -> AddressResult<Address> {
        retry_default_clash(move || self.update_once(address.clone())).await
    }

    async fn get(&self, owner: AddressOwner, id: Uuid) -> AddressResult<Option<Address>> {
        let model = owned_by(owner)
            .filter(entity::Column::Id.eq(id))
            .one(self.db())
            .await
            .map_err(db_error)?;

        model.map(Address::try_from).transpose().map_err(db_error)
    }

    async fn list(&self, owner: AddressOwner) -> AddressResult<Vec<Address>> {
        let models = in_display_order(owned_by(owner))
            .all(self.db())
            .await
            .map_err(db_error)?;
        to_addresses(models)
    }

    async fn list_page(
        &self,
        owner: AddressOwner,
        offset: u64,
        limit: u64,
    ) -> AddressResult<Vec<Address>> {
        let models = in_display_order(owned_by(owner))
            .offset(offset)
            .limit(limit)
            .all(self.db())
            .await
            .map_err(db_error)?;
        to_addresses(models)
    }

    async fn list_by_type(
        &self,
        owner: AddressOwner,
        address_type: AddressType,
    ) -> AddressResult<Vec<Address>> {
        let models = in_display_order(
            owned_by(owner).filter(entity::Column::AddressType.eq(address_type.to_string())),
        )
        .all(self.db())
        .await
        .map_err(db_error)?;
        to_addresses(models)
    }

    async fn get_default(
        &self,
        owner: AddressOwner,
        address_type: AddressType,
    ) -> AddressResult<Option<Address>> {
        let model = owned_by(owner)
            .filter(entity::Column::AddressType.eq(address_type.to_string()))
            .filter(entity::Column::IsDefault.eq(true))
            .one(self.db())
            .await
            .map_err(db_error)?;

        model.map(Address::try_from).transpose().map_err(db_error)
    }

    async fn set_default(&self, owner: AddressOwner, id: Uuid) -> AddressResult<Option<Address>> {
        retry_default_clash(move || self.set_default_once(owner, id)).await
    }

    async fn delete(&self, owner: AddressOwner, id: Uuid) -> AddressResult<bool> {
        let result = entity::Entity::delete_many()
            .filter(entity::Column::OwnerKind.eq(owner.kind()))
            .filter(entity::Column::OwnerId.eq(owner.id()))
            .filter(entity::Column::Id.eq(id))
            .exec(self.db())
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected > 0)
    }

    async fn delete_all(&self, owner: AddressOwner) -> AddressResult<u64> {
        let result = entity::Entity::delete_many()
            .filter(entity::Column::OwnerKind.eq(owner.kind()))
            .filter(entity::Column::OwnerId.eq(owner.id()))
            .exec(self.db())
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected)
    }

    async fn count(&self, owner: AddressOwner) -> AddressResult<u64> {
        owned_by(owner).count(self.db()).await.map_err(db_error)
    }
}
