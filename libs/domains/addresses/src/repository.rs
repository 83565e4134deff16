use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AddressError, AddressResult};
use crate::models::{Address, AddressOwner, AddressType, display_order};

/// Repository trait for addresses. Every lookup is scoped to one owner.
///
/// Writes that leave an address as default must unset the other defaults of
/// the same (owner, type) in the same atomic step.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AddressRepository: Send + Sync {
    async fn insert(&self, address: Address) -> AddressResult<Address>;

    /// Fails with `NotFound` when the (id, owner) row is missing
    async fn update(&self, address: Address) -> AddressResult<Address>;

    async fn get(&self, owner: AddressOwner, id: Uuid) -> AddressResult<Option<Address>>;

    /// Default first, then oldest first
    async fn list(&self, owner: AddressOwner) -> AddressResult<Vec<Address>>;

    async fn list_page(
        &self,
        owner: AddressOwner,
        offset: u64,
        limit: u64,
    ) -> AddressResult<Vec<Address>>;

    async fn list_by_type(
        &self,
        owner: AddressOwner,
        address_type: AddressType,
    ) -> AddressResult<Vec<Address>>;

    async fn get_default(
        &self,
        owner: AddressOwner,
        address_type: AddressType,
    ) -> AddressResult<Option<Address>>;

    /// Make `id` the default of its type; `None` when the address is missing
    async fn set_default(&self, owner: AddressOwner, id: Uuid) -> AddressResult<Option<Address>>;

    async fn delete(&self, owner: AddressOwner, id: Uuid) -> AddressResult<bool>;

    async fn delete_all(&self, owner: AddressOwner) -> AddressResult<u64>;

    async fn count(&self, owner: AddressOwner) -> AddressResult<u64>;
}

/// In-memory implementation of AddressRepository (for development/testing)
///
/// One write lock covers the default swap.
#[derive(Debug, Default, Clone)]
pub struct InMemoryAddressRepository {
    addresses: Arc<RwLock<HashMap<Uuid, Address>>>,
}

impl InMemoryAddressRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn unset_defaults(
    addresses: &mut HashMap<Uuid, Address>,
    owner: AddressOwner,
    address_type: AddressType,
    keep: Uuid,
) {
    for other in addresses.values_mut() {
        if other.owner == owner
            && other.address_type == address_type
            && other.is_default
            && other.id != keep
        {
            other.is_default = false;
            other.updated_at = chrono::Utc::now();
        }
    }
}

fn owned(addresses: &HashMap<Uuid, Address>, owner: AddressOwner) -> Vec<Address> {
    let mut result: Vec<Address> = addresses
        .values()
        .filter(|a| a.owner == owner)
        .cloned()
        .collect();
    result.sort_by(display_order);
    result
}

#[async_trait]
impl AddressRepository for InMemoryAddressRepository {
    async fn insert(&self, address: Address) -> AddressResult<Address> {
        let mut addresses = self.addresses.write().await;

        if address.is_default {
            unset_defaults(&mut addresses, address.owner, address.address_type, address.id);
        }
        addresses.insert(address.id, address.clone());

        tracing::info!(address_id = %address.id, owner = address.owner.kind(), "Created address");
        Ok(address)
    }

    async fn update(&self, address: Address) -> AddressResult<Address> {
        let mut addresses = self.addresses.write().await;

        match addresses.get(&address.id) {
            Some(existing) if existing.owner == address.owner => {}
            _ => return Err(AddressError::NotFound),
        }
        if address.is_default {
            unset_defaults(&mut addresses, address.owner, address.address_type, address.id);
        }
        addresses.insert(address.id, address.clone());
        Ok(address)
    }

    async fn get(&self, owner: AddressOwner, id: Uuid) -> AddressResult<Option<Address>> {
        let addresses = self.addresses.read().await;
        Ok(addresses.get(&id).filter(|a| a.owner == owner).cloned())
    }

    async fn list(&self, owner: AddressOwner) -> AddressResult<Vec<Address>> {
        let addresses = self.addresses.read().await;
        Ok(owned(&addresses, owner))
    }

    async fn list_page(
        &self,
        owner: AddressOwner,
        offset: u64,
        limit: u64,
    ) -> AddressResult<Vec<Address>> {
        let addresses = self.addresses.read().await;
        Ok(owned(&addresses, owner)
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn list_by_type(
        &self,
        owner: AddressOwner,
        address_type: AddressType,
    ) -> AddressResult<Vec<Address>> {
        let addresses = self.addresses.read().await;
        Ok(owned(&addresses, owner)
            .into_iter()
            .filter(|a| a.address_type == address_type)
            .collect())
    }

    async fn get_default(
        &self,
        owner: AddressOwner,
        address_type: AddressType,
    ) -> AddressResult<Option<Address>> {
        let addresses = self.addresses.read().await;
        Ok(addresses
            .values()
            .find(|a| a.owner == owner && a.address_type == address_type && a.is_default)
            .cloned())
    }

    async fn set_default(&self, owner: AddressOwner, id: Uuid) -> AddressResult<Option<Address>> {
        let mut addresses = self.addresses.write().await;

        let address_type = match addresses.get(&id) {
            Some(address) if address.owner == owner => address.address_type,
            _ => return Ok(None),
        };
        unset_defaults(&mut addresses, owner, address_type, id);

        Ok(addresses.get_mut(&id).map(|address| {
            address.is_default = true;
            address.updated_at = chrono::Utc::now();
            address.clone()
        }))
    }

    async fn delete(&self, owner: AddressOwner, id: Uuid) -> AddressResult<bool> {
        let mut addresses = self.addresses.write().await;
        if addresses.get(&id).is_some_and(|a| a.owner == owner) {
            addresses.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }

    async fn delete_all(&self, owner: AddressOwner) -> AddressResult<u64> {
        let mut addresses = self.addresses.write().await;
        let before = addresses.len();
        addresses.retain(|_, a| a.owner != owner);
        Ok((before - addresses.len()) as u64)
    }

    async fn count(&self, owner: AddressOwner) -> AddressResult<u64> {
        let addresses = self.addresses.read().await;
        Ok(addresses.values().filter(|a| a.owner == owner).count() as u64)
    }
}
