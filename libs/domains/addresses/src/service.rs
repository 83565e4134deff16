use chrono::Utc;
use domain_companies::CompanyRepository;
use domain_users::{Role, User, UserRepository};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AddressError, AddressResult};
use crate::models::{Address, AddressOwner, AddressPage, AddressRequest, AddressType, PageRequest};
use crate::repository::AddressRepository;

/// Address book service for users and companies
///
/// A user owner may only be acted on by that user. A company owner may only
/// be acted on by a COMPANY_ADMIN_SELLER of that company.
pub struct AddressService<R: AddressRepository> {
    repository: Arc<R>,
    users: Arc<dyn UserRepository>,
    companies: Arc<dyn CompanyRepository>,
}

impl<R: AddressRepository> AddressService<R> {
    pub fn new(
        repository: R,
        users: Arc<dyn UserRepository>,
        companies: Arc<dyn CompanyRepository>,
    ) -> Self {
        Self {
            repository: Arc::new(repository),
            users,
            companies,
        }
    }

    async fn load_caller(&self, caller_id: Uuid) -> AddressResult<User> {
        self.users
            .get_by_id(caller_id)
            .await?
            .filter(User::exists)
            .ok_or(AddressError::UserNotFound)
    }

    /// Checks the owner exists and the caller may act on it.
    async fn authorize(&self, owner: AddressOwner, caller_id: Uuid) -> AddressResult<()> {
        match owner {
            AddressOwner::User(user_id) => {
                if user_id != caller_id {
                    tracing::warn!(owner_id = %user_id, caller_id = %caller_id, "Address access denied");
                    return Err(AddressError::Forbidden(
                        "Cannot access another user's addresses".to_string(),
                    ));
                }
                self.load_caller(caller_id).await?;
            }
            AddressOwner::Company(company_id) => {
                self.companies
                    .get_by_id(company_id)
                    .await?
                    .filter(|c| !c.deleted)
                    .ok_or(AddressError::CompanyNotFound)?;

                let caller = self.load_caller(caller_id).await?;
                if !caller.has_role(Role::CompanyAdminSeller)
                    || caller.company_id != Some(company_id)
                {
                    tracing::warn!(company_id = %company_id, caller_id = %caller_id, "Address access denied");
                    return Err(AddressError::Forbidden(
                        "Only admin sellers of the company can manage its addresses".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    #[instrument(skip(self, input))]
    pub async fn add(
        &self,
        owner: AddressOwner,
        input: AddressRequest,
        caller_id: Uuid,
    ) -> AddressResult<Address> {
        input
            .validate()
            .map_err(|e| AddressError::Validation(e.to_string()))?;
        self.authorize(owner, caller_id).await?;

        let address = self.repository.insert(Address::new(owner, input)).await?;
        tracing::info!(address_id = %address.id, default = address.is_default, "Address added");
        Ok(address)
    }

    /// Replace every field. A default address sent with `is_default = false` stops being default.
    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        owner: AddressOwner,
        id: Uuid,
        input: AddressRequest,
        caller_id: Uuid,
    ) -> AddressResult<Address> {
        input
            .validate()
            .map_err(|e| AddressError::Validation(e.to_string()))?;
        self.authorize(owner, caller_id).await?;

        let mut address = self
            .repository
            .get(owner, id)
            .await?
            .ok_or(AddressError::NotFound)?;
        input.apply_to(&mut address);
        address.updated_at = Utc::now();

        self.repository.update(address).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, owner: AddressOwner, id: Uuid, caller_id: Uuid) -> AddressResult<()> {
        self.authorize(owner, caller_id).await?;
        if !self.repository.delete(owner, id).await? {
            return Err(AddressError::NotFound);
        }
        tracing::info!(address_id = %id, "Address deleted");
        Ok(())
    }

    /// Number of addresses removed
    #[instrument(skip(self))]
    pub async fn delete_all(&self, owner: AddressOwner, caller_id: Uuid) -> AddressResult<u64> {
        self.authorize(owner, caller_id).await?;
        let deleted = self.repository.delete_all(owner).await?;
        tracing::info!(owner = owner.kind(), owner_id = %owner.id(), deleted, "Addresses deleted");
        Ok(deleted)
    }

    pub async fn get(&self, owner: AddressOwner, id: Uuid, caller_id: Uuid) -> AddressResult<Address> {
        self.authorize(owner, caller_id).await?;
        self.repository
            .get(owner, id)
            .await?
            .ok_or(AddressError::NotFound)
    }

    pub async fn list(&self, owner: AddressOwner, caller_id: Uuid) -> AddressResult<Vec<Address>> {
        self.authorize(owner, caller_id).await?;
        self.repository.list(owner).await
    }

    pub async fn list_paginated(
        &self,
        owner: AddressOwner,
        page: PageRequest,
        caller_id: Uuid,
    ) -> AddressResult<AddressPage> {
        page.validate()
            .map_err(|e| AddressError::Validation(e.to_string()))?;
        self.authorize(owner, caller_id).await?;

        let items = self
            .repository
            .list_page(owner, page.offset(), page.size)
            .await?;
        let total = self.repository.count(owner).await?;
        Ok(AddressPage {
            items,
            page: page.page,
            size: page.size,
            total,
        })
    }

    pub async fn list_by_type(
        &self,
        owner: AddressOwner,
        address_type: AddressType,
        caller_id: Uuid,
    ) -> AddressResult<Vec<Address>> {
        self.authorize(owner, caller_id).await?;
        self.repository.list_by_type(owner, address_type).await
    }

    pub async fn get_default(
        &self,
        owner: AddressOwner,
        address_type: AddressType,
        caller_id: Uuid,
    ) -> AddressResult<Address> {
        self.authorize(owner, caller_id).await?;
        self.repository
            .get_default(owner, address_type)
            .await?
            .ok_or(AddressError::NoDefault(address_type))
    }

    #[instrument(skip(self))]
    pub async fn set_default(
        &self,
        owner: AddressOwner,
        id: Uuid,
        caller_id: Uuid,
    ) -> AddressResult<Address> {
        self.authorize(owner, caller_id).await?;
        let address = self
            .repository
            .set_default(owner, id)
            .await?
            .ok_or(AddressError::NotFound)?;
        tracing::info!(address_id = %id, address_type = %address.address_type, "Default address changed");
        Ok(address)
    }

    pub async fn has_addresses(&self, owner: AddressOwner, caller_id: Uuid) -> AddressResult<bool> {
        Ok(self.count(owner, caller_id).await? > 0)
    }

    pub async fn has_default(
        &self,
        owner: AddressOwner,
        address_type: AddressType,
        caller_id: Uuid,
    ) -> AddressResult<bool> {
        self.authorize(owner, caller_id).await?;
        Ok(self
            .repository
            .get_default(owner, address_type)
            .await?
            .is_some())
    }

    pub async fn count(&self, owner: AddressOwner, caller_id: Uuid) -> AddressResult<u64> {
        self.authorize(owner, caller_id).await?;
        self.repository.count(owner).await
    }
}
