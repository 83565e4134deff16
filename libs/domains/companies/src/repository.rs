use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{CompanyError, CompanyResult};
use crate::models::{Company, CompanyAdminRights, CompanyFilter};

/// Repository trait for companies and their admin rights
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompanyRepository: Send + Sync {
    /// Fails with `DuplicateName` on a taken name
    async fn create(&self, company: Company) -> CompanyResult<Company>;

    /// Includes soft-deleted companies
    async fn get_by_id(&self, id: Uuid) -> CompanyResult<Option<Company>>;

    /// Case-insensitive; includes soft-deleted companies
    async fn get_by_name(&self, name: &str) -> CompanyResult<Option<Company>>;

    /// Non-deleted companies by name
    async fn list(&self, filter: CompanyFilter) -> CompanyResult<Vec<Company>>;

    async fn update(&self, company: Company) -> CompanyResult<Company>;

    async fn get_rights(
        &self,
        company_id: Uuid,
        user_id: Uuid,
    ) -> CompanyResult<Option<CompanyAdminRights>>;

    async fn list_rights(&self, company_id: Uuid) -> CompanyResult<Vec<CompanyAdminRights>>;

    /// Insert, or replace the row for the same (company, user)
    async fn save_rights(&self, rights: CompanyAdminRights) -> CompanyResult<CompanyAdminRights>;

    async fn delete_rights(&self, company_id: Uuid, user_id: Uuid) -> CompanyResult<bool>;

    async fn delete_company_rights(&self, company_id: Uuid) -> CompanyResult<u64>;
}

/// In-memory implementation of CompanyRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryCompanyRepository {
    companies: Arc<RwLock<HashMap<Uuid, Company>>>,
    rights: Arc<RwLock<HashMap<(Uuid, Uuid), CompanyAdminRights>>>,
}

impl InMemoryCompanyRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CompanyRepository for InMemoryCompanyRepository {
    async fn create(&self, company: Company) -> CompanyResult<Company> {
        let mut companies = self.companies.write().await;

        if companies
            .values()
            .any(|c| c.name.eq_ignore_ascii_case(&company.name))
        {
            return Err(CompanyError::DuplicateName(company.name));
        }
        companies.insert(company.id, company.clone());

        tracing::info!(company_id = %company.id, name = %company.name, "Created company");
        Ok(company)
    }

    async fn get_by_id(&self, id: Uuid) -> CompanyResult<Option<Company>> {
        let companies = self.companies.read().await;
        Ok(companies.get(&id).cloned())
    }

    async fn get_by_name(&self, name: &str) -> CompanyResult<Option<Company>> {
        let companies = self.companies.read().await;
        let name = name.trim();
        Ok(companies
            .values()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn list(&self, filter: CompanyFilter) -> CompanyResult<Vec<Company>> {
        let companies = self.companies.read().await;

        let mut result: Vec<Company> = companies
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        result.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

        Ok(result
            .into_iter()
            .skip(filter.offset)
            .take(filter.limit)
            .collect())
    }

    async fn update(&self, company: Company) -> CompanyResult<Company> {
        let mut companies = self.companies.write().await;

        if !companies.contains_key(&company.id) {
            return Err(CompanyError::NotFound);
        }
        if companies
            .values()
            .any(|c| c.id != company.id && c.name.eq_ignore_ascii_case(&company.name))
        {
            return Err(CompanyError::DuplicateName(company.name));
        }
        companies.insert(company.id, company.clone());
        Ok(company)
    }

    async fn get_rights(
        &self,
        company_id: Uuid,
        user_id: Uuid,
    ) -> CompanyResult<Option<CompanyAdminRights>> {
        let rights = self.rights.read().await;
        Ok(rights.get(&(company_id, user_id)).cloned())
    }

    async fn list_rights(&self, company_id: Uuid) -> CompanyResult<Vec<CompanyAdminRights>> {
        let rights = self.rights.read().await;
        let mut result: Vec<CompanyAdminRights> = rights
            .values()
            .filter(|r| r.company_id == company_id)
            .cloned()
            .collect();
        result.sort_by_key(|r| r.created_at);
        Ok(result)
    }

    async fn save_rights(&self, rights: CompanyAdminRights) -> CompanyResult<CompanyAdminRights> {
        let mut all = self.rights.write().await;
        let key = (rights.company_id, rights.user_id);
        // Keep the original row id on replace
        let stored = match all.get(&key) {
            Some(existing) => CompanyAdminRights {
                id: existing.id,
                created_at: existing.created_at,
                ..rights
            },
            None => rights,
        };
        all.insert(key, stored.clone());
        Ok(stored)
    }

    async fn delete_rights(&self, company_id: Uuid, user_id: Uuid) -> CompanyResult<bool> {
        let mut rights = self.rights.write().await;
        Ok(rights.remove(&(company_id, user_id)).is_some())
    }

    async fn delete_company_rights(&self, company_id: Uuid) -> CompanyResult<u64> {
        let mut rights = self.rights.write().await;
        let before = rights.len();
        rights.retain(|(company, _), _| *company != company_id);
        Ok((before - rights.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RegisterCompany;

    fn company(name: &str) -> Company {
        Company::new(
            RegisterCompany {
                name: name.to_string(),
                registration_number: None,
                vat_number: None,
                contact_email: None,
            },
            Uuid::now_v7(),
        )
    }

    #[tokio::test]
    async fn test_duplicate_name_is_case_insensitive() {
        let repo = InMemoryCompanyRepository::new();
        repo.create(company("Acme")).await.unwrap();

        let result = repo.create(company("ACME")).await;
        assert!(matches!(result, Err(CompanyError::DuplicateName(_))));
        assert!(repo.get_by_name("acme").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_rename_to_taken_name_fails() {
        let repo = InMemoryCompanyRepository::new();
        repo.create(company("Acme")).await.unwrap();
        let mut other = repo.create(company("Globex")).await.unwrap();

        other.name = "acme".into();
        assert!(matches!(
            repo.update(other).await,
            Err(CompanyError::DuplicateName(_))
        ));
    }

    #[tokio::test]
    async fn test_save_rights_replaces_existing_row() {
        let repo = InMemoryCompanyRepository::new();
        let company_id = Uuid::now_v7();
        let user_id = Uuid::now_v7();

        let first = repo
            .save_rights(CompanyAdminRights::full(company_id, user_id))
            .await
            .unwrap();

        let mut replacement = CompanyAdminRights::full(company_id, user_id);
        replacement.approved = false;
        let second = repo.save_rights(replacement).await.unwrap();

        assert_eq!(first.id, second.id);
        assert!(!second.approved);
        assert_eq!(repo.list_rights(company_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_company_rights_counts_rows() {
        let repo = InMemoryCompanyRepository::new();
        let company_id = Uuid::now_v7();
        repo.save_rights(CompanyAdminRights::full(company_id, Uuid::now_v7()))
            .await
            .unwrap();
        repo.save_rights(CompanyAdminRights::full(company_id, Uuid::now_v7()))
            .await
            .unwrap();
        repo.save_rights(CompanyAdminRights::full(Uuid::now_v7(), Uuid::now_v7()))
            .await
            .unwrap();

        assert_eq!(repo.delete_company_rights(company_id).await.unwrap(), 2);
        assert!(repo.list_rights(company_id).await.unwrap().is_empty());
    }
}
