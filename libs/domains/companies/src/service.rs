use domain_products::ProductRepository;
use domain_users::{Role, User, UserRepository};
use imaging::{ImageProcessor, UploadedFile};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::error::{CompanyError, CompanyResult};
use crate::models::{
    AssignAdminRights, Company, CompanyAdminRights, CompanyFilter, RegisterCompany, UpdateCompany,
};
use crate::repository::CompanyRepository;

/// Which admin right an operation needs
#[derive(Debug, Clone, Copy)]
enum Right {
    Any,
    AddRemoveSellers,
    PromoteDemoteAdmins,
    DelegateAdminRights,
}

impl Right {
    fn granted_by(self, rights: &CompanyAdminRights) -> bool {
        rights.approved
            && match self {
                Right::Any => true,
                Right::AddRemoveSellers => rights.can_add_remove_sellers,
                Right::PromoteDemoteAdmins => rights.can_promote_demote_admins,
                Right::DelegateAdminRights => rights.can_delegate_admin_rights,
            }
    }
}

/// Company service
///
/// Company membership lives on the user (`company_id`); admin powers live in
/// [`CompanyAdminRights`] rows keyed by (company, user).
pub struct CompanyService<R: CompanyRepository> {
    repository: Arc<R>,
    users: Arc<dyn UserRepository>,
    products: Arc<dyn ProductRepository>,
    images: ImageProcessor,
}

impl<R: CompanyRepository> CompanyService<R> {
    pub fn new(
        repository: R,
        users: Arc<dyn UserRepository>,
        products: Arc<dyn ProductRepository>,
        images: ImageProcessor,
    ) -> Self {
        Self {
            repository: Arc::new(repository),
            users,
            products,
            images,
        }
    }

    /// Shared handle for the addresses domain.
    pub fn repository(&self) -> Arc<R> {
        self.repository.clone()
    }

    async fn load_user(&self, id: Uuid) -> CompanyResult<User> {
        self.users
            .get_by_id(id)
            .await?
            .filter(User::exists)
            .ok_or(CompanyError::UserNotFound)
    }

    async fn load_user_by_email(&self, email: &str) -> CompanyResult<User> {
        self.users
            .get_by_email(email)
            .await?
            .filter(User::exists)
            .ok_or(CompanyError::UserNotFound)
    }

    async fn active_company(&self, id: Uuid) -> CompanyResult<Company> {
        self.repository
            .get_by_id(id)
            .await?
            .filter(|c| !c.deleted)
            .ok_or(CompanyError::NotFound)
    }

    /// Checks that the caller is an admin seller of the company holding `right`.
    async fn require_right(
        &self,
        company_id: Uuid,
        caller_id: Uuid,
        right: Right,
    ) -> CompanyResult<User> {
        let caller = self.load_user(caller_id).await?;
        if !caller.has_role(Role::CompanyAdminSeller) {
            tracing::warn!(user_id = %caller_id, "Caller is not a company admin seller");
            return Err(CompanyError::Forbidden(
                "User lacks COMPANY_ADMIN_SELLER role".to_string(),
            ));
        }

        let rights = self
            .repository
            .get_rights(company_id, caller_id)
            .await?
            .ok_or_else(|| {
                CompanyError::Forbidden(format!("Admin has no rights for company: {}", company_id))
            })?;

        if !right.granted_by(&rights) {
            tracing::warn!(user_id = %caller_id, company_id = %company_id, ?right, "Admin right missing");
            return Err(CompanyError::Forbidden(
                "Admin lacks the required permission".to_string(),
            ));
        }
        Ok(caller)
    }

    /// Register a company, or return the live one with the same name
    #[instrument(skip(self, input), fields(company_name = %input.name))]
    pub async fn register_company(
        &self,
        input: RegisterCompany,
        caller_id: Uuid,
    ) -> CompanyResult<Company> {
        if input.name.trim().is_empty() {
            return Err(CompanyError::Validation(
                "Company name can not be null or empty.".to_string(),
            ));
        }
        input
            .validate()
            .map_err(|e| CompanyError::Validation(e.to_string()))?;

        if let Some(existing) = self.repository.get_by_name(&input.name).await? {
            if existing.deleted {
                return Err(CompanyError::Validation(
                    "Company was deleted, it must be revoked.".to_string(),
                ));
            }
            return Ok(existing);
        }

        let mut user = self.load_user(caller_id).await?;
        let company = self
            .repository
            .create(Company::new(input, user.id))
            .await?;

        self.repository
            .save_rights(CompanyAdminRights::full(company.id, user.id))
            .await?;

        user.company_id = Some(company.id);
        user.grant(Role::Seller);
        user.grant(Role::CompanyAdminSeller);
        user.touch();
        self.users.update(user).await?;

        tracing::info!(company_id = %company.id, admin_id = %caller_id, "Company registered");
        Ok(company)
    }

    pub async fn get_company(&self, id: Uuid) -> CompanyResult<Company> {
        self.active_company(id).await
    }

    pub async fn list_companies(&self, filter: CompanyFilter) -> CompanyResult<Vec<Company>> {
        self.repository.list(filter).await
    }

    #[instrument(skip(self, input))]
    pub async fn update_company(
        &self,
        id: Uuid,
        input: UpdateCompany,
        caller_id: Uuid,
    ) -> CompanyResult<Company> {
        input
            .validate()
            .map_err(|e| CompanyError::Validation(e.to_string()))?;

        let mut company = self.active_company(id).await?;
        self.require_right(id, caller_id, Right::Any).await?;

        if let Some(name) = &input.name {
            if let Some(other) = self.repository.get_by_name(name).await? {
                if other.id != id {
                    return Err(CompanyError::DuplicateName(name.trim().to_string()));
                }
            }
        }

        input.apply_to(&mut company);
        company.touch();
        self.repository.update(company).await
    }

    /// Approved admin rights of the company
    pub async fn get_company_admins(&self, id: Uuid) -> CompanyResult<Vec<CompanyAdminRights>> {
        self.active_company(id).await?;
        Ok(self
            .repository
            .list_rights(id)
            .await?
            .into_iter()
            .filter(|r| r.approved)
            .collect())
    }

    /// Make a seller of the company one of its admins
    #[instrument(skip(self, input), fields(target = %input.email))]
    pub async fn assign_admin_rights(
        &self,
        company_id: Uuid,
        caller_id: Uuid,
        input: AssignAdminRights,
    ) -> CompanyResult<CompanyAdminRights> {
        self.active_company(company_id).await?;
        self.require_right(company_id, caller_id, Right::PromoteDemoteAdmins)
            .await?;

        let mut target = self.load_user_by_email(&input.email).await?;
        if !target.has_role(Role::Seller) || target.company_id != Some(company_id) {
            return Err(CompanyError::Validation(
                "User is not a seller associated with the company".to_string(),
            ));
        }

        let rights = self
            .repository
            .save_rights(CompanyAdminRights {
                can_add_remove_sellers: input.can_add_remove_sellers,
                can_promote_demote_admins: input.can_promote_demote_admins,
                can_delegate_admin_rights: input.can_delegate_admin_rights,
                approved: input.approved,
                ..CompanyAdminRights::full(company_id, target.id)
            })
            .await?;

        if target.grant(Role::CompanyAdminSeller) {
            self.users.update(target).await?;
        }

        tracing::info!(company_id = %company_id, user_id = %rights.user_id, "Admin rights assigned");
        Ok(rights)
    }

    /// Approve or suspend an admin's rights
    #[instrument(skip(self))]
    pub async fn update_admin_rights(
        &self,
        company_id: Uuid,
        caller_id: Uuid,
        target_user_id: Uuid,
        approved: bool,
    ) -> CompanyResult<CompanyAdminRights> {
        self.active_company(company_id).await?;
        self.require_right(company_id, caller_id, Right::PromoteDemoteAdmins)
            .await?;

        let mut rights = self
            .repository
            .get_rights(company_id, target_user_id)
            .await?
            .ok_or(CompanyError::RightsNotFound)?;
        rights.approved = approved;

        let rights = self.repository.save_rights(rights).await?;
        tracing::info!(company_id = %company_id, user_id = %target_user_id, approved, "Admin rights updated");
        Ok(rights)
    }

    /// Attach a seller to the company
    #[instrument(skip(self))]
    pub async fn add_seller(
        &self,
        company_id: Uuid,
        seller_email: &str,
        caller_id: Uuid,
    ) -> CompanyResult<User> {
        let mut company = self.active_company(company_id).await?;
        self.require_right(company_id, caller_id, Right::AddRemoveSellers)
            .await?;

        let mut seller = self.load_user_by_email(seller_email).await?;
        if !seller.has_role(Role::Seller) {
            return Err(CompanyError::Validation("User is not a seller".to_string()));
        }
        if seller.company_id.is_some_and(|id| id != company_id) {
            return Err(CompanyError::Validation(
                "User already belongs to another company".to_string(),
            ));
        }

        seller.company_id = Some(company_id);
        seller.touch();
        let seller = self.users.update(seller).await?;

        if company.primary_admin_id.is_none() && seller.has_role(Role::CompanyAdminSeller) {
            company.primary_admin_id = Some(seller.id);
            company.touch();
            self.repository.update(company).await?;
        }

        tracing::info!(company_id = %company_id, seller_id = %seller.id, "Seller added to company");
        Ok(seller)
    }

    /// Detach a seller and drop their admin rights
    #[instrument(skip(self))]
    pub async fn remove_seller(
        &self,
        company_id: Uuid,
        seller_email: &str,
        caller_id: Uuid,
    ) -> CompanyResult<()> {
        let mut company = self.active_company(company_id).await?;
        self.require_right(company_id, caller_id, Right::AddRemoveSellers)
            .await?;

        let mut seller = self.load_user_by_email(seller_email).await?;
        if seller.company_id != Some(company_id) {
            return Err(CompanyError::Validation(
                "User is not a seller associated with the company".to_string(),
            ));
        }

        let is_primary = company.primary_admin_id == Some(seller.id);
        if is_primary {
            let admins = self
                .repository
                .list_rights(company_id)
                .await?
                .into_iter()
                .filter(|r| r.approved)
                .count();
            if admins <= 1 {
                return Err(CompanyError::Validation(
                    "Cannot remove the only COMPANY_ADMIN_SELLER".to_string(),
                ));
            }
        }

        seller.company_id = None;
        seller.revoke(Role::CompanyAdminSeller);
        seller.touch();
        let seller_id = seller.id;
        self.users.update(seller).await?;
        self.repository.delete_rights(company_id, seller_id).await?;

        if is_primary {
            company.primary_admin_id = None;
            company.touch();
            self.repository.update(company).await?;
        }

        tracing::info!(company_id = %company_id, seller_id = %seller_id, "Seller removed from company");
        Ok(())
    }

    /// Soft delete; members, rights and products are detached
    #[instrument(skip(self))]
    pub async fn delete_company(&self, id: Uuid, caller_id: Uuid) -> CompanyResult<()> {
        let mut company = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or(CompanyError::NotFound)?;
        if company.deleted {
            return Err(CompanyError::Validation(
                "Company is already deleted".to_string(),
            ));
        }
        self.require_right(id, caller_id, Right::DelegateAdminRights)
            .await?;

        let members = self.users.list_by_company(id).await?;
        let member_count = members.len();
        for mut member in members {
            member.company_id = None;
            member.revoke(Role::CompanyAdminSeller);
            member.touch();
            self.users.update(member).await?;
        }

        let rights_removed = self.repository.delete_company_rights(id).await?;
        let products_detached = self.products.detach_company(id).await?;

        company.deleted = true;
        company.deleted_by = Some(caller_id);
        company.primary_admin_id = None;
        company.touch();
        self.repository.update(company).await?;

        tracing::info!(
            company_id = %id,
            members = member_count,
            rights_removed,
            products_detached,
            "Company deleted"
        );
        Ok(())
    }

    /// Undo a soft delete (APP_ADMIN)
    #[instrument(skip(self))]
    pub async fn restore_company(&self, id: Uuid, caller_id: Uuid) -> CompanyResult<Company> {
        let caller = self.load_user(caller_id).await?;
        if !caller.has_role(Role::AppAdmin) {
            return Err(CompanyError::Forbidden("Admin access required".to_string()));
        }

        let mut company = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or(CompanyError::NotFound)?;
        if !company.deleted {
            return Err(CompanyError::Validation("Company is not deleted".to_string()));
        }

        company.deleted = false;
        company.deleted_by = None;
        company.touch();
        let company = self.repository.update(company).await?;

        tracing::info!(company_id = %id, "Company restored");
        Ok(company)
    }

    /// Store a resized logo; any approved admin may upload
    #[instrument(skip(self, file))]
    pub async fn upload_logo(
        &self,
        id: Uuid,
        caller_id: Uuid,
        file: UploadedFile,
    ) -> CompanyResult<Company> {
        let mut company = self.active_company(id).await?;
        self.require_right(id, caller_id, Right::Any).await?;

        let processed = self.images.process_without_thumbnail(file).await?;
        company.logo_content = Some(processed.content);
        company.logo_content_type = Some(processed.content_type);
        company.logo_file_extension = Some(processed.file_extension);
        company.logo_url = Some(format!("/companies/{}/logo", id));
        company.touch();

        self.repository.update(company).await
    }

    /// Content type and bytes of the logo
    pub async fn get_logo(&self, id: Uuid) -> CompanyResult<(String, Vec<u8>)> {
        let company = self.active_company(id).await?;
        match (company.logo_content_type, company.logo_content) {
            (Some(content_type), Some(bytes)) if !bytes.is_empty() => Ok((content_type, bytes)),
            _ => Err(CompanyError::LogoNotFound),
        }
    }
}
