use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Seller company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Company {
    pub id: Uuid,
    /// Unique, compared case-insensitively
    pub name: String,
    #[serde(skip)]
    pub logo_content: Option<Vec<u8>>,
    pub logo_content_type: Option<String>,
    pub logo_file_extension: Option<String>,
    /// Where the logo is served from, once uploaded
    pub logo_url: Option<String>,
    pub registration_number: Option<String>,
    pub vat_number: Option<String>,
    pub contact_email: Option<String>,
    pub primary_admin_id: Option<Uuid>,
    pub deleted: bool,
    /// Admin who soft deleted the company
    pub deleted_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Company {
    pub fn new(input: RegisterCompany, primary_admin_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: input.name.trim().to_string(),
            logo_content: None,
            logo_content_type: None,
            logo_file_extension: None,
            logo_url: None,
            registration_number: input.registration_number,
            vat_number: input.vat_number,
            contact_email: input.contact_email,
            primary_admin_id: Some(primary_admin_id),
            deleted: false,
            deleted_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// What a company admin seller may do inside one company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CompanyAdminRights {
    pub id: Uuid,
    pub company_id: Uuid,
    pub user_id: Uuid,
    pub can_add_remove_sellers: bool,
    pub can_promote_demote_admins: bool,
    pub can_delegate_admin_rights: bool,
    /// Rights only count once approved
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}

impl CompanyAdminRights {
    /// Every right, approved. Given to the registering user.
    pub fn full(company_id: Uuid, user_id: Uuid) -> Self {
        Self {
            id: Uuid::now_v7(),
            company_id,
            user_id,
            can_add_remove_sellers: true,
            can_promote_demote_admins: true,
            can_delegate_admin_rights: true,
            approved: true,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct RegisterCompany {
    #[validate(length(max = 255))]
    pub name: String,
    #[validate(length(max = 100))]
    pub registration_number: Option<String>,
    #[validate(length(max = 100))]
    pub vat_number: Option<String>,
    #[validate(email, length(max = 255))]
    pub contact_email: Option<String>,
}

/// Absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateCompany {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(max = 100))]
    pub registration_number: Option<String>,
    #[validate(length(max = 100))]
    pub vat_number: Option<String>,
    #[validate(email, length(max = 255))]
    pub contact_email: Option<String>,
}

impl UpdateCompany {
    pub fn apply_to(&self, company: &mut Company) {
        if let Some(name) = &self.name {
            company.name = name.trim().to_string();
        }
        if let Some(number) = &self.registration_number {
            company.registration_number = Some(number.clone());
        }
        if let Some(vat) = &self.vat_number {
            company.vat_number = Some(vat.clone());
        }
        if let Some(email) = &self.contact_email {
            company.contact_email = Some(email.clone());
        }
    }
}

/// Grant admin rights to a seller of the company
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct AssignAdminRights {
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    pub can_add_remove_sellers: bool,
    #[serde(default)]
    pub can_promote_demote_admins: bool,
    #[serde(default)]
    pub can_delegate_admin_rights: bool,
    #[serde(default = "default_approved")]
    pub approved: bool,
}

fn default_approved() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ApproveRightsRequest {
    pub approved: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct SellerRequest {
    #[validate(email)]
    pub email: String,
}

/// Query filters for listing companies. Deleted companies are never listed.
#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
pub struct CompanyFilter {
    /// Case-insensitive fragment of the name
    pub name: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

impl Default for CompanyFilter {
    fn default() -> Self {
        Self {
            name: None,
            limit: default_limit(),
            offset: 0,
        }
    }
}

impl CompanyFilter {
    pub fn matches(&self, company: &Company) -> bool {
        !company.deleted
            && self.name.as_deref().is_none_or(|needle| {
                company
                    .name
                    .to_lowercase()
                    .contains(&needle.trim().to_lowercase())
            })
    }
}

fn default_limit() -> usize {
    50
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(name: &str) -> RegisterCompany {
        RegisterCompany {
            name: name.to_string(),
            registration_number: None,
            vat_number: Some("FR123".into()),
            contact_email: Some("hello@acme.test".into()),
        }
    }

    #[test]
    fn test_new_company_trims_name_and_sets_admin() {
        let admin = Uuid::now_v7();
        let company = Company::new(register("  Acme  "), admin);
        assert_eq!(company.name, "Acme");
        assert_eq!(company.primary_admin_id, Some(admin));
        assert!(!company.deleted);
    }

    #[test]
    fn test_invalid_contact_email_fails_validation() {
        let mut input = register("Acme");
        input.contact_email = Some("not-an-email".into());
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_filter_hides_deleted() {
        let mut company = Company::new(register("Acme Tools"), Uuid::now_v7());
        let filter = CompanyFilter {
            name: Some("tools".into()),
            ..Default::default()
        };
        assert!(filter.matches(&company));

        company.deleted = true;
        assert!(!filter.matches(&company));
    }

    #[test]
    fn test_logo_bytes_are_not_serialized() {
        let mut company = Company::new(register("Acme"), Uuid::now_v7());
        company.logo_content = Some(vec![1, 2, 3]);
        let json = serde_json::to_value(&company).unwrap();
        assert!(json.get("logo_content").is_none());
    }
}
