use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use strum::{Display, EnumIter, EnumString};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

static EMAIL_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9+_.-]+@[A-Za-z0-9.-]+$").unwrap());

/// Format check used by the email-addressed admin operations.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_FORMAT.is_match(email)
}

/// Shop roles. Names parse case-insensitively (`seller`, `SELLER`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Role {
    Buyer,
    Seller,
    CompanyAdminSeller,
    AppAdmin,
}

/// User account as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    /// Lowercased
    pub email: String,
    pub phone_number: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub roles: Vec<Role>,
    /// Company the user sells for
    pub company_id: Option<Uuid>,
    pub activated: bool,
    pub blocked: bool,
    pub block_reason: Option<String>,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// New activated buyer; `password_hash` must already be hashed.
    pub fn new(
        first_name: String,
        last_name: String,
        email: &str,
        phone_number: Option<String>,
        password_hash: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            first_name,
            last_name,
            email: email.trim().to_lowercase(),
            phone_number,
            password_hash,
            roles: vec![Role::Buyer],
            company_id: None,
            activated: true,
            blocked: false,
            block_reason: None,
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Adds `role` if missing; returns whether it was added.
    pub fn grant(&mut self, role: Role) -> bool {
        if self.has_role(role) {
            return false;
        }
        self.roles.push(role);
        self.touch();
        true
    }

    /// Removes `role` if held; returns whether it was removed.
    pub fn revoke(&mut self, role: Role) -> bool {
        let before = self.roles.len();
        self.roles.retain(|r| *r != role);
        let removed = self.roles.len() != before;
        if removed {
            self.touch();
        }
        removed
    }

    pub fn role_names(&self) -> Vec<String> {
        self.roles.iter().map(ToString::to_string).collect()
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Not deleted. Blocked users still exist for lookups.
    pub fn exists(&self) -> bool {
        !self.deleted
    }

    /// Allowed to sign in.
    pub fn can_login(&self) -> bool {
        self.activated && !self.deleted && !self.blocked
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// User as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub roles: Vec<Role>,
    pub company_id: Option<Uuid>,
    pub activated: bool,
    pub blocked: bool,
    pub block_reason: Option<String>,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            phone_number: user.phone_number,
            roles: user.roles,
            company_id: user.company_id,
            activated: user.activated,
            blocked: user.blocked,
            block_reason: user.block_reason,
            deleted: user.deleted,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Registration payload
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(length(min = 1, max = 50))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50))]
    pub last_name: String,
    #[validate(email, length(max = 255))]
    pub email: String,
    #[validate(length(max = 20))]
    pub phone_number: Option<String>,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 255))]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    /// Seconds until the token expires
    pub expires_in: i64,
    pub user: UserResponse,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct BlockUserRequest {
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct UpdatePasswordRequest {
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct RoleRequest {
    /// Role name, case-insensitive
    pub role: String,
}

/// Plain acknowledgement for state toggles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Query filters for listing users
#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
pub struct UserFilter {
    pub deleted: Option<bool>,
    pub blocked: Option<bool>,
    pub role: Option<Role>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

impl Default for UserFilter {
    fn default() -> Self {
        Self {
            deleted: None,
            blocked: None,
            role: None,
            limit: default_limit(),
            offset: 0,
        }
    }
}

impl UserFilter {
    pub fn matches(&self, user: &User) -> bool {
        self.deleted.is_none_or(|d| user.deleted == d)
            && self.blocked.is_none_or(|b| user.blocked == b)
            && self.role.is_none_or(|r| user.has_role(r))
    }
}

fn default_limit() -> usize {
    50
}
