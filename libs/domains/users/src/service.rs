use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::error::{UserError, UserResult};
use crate::models::{CreateUser, Role, User, UserFilter, is_valid_email};
use crate::repository::UserRepository;

const MIN_PASSWORD_LEN: usize = 8;
const MAX_BLOCK_REASON_LEN: usize = 255;

/// Service layer for User business logic
#[derive(Clone)]
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Shared handle for domains that look users up.
    pub fn repository(&self) -> Arc<R> {
        self.repository.clone()
    }

    /// Register a new buyer account
    pub async fn register(&self, input: CreateUser) -> UserResult<User> {
        input
            .validate()
            .map_err(|e| UserError::Validation(e.to_string()))?;

        if self.repository.email_exists(&input.email).await? {
            return Err(UserError::DuplicateEmail(input.email.to_lowercase()));
        }

        let password_hash = hash_password(&input.password)?;
        let user = User::new(
            input.first_name,
            input.last_name,
            &input.email,
            input.phone_number,
            password_hash,
        );

        let created = self.repository.create(user).await?;
        tracing::info!(user_id = %created.id, "Registered user");
        Ok(created)
    }

    /// Check credentials. Unknown, deleted and blocked accounts all fail the same way.
    pub async fn authenticate(&self, email: &str, password: &str) -> UserResult<User> {
        let user = self
            .repository
            .get_by_email(email)
            .await?
            .ok_or(UserError::InvalidCredentials)?;

        if !user.can_login() {
            tracing::warn!(user_id = %user.id, "Login attempt on inactive account");
            return Err(UserError::InvalidCredentials);
        }

        if !verify_password(password, &user.password_hash)? {
            tracing::warn!(user_id = %user.id, "Login attempt with wrong password");
            return Err(UserError::InvalidCredentials);
        }

        Ok(user)
    }

    pub async fn get_user(&self, id: Uuid) -> UserResult<User> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(UserError::NotFound)
    }

    pub async fn get_user_by_email(&self, email: &str) -> UserResult<User> {
        ensure_email_format(email)?;
        self.repository
            .get_by_email(email)
            .await?
            .ok_or(UserError::NotFound)
    }

    pub async fn list_users(&self, filter: UserFilter) -> UserResult<Vec<User>> {
        self.repository.list(filter).await
    }

    /// Soft delete
    pub async fn delete_user(&self, id: Uuid) -> UserResult<User> {
        let mut user = self.get_user(id).await?;
        if user.deleted {
            return Err(UserError::Validation("User is already deleted".to_string()));
        }

        user.deleted = true;
        user.activated = false;
        user.touch();

        let updated = self.repository.update(user).await?;
        tracing::info!(user_id = %updated.id, "Deleted user");
        Ok(updated)
    }

    pub async fn restore_user(&self, email: &str) -> UserResult<User> {
        let mut user = self.get_user_by_email(email).await?;
        if !user.deleted {
            return Err(UserError::Validation("User is not deleted".to_string()));
        }

        user.deleted = false;
        user.activated = true;
        user.touch();

        let updated = self.repository.update(user).await?;
        tracing::info!(user_id = %updated.id, "Restored user");
        Ok(updated)
    }

    /// Returns the outcome message; blocking twice is not an error.
    pub async fn block_user(&self, email: &str, reason: &str) -> UserResult<String> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(UserError::Validation(
                "Block reason must not be empty".to_string(),
            ));
        }
        if reason.chars().count() > MAX_BLOCK_REASON_LEN {
            return Err(UserError::Validation(format!(
                "Block reason must not exceed {} characters",
                MAX_BLOCK_REASON_LEN
            )));
        }

        let mut user = self.existing_by_email(email).await?;
        if user.blocked {
            return Ok("User is already blocked.".to_string());
        }

        user.blocked = true;
        user.block_reason = Some(reason.to_string());
        user.touch();
        let user = self.repository.update(user).await?;

        tracing::info!(user_id = %user.id, "Blocked user");
        Ok("User blocked successfully.".to_string())
    }

    pub async fn unblock_user(&self, email: &str) -> UserResult<String> {
        let mut user = self.existing_by_email(email).await?;
        if !user.blocked {
            return Ok("User is not blocked.".to_string());
        }

        user.blocked = false;
        user.block_reason = None;
        user.touch();
        let user = self.repository.update(user).await?;

        tracing::info!(user_id = %user.id, "Unblocked user");
        Ok("User unblocked successfully.".to_string())
    }

    pub async fn update_password(&self, id: Uuid, password: &str) -> UserResult<()> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(UserError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let mut user = self.get_user(id).await?;
        user.password_hash = hash_password(password)?;
        user.touch();
        self.repository.update(user).await?;

        tracing::info!(user_id = %id, "Password updated");
        Ok(())
    }

    pub async fn get_user_roles(&self, email: &str) -> UserResult<Vec<Role>> {
        Ok(self.get_user_by_email(email).await?.roles)
    }

    pub async fn assign_role(&self, email: &str, role_name: &str) -> UserResult<User> {
        ensure_email_format(email)?;
        let role = parse_role(role_name)?;
        let mut user = self.existing_by_email(email).await?;

        if !user.grant(role) {
            return Err(UserError::Validation(format!("User already has role {}", role)));
        }

        let updated = self.repository.update(user).await?;
        tracing::info!(user_id = %updated.id, role = %role, "Role assigned");
        Ok(updated)
    }

    pub async fn remove_role(&self, email: &str, role_name: &str) -> UserResult<User> {
        ensure_email_format(email)?;
        let role = parse_role(role_name)?;
        if role == Role::Buyer {
            return Err(UserError::Validation("Cannot remove BUYER role".to_string()));
        }

        let mut user = self.existing_by_email(email).await?;
        if !user.revoke(role) {
            return Err(UserError::Validation(format!(
                "User does not have role {}",
                role
            )));
        }

        let updated = self.repository.update(user).await?;
        tracing::info!(user_id = %updated.id, role = %role, "Role removed");
        Ok(updated)
    }

    pub async fn assign_seller_role(&self, email: &str) -> UserResult<User> {
        self.assign_role(email, "SELLER").await
    }

    pub async fn remove_seller_role(&self, email: &str) -> UserResult<User> {
        self.remove_role(email, "SELLER").await
    }

    /// Idempotent
    pub async fn become_individual_seller(&self, user_id: Uuid) -> UserResult<User> {
        let mut user = self.get_user(user_id).await?;
        if !user.exists() {
            return Err(UserError::NotFound);
        }
        if !user.grant(Role::Seller) {
            return Ok(user);
        }

        let updated = self.repository.update(user).await?;
        tracing::info!(user_id = %updated.id, "User became an individual seller");
        Ok(updated)
    }

    async fn existing_by_email(&self, email: &str) -> UserResult<User> {
        self.repository
            .get_by_email(email)
            .await?
            .filter(User::exists)
            .ok_or(UserError::NotFound)
    }
}

fn ensure_email_format(email: &str) -> UserResult<()> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(UserError::Validation("Invalid email format".to_string()))
    }
}

fn parse_role(name: &str) -> UserResult<Role> {
    Role::from_str(name.trim()).map_err(|_| UserError::Validation(format!("Invalid role: {}", name)))
}

fn hash_password(password: &str) -> UserResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| UserError::PasswordHash(e.to_string()))
}

fn verify_password(password: &str, hash: &str) -> UserResult<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| UserError::PasswordHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
