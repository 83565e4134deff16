//! Users Domain
//!
//! Accounts, credentials, roles and the account status flags (blocked,
//! deleted) that the other shop domains consult before acting on a user.
//!
//! ```rust,no_run
//! use axum_helpers::{JwtAuth, JwtConfig};
//! use domain_users::{handlers, InMemoryUserRepository, UserService};
//!
//! # fn example(config: JwtConfig) {
//! let service = UserService::new(InMemoryUserRepository::new());
//! let router = handlers::router(service, JwtAuth::new(&config));
//! # }
//! ```

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

pub use error::{UserError, UserResult};
pub use models::{
    AuthResponse, BlockUserRequest, CreateUser, LoginRequest, MessageResponse, Role,
    RoleRequest, UpdatePasswordRequest, User, UserFilter, UserResponse, is_valid_email,
};
pub use postgres::PgUserRepository;
pub use repository::{InMemoryUserRepository, UserRepository};
pub use service::UserService;
