//! Stateless JWT authentication.
//!
//! ```ignore
//! use axum_helpers::auth::{JwtAuth, JwtConfig, optional_jwt_auth_middleware};
//! use core_config::FromEnv;
//!
//! let auth = JwtAuth::new(&JwtConfig::from_env()?);
//!
//! let app = api_routes.layer(axum::middleware::from_fn_with_state(
//!     auth,
//!     optional_jwt_auth_middleware,
//! ));
//! ```
//!
//! Handlers that need a caller take [`CurrentUser`]. Without verified claims
//! on the request it rejects with 401.

pub mod config;
pub mod current_user;
pub mod jwt;
pub mod middleware;

pub use config::JwtConfig;
pub use current_user::CurrentUser;
pub use jwt::{JwtAuth, JwtClaims};
pub use middleware::{jwt_auth_middleware, optional_jwt_auth_middleware};
