//! Shared application state.

use axum_helpers::JwtAuth;

/// Built once in `main`; cloning only copies handles.
#[derive(Clone)]
pub struct AppState {
    pub config: crate::config::Config,
    /// PostgreSQL connection pool
    pub db: database::postgres::DatabaseConnection,
    pub jwt_auth: JwtAuth,
}
