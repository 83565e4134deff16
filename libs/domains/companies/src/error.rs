use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use domain_products::ProductError;
use domain_users::UserError;
use imaging::ImageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompanyError {
    #[error("Company not found")]
    NotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("Admin rights not found")]
    RightsNotFound,

    #[error("Company has no logo")]
    LogoNotFound,

    #[error("Company with name '{0}' already exists")]
    DuplicateName(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type CompanyResult<T> = Result<T, CompanyError>;

impl From<CompanyError> for AppError {
    fn from(err: CompanyError) -> Self {
        match err {
            CompanyError::NotFound
            | CompanyError::UserNotFound
            | CompanyError::RightsNotFound
            | CompanyError::LogoNotFound => AppError::NotFound(err.to_string()),
            CompanyError::DuplicateName(_) => AppError::Conflict(err.to_string()),
            CompanyError::Validation(msg) => AppError::BadRequest(msg),
            CompanyError::Forbidden(msg) => AppError::Forbidden(msg),
            CompanyError::Image(e) if e.is_client_error() => AppError::BadRequest(e.to_string()),
            CompanyError::Image(e) => AppError::InternalServerError(e.to_string()),
            CompanyError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for CompanyError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<sea_orm::DbErr> for CompanyError {
    fn from(err: sea_orm::DbErr) -> Self {
        CompanyError::Internal(format!("Database error: {}", err))
    }
}

impl From<UserError> for CompanyError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound => CompanyError::UserNotFound,
            other => CompanyError::Internal(other.to_string()),
        }
    }
}

impl From<ProductError> for CompanyError {
    fn from(err: ProductError) -> Self {
        CompanyError::Internal(err.to_string())
    }
}
