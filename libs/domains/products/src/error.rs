use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use domain_categories::CategoryError;
use domain_users::UserError;
use imaging::ImageError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("Product not found: {0}")]
    NotFound(Uuid),

    #[error("Image not found: {0}")]
    ImageNotFound(Uuid),

    #[error("User not found")]
    UserNotFound,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ProductResult<T> = Result<T, ProductError>;

/// Convert ProductError to AppError for standardized error responses
impl From<ProductError> for AppError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::NotFound(_)
            | ProductError::ImageNotFound(_)
            | ProductError::UserNotFound => AppError::NotFound(err.to_string()),
            ProductError::Validation(msg) => AppError::BadRequest(msg),
            ProductError::Forbidden(msg) => AppError::Forbidden(msg),
            ProductError::Image(e) if e.is_client_error() => AppError::BadRequest(e.to_string()),
            ProductError::Image(e) => AppError::InternalServerError(e.to_string()),
            ProductError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for ProductError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<sea_orm::DbErr> for ProductError {
    fn from(err: sea_orm::DbErr) -> Self {
        ProductError::Internal(format!("Database error: {}", err))
    }
}

impl From<UserError> for ProductError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound => ProductError::UserNotFound,
            other => ProductError::Internal(other.to_string()),
        }
    }
}

impl From<CategoryError> for ProductError {
    fn from(err: CategoryError) -> Self {
        ProductError::Internal(err.to_string())
    }
}
