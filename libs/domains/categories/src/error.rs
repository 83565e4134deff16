use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use imaging::ImageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CategoryError {
    #[error("Category not found.")]
    NotFound,

    #[error("Parent category not found")]
    ParentNotFound,

    #[error("Category image not found")]
    ImageNotFound,

    #[error("Category with name '{0}' already exists")]
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

pub type CategoryResult<T> = Result<T, CategoryError>;

impl From<CategoryError> for AppError {
    fn from(err: CategoryError) -> Self {
        match err {
            CategoryError::NotFound
            | CategoryError::ParentNotFound
            | CategoryError::ImageNotFound => AppError::NotFound(err.to_string()),
            CategoryError::DuplicateName(_) => AppError::Conflict(err.to_string()),
            CategoryError::Validation(msg) => AppError::BadRequest(msg),
            CategoryError::Forbidden(msg) => AppError::Forbidden(msg),
            CategoryError::Image(e) if e.is_client_error() => AppError::BadRequest(e.to_string()),
            CategoryError::Image(e) => AppError::InternalServerError(e.to_string()),
            CategoryError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for CategoryError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<sea_orm::DbErr> for CategoryError {
    fn from(err: sea_orm::DbErr) -> Self {
        CategoryError::Internal(format!("Database error: {}", err))
    }
}
