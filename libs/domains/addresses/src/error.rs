use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use domain_companies::CompanyError;
use domain_users::UserError;
use thiserror::Error;

use crate::models::AddressType;

#[derive(Debug, Error)]
pub enum AddressError {
    #[error("Address not found")]
    NotFound,

    #[error("No default {0} address found")]
    NoDefault(AddressType),

    #[error("User not found")]
    UserNotFound,

    #[error("Company not found")]
    CompanyNotFound,

    #[error("Another default {0} address was saved at the same time")]
    DefaultConflict(AddressType),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AddressResult<T> = Result<T, AddressError>;

impl From<AddressError> for AppError {
    fn from(err: AddressError) -> Self {
        match err {
            AddressError::NotFound
            | AddressError::NoDefault(_)
            | AddressError::UserNotFound
            | AddressError::CompanyNotFound => AppError::NotFound(err.to_string()),
            AddressError::DefaultConflict(_) => AppError::Conflict(err.to_string()),
            AddressError::Validation(msg) => AppError::BadRequest(msg),
            AddressError::Forbidden(msg) => AppError::Forbidden(msg),
            AddressError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for AddressError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<sea_orm::DbErr> for AddressError {
    fn from(err: sea_orm::DbErr) -> Self {
        AddressError::Internal(format!("Database error: {}", err))
    }
}

impl From<UserError> for AddressError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound => AddressError::UserNotFound,
            other => AddressError::Internal(other.to_string()),
        }
    }
}

impl From<CompanyError> for AddressError {
    fn from(err: CompanyError) -> Self {
        match err {
            CompanyError::NotFound => AddressError::CompanyNotFound,
            other => AddressError::Internal(other.to_string()),
        }
    }
}
