use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use domain_users::UserError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CouponError {
    /// Carries the id or the code that was looked up
    #[error("Coupon not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type CouponResult<T> = Result<T, CouponError>;

impl From<CouponError> for AppError {
    fn from(err: CouponError) -> Self {
        match err {
            CouponError::NotFound(_) => AppError::NotFound(err.to_string()),
            CouponError::Validation(msg) => AppError::BadRequest(msg),
            CouponError::Forbidden(msg) => AppError::Forbidden(msg),
            CouponError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for CouponError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<sea_orm::DbErr> for CouponError {
    fn from(err: sea_orm::DbErr) -> Self {
        CouponError::Internal(format!("Database error: {}", err))
    }
}

impl From<UserError> for CouponError {
    fn from(err: UserError) -> Self {
        CouponError::Internal(err.to_string())
    }
}
