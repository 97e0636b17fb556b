/// Error types for civic-feed-service
///
/// Every variant maps to one HTTP status. Tenant isolation failures are
/// reported as 403 with a fixed message so callers cannot tell a foreign
/// item apart from any other forbidden one.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;
use tracing::error;

use crate::repository::StoreError;

/// Result type for civic-feed-service operations
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or malformed request input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Content item does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Resource already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Tenant id is well formed but unknown to the catalog
    #[error("Tenant not found")]
    TenantNotFound,

    /// Item belongs to another tenant than the caller's
    #[error("Access denied")]
    TenantIsolation,

    /// Persistence unavailable; the caller may retry
    #[error("Storage unavailable: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) | AppError::TenantNotFound => StatusCode::NOT_FOUND,
            AppError::TenantIsolation => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        HttpResponse::build(status).json(serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }))
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ItemNotFound(_) => AppError::NotFound("Content item not found".into()),
            StoreError::TenantMismatch { .. } => AppError::TenantIsolation,
            StoreError::DuplicateItem(_) => {
                AppError::Conflict("Content item already exists".into())
            }
            StoreError::UnknownTenant(_) => AppError::TenantNotFound,
            StoreError::Database(e) => {
                error!(error = %e, "Storage operation failed");
                AppError::Storage("please retry later".into())
            }
            StoreError::Unavailable(msg) => {
                error!(error = %msg, "Storage unavailable");
                AppError::Storage("please retry later".into())
            }
            StoreError::InvalidData(msg) => AppError::Internal(msg),
        }
    }
}
