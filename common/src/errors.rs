//! Application error types shared by all services.
//!
//! Every error maps to an HTTP status and a stable error code so clients
//! can branch without parsing messages.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::response::ApiResponse;

/// Convenience alias used throughout the services.
pub type AppResult<T> = Result<T, AppError>;

/// Unified application error.
#[derive(Debug, Error)]
pub enum AppError {
    /// No principal attached to the request, or the header was malformed.
    #[error("missing or invalid principal")]
    Unauthorized,

    /// The principal is authenticated but not allowed to perform the action.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Request input failed validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// A referenced resource does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// A database command or query failed.
    #[error("database error: {0}")]
    Database(String),

    /// One of the snapshot reads failed; no partial snapshot is returned.
    #[error("stats aggregation failed: {0}")]
    Aggregation(String),

    /// Both the native dump and the JSON export failed.
    #[error("backup failed: {0}")]
    Backup(String),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_)
            | AppError::Aggregation(_)
            | AppError::Backup(_)
            | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable error code for client handling.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::PermissionDenied(_) => "PERMISSION_DENIED",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Aggregation(_) => "AGGREGATION_FAILURE",
            AppError::Backup(_) => "BACKUP_FAILURE",
            AppError::Config(_) => "CONFIG_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "request failed");
        } else {
            tracing::warn!(code = self.code(), error = %self, "request rejected");
        }
        (status, Json(ApiResponse::err(self.code(), self.to_string()))).into_response()
    }
}
