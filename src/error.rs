//! Domain error types for the triage board.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.
//! Every core operation returns `AppResult`, and the HTTP layer renders the
//! error through `ResponseError`.

use actix_web::{HttpResponse, ResponseError};
use sea_orm::{DbErr, SqlErr};
use std::fmt;

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A required field is missing or a value is malformed.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Resource not found
    #[error("{0} not found")]
    NotFound(String),

    /// A unique field already holds the submitted value.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Caller is not authenticated
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller is authenticated but lacks the required role
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The store rejected a commit; nothing from the operation was applied.
    #[error("Transaction failed: {0}")]
    Transaction(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Blob storage operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// A server-side fault outside the store (hashing, token signing)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable code used in error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::Transaction(_) => "TRANSACTION_FAILED",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Wrap a failed commit, keeping the store's message as the cause.
    pub fn transaction(context: &str, err: DbErr) -> Self {
        AppError::Transaction(format!("{}: {}", context, err))
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Transaction(_)
            | AppError::Database(_)
            | AppError::Storage(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::Database(err_str) => {
                tracing::error!("Database error: {}", err_str);
                "An internal database error occurred".to_string()
            }
            AppError::Transaction(cause) => {
                tracing::error!("Transaction rolled back: {}", cause);
                self.to_string()
            }
            AppError::Storage(cause) => {
                tracing::error!("Storage error: {}", cause);
                self.to_string()
            }
            AppError::Internal(cause) => {
                tracing::error!("Internal error: {}", cause);
                "An internal error occurred".to_string()
            }
            _ => self.to_string(),
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.code().to_string(),
            message,
        })
    }
}

/// Error response body matching OpenAPI schema.
#[derive(Debug, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

// Conversion implementations for common error types

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(format!("JSON parsing error: {}", err))
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                AppError::Conflict(unique_field_hint(&detail))
            }
            _ => AppError::Database(err.to_string()),
        }
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::Validation(format!("Invalid UUID: {}", err))
    }
}

/// Name the unique field a constraint message refers to, when recognisable.
fn unique_field_hint(detail: &str) -> String {
    let lower = detail.to_lowercase();
    let field = if lower.contains("tags") || lower.contains("tag_name") {
        "tag name"
    } else if lower.contains("username") {
        "username"
    } else if lower.contains("email") {
        "email"
    } else if lower.contains("test_case_ids") {
        "test_case_ids"
    } else {
        return format!("duplicate value ({})", detail);
    };
    format!("{} already exists", field)
}
