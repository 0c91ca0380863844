//! Application Error Types
//!
//! Centralized error taxonomy shared by every layer, with Axum integration.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A user, group or message is absent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed input, self-addressed message, disabled participant.
    #[error("Invalid request: {0}")]
    Invalid(String),

    /// Duplicate session registration or duplicate entity creation.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A store operation failed. Never retried here.
    #[error("Repository failure: {0}")]
    Repository(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Validation error")]
    Validation(Vec<FieldError>),
}

impl AppError {
    /// True for store failures, whichever backend produced them.
    pub fn is_repository_failure(&self) -> bool {
        matches!(
            self,
            AppError::Repository(_) | AppError::Database(_) | AppError::Redis(_)
        )
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

/// Field-level validation error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, errors) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, 10001, msg, None),
            AppError::Invalid(msg) => (StatusCode::BAD_REQUEST, 10002, msg, None),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, 10005, msg, None),
            AppError::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                10007,
                "Validation failed".to_string(),
                Some(fields),
            ),
            AppError::Repository(msg) => {
                tracing::error!("Repository failure: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    10008,
                    "Storage unavailable".to_string(),
                    None,
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    10008,
                    "Storage unavailable".to_string(),
                    None,
                )
            }
            AppError::Redis(e) => {
                tracing::error!("Redis error: {}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    10008,
                    "Storage unavailable".to_string(),
                    None,
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    10000,
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            code,
            message,
            errors,
        };

        (status, Json(body)).into_response()
    }
}
