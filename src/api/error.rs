//! API Error Types
//!
//! Defines error types for the API layer and implements conversion
//! to HTTP responses with appropriate status codes.
//!
//! Expected outcomes (validation, duplicates, quota, in-flight requests)
//! keep their message. Unexpected failures are logged in full and answered
//! with a generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::assistant::AssistantError;
use crate::legal::LegalError;
use crate::storage::StorageError;

/// Message shown for contributor invitations that already exist
pub const ALREADY_INVITED: &str = "This person has already been invited";

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request conflicts with current state
    #[error("{0}")]
    Conflict(String),

    /// Record already exists
    #[error("{0}")]
    Duplicate(String),

    /// Upload would exceed the storage quota
    #[error("{0}")]
    QuotaExceeded(String),

    /// Assistant error
    #[error("Assistant error: {0}")]
    Assistant(#[from] AssistantError),

    /// Legal document error
    #[error("Document error: {0}")]
    Legal(#[from] LegalError),

    /// Storage layer error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Service unavailable (dependency down)
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    pub request_id: String,
}

/// Error details
#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ApiError {
    /// Status, stable code and the message returned to the client
    fn classify(&self) -> (StatusCode, &'static str, String) {
        use StatusCode as S;

        match self {
            ApiError::Validation(_) => (S::BAD_REQUEST, "VALIDATION_ERROR", self.to_string()),
            ApiError::NotFound(_) => (S::NOT_FOUND, "NOT_FOUND", self.to_string()),
            ApiError::Conflict(m) => (S::CONFLICT, "CONFLICT", m.clone()),
            ApiError::Duplicate(m) => (S::CONFLICT, "DUPLICATE", m.clone()),
            ApiError::QuotaExceeded(m) => (S::PAYLOAD_TOO_LARGE, "QUOTA_EXCEEDED", m.clone()),
            ApiError::Assistant(e) => match e {
                AssistantError::SessionNotFound(_) => (S::NOT_FOUND, "NOT_FOUND", e.to_string()),
                AssistantError::InvalidTransition { .. } => {
                    (S::CONFLICT, "CONFLICT", e.to_string())
                }
                AssistantError::EmptyMessage => {
                    (S::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
                }
                AssistantError::TooManySessions(_) => (
                    S::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    e.to_string(),
                ),
                _ => internal("The assistant is unavailable"),
            },
            ApiError::Legal(e) => match e {
                LegalError::UnknownRole { .. } => {
                    (S::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
                }
                _ => internal("Failed to generate document"),
            },
            ApiError::Storage(e) => match e {
                StorageError::Duplicate(_) => (S::CONFLICT, "DUPLICATE", e.to_string()),
                StorageError::InFlight(_) => (S::CONFLICT, "CONFLICT", e.to_string()),
                StorageError::QuotaExceeded { .. } => {
                    (S::PAYLOAD_TOO_LARGE, "QUOTA_EXCEEDED", e.to_string())
                }
                StorageError::NotFound(_) => (S::NOT_FOUND, "NOT_FOUND", e.to_string()),
                StorageError::SignedUrlExpired => (S::GONE, "EXPIRED", e.to_string()),
                StorageError::InvalidInput(_) => {
                    (S::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
                }
                _ => internal("A storage error occurred"),
            },
            ApiError::Internal(_) | ApiError::Io(_) => internal("An internal error occurred"),
            ApiError::ServiceUnavailable(_) => (
                S::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                self.to_string(),
            ),
        }
    }
}

fn internal(message: &str) -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        message.to_string(),
    )
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.classify();
        let request_id = uuid::Uuid::new_v4().to_string();

        // Log the error
        if status.is_server_error() {
            tracing::error!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "API error occurred"
            );
        } else {
            tracing::warn!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "API request rejected"
            );
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
            },
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
