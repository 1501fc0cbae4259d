//! API error handling.
//!
//! Failures collapse to a small set of statuses: 401 without a session, 404
//! when a duplicated task is missing, 409 when a write would break a board
//! invariant and 500 for everything else, carrying the operation's generic
//! message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::infrastructure::RepositoryError;

// =============================================================================
// API Error
// =============================================================================

/// API error structure for JSON responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ApiError {
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

// =============================================================================
// API Error Response
// =============================================================================

/// API error response containing status code and error details.
#[derive(Debug, Clone)]
pub struct ApiErrorResponse {
    pub status: StatusCode,
    pub error: ApiError,
}

impl ApiErrorResponse {
    #[must_use]
    pub const fn new(status: StatusCode, error: ApiError) -> Self {
        Self { status, error }
    }

    /// 401 for requests without a known session.
    #[must_use]
    pub fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            ApiError::new("UNAUTHORIZED", "Unauthorized"),
        )
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", message))
    }

    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, ApiError::new("CONFLICT", message))
    }

    #[must_use]
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::new("INTERNAL_ERROR", message),
        )
    }

    /// Logs a failed repository call and converts it for the client.
    ///
    /// Invariant violations become 409 with the repository's explanation;
    /// every other failure becomes a 500 carrying only `message`.
    #[must_use]
    pub fn from_repository(error: &RepositoryError, message: &'static str) -> Self {
        tracing::error!(%error, "{}", message);
        match error {
            RepositoryError::InvariantViolation(detail) => Self::conflict(detail.clone()),
            RepositoryError::NotFound(_)
            | RepositoryError::AlreadyExists(_)
            | RepositoryError::DatabaseError(_)
            | RepositoryError::SerializationError(_) => Self::internal_error(message),
        }
    }

    /// Logs a rejected request body or path and converts it to a 500.
    #[must_use]
    pub fn from_rejection(rejection: &impl std::fmt::Display, message: &'static str) -> Self {
        tracing::error!(%rejection, "{}", message);
        Self::internal_error(message)
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

// =============================================================================
// Tests
// =============================================================================
