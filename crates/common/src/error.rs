//! Error types for rendezvous-rs.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Client Errors ===
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Event not found: {0}")]
    EventNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    // === Domain Rejections (terminal, never retried) ===
    #[error("Registration closed: {0}")]
    RegistrationClosed(String),

    #[error("Already registered for event: {0}")]
    AlreadyRegistered(String),

    #[error("Not eligible: {0}")]
    NotEligible(String),

    #[error("Duplicate vote in category: {0}")]
    DuplicateVote(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    // === Contention (transient, caller may retry) ===
    #[error("Event is busy, retry later: {0}")]
    Busy(String),

    // === Server Errors ===
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            // 4xx Client Errors
            Self::NotFound(_) | Self::EventNotFound(_) | Self::UserNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) | Self::NotEligible(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) | Self::Validation(_) | Self::RegistrationClosed(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Conflict(_)
            | Self::AlreadyRegistered(_)
            | Self::DuplicateVote(_)
            | Self::InvalidState(_) => StatusCode::CONFLICT,

            // Transient contention
            Self::Busy(_) => StatusCode::SERVICE_UNAVAILABLE,

            // 5xx Server Errors
            Self::Database(_) | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::EventNotFound(_) => "EVENT_NOT_FOUND",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::RegistrationClosed(_) => "REGISTRATION_CLOSED",
            Self::AlreadyRegistered(_) => "ALREADY_REGISTERED",
            Self::NotEligible(_) => "NOT_ELIGIBLE",
            Self::DuplicateVote(_) => "DUPLICATE_VOTE",
            Self::InvalidState(_) => "INVALID_STATE",
            Self::Busy(_) => "BUSY",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the caller may retry the operation.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy(_))
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        // Log server errors
        if self.is_server_error() {
            tracing::error!(error = %self, code = code, "Server error occurred");
        } else {
            tracing::debug!(error = %self, code = code, "Client error occurred");
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.to_string(),
                "retryable": self.is_retryable(),
            }
        }));

        (status, body).into_response()
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejections_are_terminal() {
        assert!(!AppError::RegistrationClosed("deadline passed".into()).is_retryable());
        assert!(!AppError::AlreadyRegistered("ev1".into()).is_retryable());
        assert!(!AppError::NotEligible("age".into()).is_retryable());
    }

    #[test]
    fn test_busy_is_retryable() {
        let err = AppError::Busy("ev1".into());
        assert!(err.is_retryable());
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_state_violations_conflict() {
        assert_eq!(
            AppError::DuplicateVote("presentation_style".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::InvalidState("session closed".into()).status_code(),
            StatusCode::CONFLICT
        );
    }
}
