//! Application-wide error types.
//!
//! Domain crates keep their own error enums; the API layer folds them into
//! `AppError` so every response body has the same shape.

use serde::Serialize;
use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// A single rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    /// Field name as it appears in the request body.
    pub field: String,
    /// Human-readable reason.
    pub message: String,
}

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Caller role does not allow the action.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// One or more request fields are missing or malformed.
    #[error("Validation error: {message}")]
    Validation {
        /// Summary message.
        message: String,
        /// Offending fields.
        fields: Vec<FieldIssue>,
    },

    /// Business rule violation (insufficient funds, discount bounds).
    #[error("Business rule violation: {message}")]
    BusinessRule {
        /// Machine-readable code of the violated rule.
        code: &'static str,
        /// Human-readable reason.
        message: String,
    },

    /// Request conflicts with current state (cheque state, reconciliation).
    #[error("Conflict: {message}")]
    Conflict {
        /// Machine-readable code of the conflict.
        code: &'static str,
        /// Human-readable reason.
        message: String,
    },

    /// External service error (object storage).
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Creates a validation error for a single field.
    #[must_use]
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let field = field.into();
        let message = message.into();
        Self::Validation {
            message: format!("{field}: {message}"),
            fields: vec![FieldIssue { field, message }],
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Validation { .. } => 400,
            Self::BusinessRule { .. } => 422,
            Self::Conflict { .. } => 409,
            Self::ExternalService(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "PERMISSION_DENIED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::BusinessRule { code, .. } | Self::Conflict { code, .. } => code,
            Self::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the rejected fields, empty unless this is a validation error.
    #[must_use]
    pub fn fields(&self) -> &[FieldIssue] {
        match self {
            Self::Validation { fields, .. } => fields,
            _ => &[],
        }
    }
}
