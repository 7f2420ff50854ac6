//! Report error types.

use thiserror::Error;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Period name or its date parts are invalid.
    #[error("Invalid reporting period: {0}")]
    InvalidPeriod(String),

    /// A total left the supported decimal range.
    #[error("Report figure {0} is out of range")]
    Overflow(&'static str),
}

impl ReportError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidPeriod(_) => "INVALID_PERIOD",
            Self::Overflow(_) => "REPORT_OVERFLOW",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidPeriod(_) => 400,
            Self::Overflow(_) => 422,
        }
    }
}
