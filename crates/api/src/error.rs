//! API error responses.
//!
//! Every failure leaves the API as `{ "error": CODE, "message": text }`, with
//! a `fields` list added for validation errors.

use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use khata_core::ledger::LedgerError;
use khata_core::reports::ReportError;
use khata_core::storage::StorageError;
use khata_shared::{AppError, FieldIssue};
use serde::Serialize;
use tracing::error;

/// Error returned by every handler.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    fields: Vec<FieldIssue>,
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'static str,
    message: &'a str,
    #[serde(skip_serializing_if = "no_fields")]
    fields: &'a [FieldIssue],
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn no_fields(fields: &&[FieldIssue]) -> bool {
    fields.is_empty()
}

impl ApiError {
    fn new(status: u16, code: &'static str, message: String) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            code,
            message,
            fields: Vec::new(),
        }
    }

    /// Status code of the response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    /// Shortcut for a path or query target that does not exist.
    #[must_use]
    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into()).into()
    }

    /// Shortcut for a single rejected field.
    #[must_use]
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        AppError::invalid_field(field, message).into()
    }
}

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        let mut api = Self::new(e.status_code(), e.error_code(), e.to_string());
        api.fields = e.fields().to_vec();
        api
    }
}

/// Folds a ledger error into its application category.
fn categorize(e: LedgerError) -> AppError {
    let code = e.error_code();
    match e {
        LedgerError::Validation(errors) => AppError::Validation {
            message: errors.to_string(),
            fields: errors
                .errors()
                .iter()
                .map(|f| FieldIssue {
                    field: f.field.to_string(),
                    message: f.message.clone(),
                })
                .collect(),
        },
        LedgerError::NotFound(what) => AppError::NotFound(what),
        e @ LedgerError::PermissionDenied { .. } => AppError::Forbidden(e.to_string()),
        e @ (LedgerError::InsufficientFunds { .. }
        | LedgerError::DiscountExceedsOutstanding { .. }) => AppError::BusinessRule {
            code,
            message: e.to_string(),
        },
        e @ (LedgerError::InvalidChequeState { .. }
        | LedgerError::ReconciliationMismatch { .. }) => AppError::Conflict {
            code,
            message: e.to_string(),
        },
        LedgerError::Storage(message) => AppError::Internal(message),
    }
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        if let LedgerError::Storage(message) = &e {
            error!(error = %message, "ledger storage failure");
        }
        categorize(e).into()
    }
}

impl From<ReportError> for ApiError {
    fn from(e: ReportError) -> Self {
        let mut api = Self::new(e.http_status_code(), e.error_code(), e.to_string());
        if let ReportError::InvalidPeriod(_) = e {
            api.fields = vec![FieldIssue {
                field: "period".to_string(),
                message: e.to_string(),
            }];
        }
        api
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        if e.http_status_code() >= 500 {
            error!(error = %e, "proof storage failure");
        }
        Self::new(e.http_status_code(), e.error_code(), e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        AppError::invalid_field("body", e.body_text()).into()
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        AppError::invalid_field("query", e.body_text()).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.code,
            message: &self.message,
            fields: &self.fields,
        };
        (self.status, Json(body)).into_response()
    }
}

/// JSON body extractor whose rejections use the API error shape.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor whose rejections use the API error shape.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);
