//! Ledger error types.
//!
//! Every rejection carries a human-readable reason. Validation failures list
//! each offending field so callers can point at the exact input.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::account::AccountRef;

/// One rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Field name as used in request bodies.
    pub field: &'static str,
    /// Reason the value was rejected.
    pub message: String,
}

/// Non-empty list of field errors.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a rejected field.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    /// Whether nothing has been rejected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Whether the given field was rejected.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Returns the collected errors.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Converts the collector into a result.
    pub fn finish(self) -> Result<(), LedgerError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(LedgerError::Validation(self))
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

/// Errors that can occur during ledger, mutation and cheque operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Input Errors ==========
    /// One or more fields are missing or malformed.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// Referenced account, cheque or transaction does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller role may not perform the action.
    #[error("Role '{role}' may not {action}")]
    PermissionDenied {
        /// Attempted action.
        action: &'static str,
        /// Caller role.
        role: String,
    },

    // ========== Balance Errors ==========
    /// A bank or cash debit would drive the balance negative.
    #[error("Insufficient funds in {account}: available {available}, requested {requested}")]
    InsufficientFunds {
        /// Fund account being debited.
        account: AccountRef,
        /// Balance before the operation.
        available: Decimal,
        /// Net amount the operation would remove.
        requested: Decimal,
    },

    /// Discount larger than the outstanding balance, or nothing outstanding.
    #[error("Discount {requested} exceeds outstanding balance {outstanding}")]
    DiscountExceedsOutstanding {
        /// Outstanding balance in the business's favour.
        outstanding: Decimal,
        /// Requested discount.
        requested: Decimal,
    },

    // ========== State Errors ==========
    /// The cheque's current state does not allow the action.
    #[error("Cheque {cheque_id} is {state}; cannot {action}")]
    InvalidChequeState {
        /// Cheque identifier.
        cheque_id: String,
        /// Current state name.
        state: &'static str,
        /// Attempted action.
        action: &'static str,
    },

    /// Running balance does not match the stored balance.
    #[error("Ledger for {account} does not reconcile: stored {stored}, computed {computed}")]
    ReconciliationMismatch {
        /// Account whose ledger diverged.
        account: AccountRef,
        /// Stored balance.
        stored: Decimal,
        /// Balance derived from entries.
        computed: Decimal,
    },

    // ========== Infrastructure Errors ==========
    /// Persistence or file storage failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Creates a validation error for a single field.
    #[must_use]
    pub fn field(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, message);
        Self::Validation(errors)
    }

    /// Creates the validation error for a balance that would leave the `Decimal` range.
    #[must_use]
    pub fn balance_overflow(account: AccountRef) -> Self {
        Self::field(
            "amount",
            format!("would take the balance of {account} beyond the supported range"),
        )
    }

    /// Creates a permission error.
    #[must_use]
    pub fn permission(action: &'static str, role: khata_shared::Role) -> Self {
        Self::PermissionDenied {
            action,
            role: role.to_string(),
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::PermissionDenied { .. } => "PERMISSION_DENIED",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::DiscountExceedsOutstanding { .. } => "DISCOUNT_EXCEEDS_OUTSTANDING",
            Self::InvalidChequeState { .. } => "INVALID_CHEQUE_STATE",
            Self::ReconciliationMismatch { .. } => "RECONCILIATION_MISMATCH",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::PermissionDenied { .. } => 403,
            Self::NotFound(_) => 404,
            Self::InvalidChequeState { .. } | Self::ReconciliationMismatch { .. } => 409,
            Self::InsufficientFunds { .. } | Self::DiscountExceedsOutstanding { .. } => 422,
            Self::Storage(_) => 500,
        }
    }

    /// Returns the rejected fields for validation errors.
    #[must_use]
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::Validation(errors) => errors.errors(),
            _ => &[],
        }
    }
}
