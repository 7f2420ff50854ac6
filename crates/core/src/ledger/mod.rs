//! Ledger entry model and running balance.
//!
//! This module implements the read and write sides of account ledgers:
//! - Stored transactions tagged by what produced them
//! - Legacy rows recovered from free-text descriptions
//! - Running balance calculation and reconciliation
//! - Atomic operation plans shared by every service
//! - Field validation and the ledger error taxonomy

pub mod balance;
pub mod entry;
pub mod error;
pub mod legacy;
pub mod plan;
pub mod service;
pub mod types;
pub mod validation;

#[cfg(test)]
mod service_props;

pub use balance::{LedgerLine, LedgerView, LineRef};
pub use entry::{LegacyRecord, Transaction};
pub use error::{FieldError, LedgerError, ValidationErrors};
pub use plan::{LedgerPlan, PlanContext, TradeRecord, TradeRecordId};
pub use service::{LedgerService, LegacyImportRow, OperationSnapshot};
pub use types::{EntrySource, OperationKind, PaymentMethod, TransactionDirection, TransactionType};
