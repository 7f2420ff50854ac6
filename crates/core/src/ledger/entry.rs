//! Stored ledger records.

use chrono::{DateTime, NaiveDate, Utc};
use khata_shared::types::{AccountId, ChequeId, LegacyRecordId, OperationId, TransactionId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::legacy::resolve_legacy_amount;
use super::types::{EntrySource, PaymentMethod, TransactionDirection};
use crate::account::AccountRef;

/// A transaction recorded against exactly one account.
///
/// Immutable once written. Cheque cancellation and transfer flag it as
/// `reversed`; hard-delete removes it together with its operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Transaction ID.
    pub id: TransactionId,
    /// Operation that wrote this transaction.
    pub operation_id: OperationId,
    /// Account whose balance it changed.
    pub account: AccountRef,
    /// Positive amount.
    pub amount: Decimal,
    /// What produced it.
    pub source: EntrySource,
    /// Payment method of the originating operation.
    pub payment_method: Option<PaymentMethod>,
    /// Free-text description.
    pub description: String,
    /// Bank involved in the operation, if any.
    pub bank_id: Option<AccountId>,
    /// Cheque involved in the operation, if any.
    pub cheque_id: Option<ChequeId>,
    /// Date written on the cheque.
    pub cheque_date: Option<NaiveDate>,
    /// Stored proof-of-payment key.
    pub proof_image: Option<String>,
    /// Ledger date.
    pub entry_date: NaiveDate,
    /// When it was written.
    pub created_at: DateTime<Utc>,
    /// Balance effect has been undone.
    pub reversed: bool,
}

impl Transaction {
    /// Starts a transaction with no optional references filled in.
    #[must_use]
    pub fn draft(
        operation_id: OperationId,
        account: AccountRef,
        amount: Decimal,
        source: EntrySource,
        description: impl Into<String>,
        entry_date: NaiveDate,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TransactionId::new(),
            operation_id,
            account,
            amount,
            source,
            payment_method: None,
            description: description.into(),
            bank_id: None,
            cheque_id: None,
            cheque_date: None,
            proof_image: None,
            entry_date,
            created_at,
            reversed: false,
        }
    }

    /// Effect on the stored balance, zero once reversed.
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        if self.reversed {
            return Decimal::ZERO;
        }
        match self.source.direction() {
            TransactionDirection::Credit => self.amount,
            TransactionDirection::Debit => -self.amount,
        }
    }
}

/// A row imported from the old bookkeeping, possibly without an amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyRecord {
    /// Record ID.
    pub id: LegacyRecordId,
    /// Account it belongs to.
    pub account: AccountRef,
    /// Normalized direction.
    pub direction: TransactionDirection,
    /// Explicit amount, when the source had one.
    pub amount: Option<Decimal>,
    /// Original description, parsed when the amount is missing.
    pub description: String,
    /// Ledger date.
    pub entry_date: NaiveDate,
    /// When it was imported.
    pub created_at: DateTime<Utc>,
}

impl LegacyRecord {
    /// Amount used for the balance: explicit, parsed, or zero.
    #[must_use]
    pub fn resolved_amount(&self) -> Decimal {
        resolve_legacy_amount(self.amount, &self.description)
    }

    /// Effect on the stored balance.
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        match self.direction {
            TransactionDirection::Credit => self.resolved_amount(),
            TransactionDirection::Debit => -self.resolved_amount(),
        }
    }
}
