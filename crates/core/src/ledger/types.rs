//! Closed enums normalizing the string vocabulary of incoming requests.

use khata_shared::types::{ExpenseId, ReturnId, SaleId};
use serde::{Deserialize, Serialize};

use crate::account::AccountKind;

/// How money moves for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Cash box.
    Cash,
    /// Bank transfer.
    Online,
    /// Third-party cheque, pending until cashed out.
    Cheque,
    /// Cheque drawn on the business's own bank, effective immediately.
    #[serde(rename = "owncheque")]
    OwnCheque,
    /// Ledger-only, no funds move.
    Credit,
}

impl PaymentMethod {
    /// Parses a method, rejecting anything outside the five known names.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Some(Self::Cash),
            "online" => Some(Self::Online),
            "cheque" => Some(Self::Cheque),
            "owncheque" => Some(Self::OwnCheque),
            "credit" => Some(Self::Credit),
            _ => None,
        }
    }

    /// Returns the method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Online => "online",
            Self::Cheque => "cheque",
            Self::OwnCheque => "owncheque",
            Self::Credit => "credit",
        }
    }

    /// Methods that need a bank account.
    #[must_use]
    pub const fn requires_bank(self) -> bool {
        matches!(self, Self::Online | Self::OwnCheque)
    }

    /// Methods that carry a cheque date.
    #[must_use]
    pub const fn requires_cheque_date(self) -> bool {
        matches!(self, Self::Cheque | Self::OwnCheque)
    }

    /// Methods that need a proof-of-payment image.
    #[must_use]
    pub const fn requires_proof(self) -> bool {
        matches!(self, Self::Online | Self::Cheque | Self::OwnCheque)
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of balance mutation requested against an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationKind {
    /// Increase the balance.
    AddBalance,
    /// Decrease the balance.
    SubtractBalance,
    /// Reduce an outstanding balance without moving funds.
    ApplyDiscount,
    /// Customer returns goods, optionally refunded.
    ProcessReturnRefund,
}

impl OperationKind {
    /// Parses an operation kind.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "addBalance" | "add" => Some(Self::AddBalance),
            "subtractBalance" | "subtract" => Some(Self::SubtractBalance),
            "applyDiscount" | "discount" => Some(Self::ApplyDiscount),
            "processReturnRefund" | "return" => Some(Self::ProcessReturnRefund),
            _ => None,
        }
    }
}

/// Effect of an entry on the stored balance of its account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionDirection {
    /// Stored balance increases.
    Credit,
    /// Stored balance decreases.
    Debit,
}

impl TransactionDirection {
    /// Normalizes the many spellings found in imported records.
    #[must_use]
    pub fn parse_legacy(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "add" | "credit" | "deposit" | "in" => Some(Self::Credit),
            "subtract" | "debit" | "withdraw" | "deduct" | "out" => Some(Self::Debit),
            _ => None,
        }
    }

    /// Returns the opposite direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Credit => Self::Debit,
            Self::Debit => Self::Credit,
        }
    }
}

/// Display label of a ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Counterparty balance went up.
    Add,
    /// Counterparty balance went down.
    Subtract,
    /// Funds came in.
    Credit,
    /// Funds went out.
    Debit,
    /// Discount granted or received.
    Deduct,
}

impl TransactionType {
    /// Derives the label from the account kind and the entry.
    #[must_use]
    pub fn label(kind: AccountKind, source: &EntrySource) -> Self {
        if matches!(source, EntrySource::Discount) {
            return Self::Deduct;
        }
        match (kind.is_fund(), source.direction()) {
            (true, TransactionDirection::Credit) => Self::Credit,
            (true, TransactionDirection::Debit) => Self::Debit,
            (false, TransactionDirection::Credit) => Self::Add,
            (false, TransactionDirection::Debit) => Self::Subtract,
        }
    }
}

/// What produced a stored transaction.
///
/// Each tag maps to exactly one direction; tags without a fixed direction
/// record it explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EntrySource {
    /// Sale on credit or paid into a fund.
    #[serde(rename_all = "camelCase")]
    Sale {
        /// Originating sale.
        sale_id: SaleId,
    },
    /// Expense paid from a fund.
    #[serde(rename_all = "camelCase")]
    Expense {
        /// Originating expense.
        expense_id: ExpenseId,
    },
    /// Bank deposit, withdrawal or cheque clearing.
    BankTx {
        /// Recorded direction.
        direction: TransactionDirection,
    },
    /// Cash deposit, withdrawal or cheque clearing.
    CashTx {
        /// Recorded direction.
        direction: TransactionDirection,
    },
    /// Goods returned by a customer.
    #[serde(rename_all = "camelCase")]
    Return {
        /// Originating return record.
        return_id: ReturnId,
    },
    /// Discount lowering an outstanding balance.
    Discount,
    /// Counterparty payment or balance adjustment.
    Payment {
        /// Recorded direction.
        direction: TransactionDirection,
    },
    /// Opening balance.
    Opening {
        /// Recorded direction.
        direction: TransactionDirection,
    },
}

impl EntrySource {
    /// Maps the tag to its effect on the stored balance.
    #[must_use]
    pub const fn direction(&self) -> TransactionDirection {
        match self {
            Self::Sale { .. } => TransactionDirection::Credit,
            Self::Expense { .. } | Self::Return { .. } | Self::Discount => {
                TransactionDirection::Debit
            }
            Self::BankTx { direction }
            | Self::CashTx { direction }
            | Self::Payment { direction }
            | Self::Opening { direction } => *direction,
        }
    }

    /// Short tag name used in ledger rows.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Sale { .. } => "sale",
            Self::Expense { .. } => "expense",
            Self::BankTx { .. } => "bankTx",
            Self::CashTx { .. } => "cashTx",
            Self::Return { .. } => "return",
            Self::Discount => "discount",
            Self::Payment { .. } => "payment",
            Self::Opening { .. } => "opening",
        }
    }

    /// Fund movement tag for the given fund account kind.
    #[must_use]
    pub const fn fund(kind: AccountKind, direction: TransactionDirection) -> Self {
        match kind {
            AccountKind::Cash => Self::CashTx { direction },
            _ => Self::BankTx { direction },
        }
    }
}
