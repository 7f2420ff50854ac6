//! Cheque domain types.

use chrono::{DateTime, NaiveDate, Utc};
use khata_shared::types::{AccountId, ChequeId, ExpenseId, OperationId, TransactionId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::account::{AccountKind, AccountRef};

/// Who the cheque is with; decides whether clearing pays in or out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChequeType {
    /// Received from a customer.
    Customer,
    /// Issued to a supplier.
    Supplier,
    /// Issued to a shipper.
    Shipper,
    /// Issued for a product purchase.
    Product,
}

impl ChequeType {
    /// Supplier, shipper and product cheques take money out of the business.
    #[must_use]
    pub const fn is_payout(self) -> bool {
        matches!(self, Self::Supplier | Self::Shipper | Self::Product)
    }

    /// Cheque type matching a counterparty kind.
    #[must_use]
    pub const fn for_counterparty(kind: AccountKind) -> Option<Self> {
        match kind {
            AccountKind::Customer => Some(Self::Customer),
            AccountKind::Supplier => Some(Self::Supplier),
            AccountKind::Shipper => Some(Self::Shipper),
            AccountKind::Bank | AccountKind::Cash => None,
        }
    }
}

/// Exactly one state at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChequeState {
    /// Awaiting clearing.
    Pending,
    /// Cashed out into bank or cash.
    Cleared,
    /// Reversed.
    Cancelled,
    /// Handed on to another party, not yet settled.
    TransferredPending,
    /// Settled by the party it was handed to.
    TransferredCashed,
}

impl ChequeState {
    /// Returns the state name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Cleared => "cleared",
            Self::Cancelled => "cancelled",
            Self::TransferredPending => "transferred_pending",
            Self::TransferredCashed => "transferred_cashed",
        }
    }

    /// Parses a state name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "cleared" => Some(Self::Cleared),
            "cancelled" => Some(Self::Cancelled),
            "transferred_pending" => Some(Self::TransferredPending),
            "transferred_cashed" => Some(Self::TransferredCashed),
            _ => None,
        }
    }

    /// No action is accepted any more.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Cleared | Self::Cancelled | Self::TransferredCashed
        )
    }
}

/// Balance effect currently recognized for the cheque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ChequeEffect {
    /// A counterparty balance change.
    #[serde(rename_all = "camelCase")]
    Account {
        /// Counterparty holding the effect.
        account: AccountRef,
        /// Transaction that recorded it.
        transaction_id: TransactionId,
        /// Signed change applied to the counterparty.
        delta: Decimal,
    },
    /// A product-purchase expense.
    #[serde(rename_all = "camelCase")]
    Expense {
        /// Expense paid by this cheque.
        expense_id: ExpenseId,
    },
}

/// A cheque and its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cheque {
    /// Cheque ID.
    pub id: ChequeId,
    /// Operation that created it.
    pub operation_id: OperationId,
    /// Face value.
    pub amount: Decimal,
    /// Counterparty type.
    pub cheque_type: ChequeType,
    /// Linked bank, if any.
    pub bank_id: Option<AccountId>,
    /// Date written on the cheque.
    pub cheque_date: NaiveDate,
    /// Current state.
    pub state: ChequeState,
    /// Drawn on the business's own bank.
    pub own_cheque: bool,
    /// Currently recognized balance effect.
    pub effect: ChequeEffect,
    /// Party the cheque was handed to.
    pub transferred_to: Option<AccountRef>,
    /// Fund account it was cashed into.
    pub cleared_to: Option<AccountRef>,
    /// Stored image key.
    pub cheque_image: Option<String>,
    /// Description.
    pub description: String,
    /// When it was created.
    pub created_at: DateTime<Utc>,
    /// When it last changed.
    pub updated_at: DateTime<Utc>,
}

impl Cheque {
    /// Whether clearing takes money out of the business.
    #[must_use]
    pub const fn is_payout(&self) -> bool {
        self.cheque_type.is_payout()
    }

    /// Boolean flags in the shape older clients expect.
    #[must_use]
    pub const fn flags(&self) -> ChequeFlags {
        ChequeFlags {
            status: matches!(self.state, ChequeState::Cleared),
            cancelled: matches!(self.state, ChequeState::Cancelled),
            transferred: matches!(
                self.state,
                ChequeState::TransferredPending | ChequeState::TransferredCashed
            ),
            transferred_cashed_out: matches!(self.state, ChequeState::TransferredCashed),
        }
    }
}

/// Legacy boolean view of [`ChequeState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChequeFlags {
    /// Cleared.
    pub status: bool,
    /// Cancelled.
    pub cancelled: bool,
    /// Transferred, settled or not.
    pub transferred: bool,
    /// Transferred and settled.
    pub transferred_cashed_out: bool,
}

/// Cheque with its flags, as returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct ChequeView {
    /// The cheque.
    #[serde(flatten)]
    pub cheque: Cheque,
    /// Derived flags.
    #[serde(flatten)]
    pub flags: ChequeFlags,
}

impl From<Cheque> for ChequeView {
    fn from(cheque: Cheque) -> Self {
        let flags = cheque.flags();
        Self { cheque, flags }
    }
}

/// Where a cash-out lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CashOutDestination {
    /// A bank account.
    Bank,
    /// The cash box.
    Cash,
}

/// Who a transferred cheque goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferTargetType {
    /// A customer.
    Customer,
    /// A supplier.
    Supplier,
}

/// Requested transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ChequeAction {
    /// Clear into bank or cash.
    #[serde(rename_all = "camelCase")]
    CashOut {
        /// Destination kind.
        destination: CashOutDestination,
        /// Bank to use when the cheque has none linked.
        #[serde(default)]
        bank_id: Option<AccountId>,
    },
    /// Reverse a pending cheque.
    Cancel {
        /// Explicit confirmation.
        #[serde(default)]
        confirm: bool,
    },
    /// Hand a pending cheque to another party.
    #[serde(rename_all = "camelCase")]
    Transfer {
        /// Target kind.
        target_type: TransferTargetType,
        /// Target account.
        target_id: AccountId,
    },
    /// Mark a transferred cheque settled by its new holder.
    CashOutTransferred,
    /// Reverse a transferred cheque.
    CancelTransferred {
        /// Explicit confirmation.
        #[serde(default)]
        confirm: bool,
    },
}

impl ChequeAction {
    /// Human-readable action name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CashOut { .. } => "cash out",
            Self::Cancel { .. } => "cancel",
            Self::Transfer { .. } => "transfer",
            Self::CashOutTransferred => "cash out transferred",
            Self::CancelTransferred { .. } => "cancel transferred",
        }
    }

    /// State the action starts from.
    #[must_use]
    pub const fn required_state(&self) -> ChequeState {
        match self {
            Self::CashOut { .. } | Self::Cancel { .. } | Self::Transfer { .. } => {
                ChequeState::Pending
            }
            Self::CashOutTransferred | Self::CancelTransferred { .. } => {
                ChequeState::TransferredPending
            }
        }
    }
}

/// One item of a batch cash-out.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashOutItem {
    /// Cheque to clear.
    pub cheque_id: ChequeId,
    /// Destination kind.
    pub destination: CashOutDestination,
    /// Bank to use when the cheque has none linked.
    #[serde(default)]
    pub bank_id: Option<AccountId>,
}
