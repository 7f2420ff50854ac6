//! Mutation request and fund-flow types.

use chrono::NaiveDate;
use khata_shared::types::AccountId;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::account::AccountKind;
use crate::ledger::{OperationKind, TransactionDirection};

/// A balance mutation against one account.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationRequest {
    /// `addBalance`, `subtractBalance`, `applyDiscount` or `processReturnRefund`.
    pub operation: String,
    /// Positive amount.
    pub amount: Decimal,
    /// `cash`, `online`, `cheque`, `owncheque` or `credit`.
    pub payment_method: String,
    /// Bank moved or linked.
    #[serde(default)]
    pub bank_id: Option<AccountId>,
    /// Date written on the cheque.
    #[serde(default)]
    pub cheque_date: Option<NaiveDate>,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Stored proof-of-payment key.
    #[serde(default)]
    pub proof_image: Option<String>,
    /// Ledger date, today when absent.
    #[serde(default)]
    pub entry_date: Option<NaiveDate>,
}

/// Direction money moves between the business and a counterparty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FundFlow {
    /// Money comes into bank or cash.
    In,
    /// Money leaves bank or cash.
    Out,
    /// Nothing moves.
    None,
}

impl FundFlow {
    /// Flow and counterparty delta sign for an operation.
    ///
    /// Returns `None` for combinations that are never valid.
    #[must_use]
    pub const fn of(kind: AccountKind, operation: OperationKind) -> Option<(Self, TransactionDirection)> {
        use OperationKind::{AddBalance, ApplyDiscount, ProcessReturnRefund, SubtractBalance};
        use TransactionDirection::{Credit, Debit};
        match (kind, operation) {
            (AccountKind::Customer, AddBalance) => Some((Self::In, Credit)),
            (AccountKind::Customer, SubtractBalance) => Some((Self::Out, Debit)),
            (AccountKind::Customer, ProcessReturnRefund) => Some((Self::Out, Debit)),
            (AccountKind::Supplier | AccountKind::Shipper, AddBalance) => Some((Self::Out, Debit)),
            (AccountKind::Supplier | AccountKind::Shipper, SubtractBalance) => {
                Some((Self::In, Credit))
            }
            (AccountKind::Customer | AccountKind::Supplier | AccountKind::Shipper, ApplyDiscount) => {
                Some((Self::None, Debit))
            }
            (AccountKind::Bank | AccountKind::Cash, AddBalance) => Some((Self::In, Credit)),
            (AccountKind::Bank | AccountKind::Cash, SubtractBalance) => Some((Self::Out, Debit)),
            _ => None,
        }
    }

    /// Direction recorded on the fund account.
    #[must_use]
    pub const fn fund_direction(self) -> Option<TransactionDirection> {
        match self {
            Self::In => Some(TransactionDirection::Credit),
            Self::Out => Some(TransactionDirection::Debit),
            Self::None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AccountKind::Customer, OperationKind::AddBalance, FundFlow::In, TransactionDirection::Credit)]
    #[case(AccountKind::Customer, OperationKind::SubtractBalance, FundFlow::Out, TransactionDirection::Debit)]
    #[case(AccountKind::Supplier, OperationKind::AddBalance, FundFlow::Out, TransactionDirection::Debit)]
    #[case(AccountKind::Shipper, OperationKind::SubtractBalance, FundFlow::In, TransactionDirection::Credit)]
    #[case(AccountKind::Supplier, OperationKind::ApplyDiscount, FundFlow::None, TransactionDirection::Debit)]
    #[case(AccountKind::Customer, OperationKind::ProcessReturnRefund, FundFlow::Out, TransactionDirection::Debit)]
    #[case(AccountKind::Bank, OperationKind::SubtractBalance, FundFlow::Out, TransactionDirection::Debit)]
    fn test_flow_table(
        #[case] kind: AccountKind,
        #[case] operation: OperationKind,
        #[case] flow: FundFlow,
        #[case] direction: TransactionDirection,
    ) {
        assert_eq!(FundFlow::of(kind, operation), Some((flow, direction)));
    }

    #[rstest]
    #[case(AccountKind::Supplier, OperationKind::ProcessReturnRefund)]
    #[case(AccountKind::Cash, OperationKind::ApplyDiscount)]
    #[case(AccountKind::Bank, OperationKind::ProcessReturnRefund)]
    fn test_invalid_combinations(#[case] kind: AccountKind, #[case] operation: OperationKind) {
        assert_eq!(FundFlow::of(kind, operation), None);
    }
}
