//! Running balance calculation.
//!
//! Turns the unordered transactions and legacy rows of one account into
//! chronologically ordered ledger lines, each carrying the cumulative
//! `credit - debit` up to and including that line.

use chrono::{DateTime, NaiveDate, Utc};
use khata_shared::types::{LegacyRecordId, TransactionId};
use rust_decimal::Decimal;
use serde::Serialize;

use super::entry::{LegacyRecord, Transaction};
use super::types::{PaymentMethod, TransactionDirection, TransactionType};
use crate::account::{Account, AccountRef};

/// What a ledger line was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum LineRef {
    /// A stored transaction.
    Transaction(TransactionId),
    /// An imported legacy row.
    Legacy(LegacyRecordId),
}

/// One row of an account ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerLine {
    /// Source record.
    pub reference: LineRef,
    /// Ledger date.
    pub date: NaiveDate,
    /// Creation timestamp, the ordering tiebreaker.
    pub created_at: DateTime<Utc>,
    /// Source tag (`sale`, `bankTx`, `legacy`, ...).
    pub source: &'static str,
    /// Display label.
    pub transaction_type: TransactionType,
    /// Payment method, when known.
    pub payment_method: Option<PaymentMethod>,
    /// Description.
    pub description: String,
    /// Amount lowering the balance.
    pub debit: Decimal,
    /// Amount raising the balance.
    pub credit: Decimal,
    /// Balance after this line.
    pub running_balance: Decimal,
    /// Listed for audit, contributes nothing.
    pub reversed: bool,
}

/// Ordered ledger of one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerView {
    /// Account the ledger belongs to.
    pub account: AccountRef,
    /// Lines, oldest first.
    pub entries: Vec<LedgerLine>,
    /// Balance stored on the account.
    pub stored_balance: Decimal,
    /// Running balance after the last line.
    pub closing_balance: Decimal,
    /// Whether stored and closing balances agree.
    pub reconciled: bool,
}

/// Sorts and accumulates ledger lines.
///
/// Pure and idempotent: the output depends only on the set of input records,
/// never on their order.
#[must_use]
pub fn running_balance(
    account: &Account,
    transactions: &[Transaction],
    legacy: &[LegacyRecord],
) -> LedgerView {
    let kind = account.kind();
    let mut lines: Vec<LedgerLine> = transactions
        .iter()
        .map(|tx| {
            let (debit, credit) = split(tx.source.direction(), tx.amount, tx.reversed);
            LedgerLine {
                reference: LineRef::Transaction(tx.id),
                date: tx.entry_date,
                created_at: tx.created_at,
                source: tx.source.tag(),
                transaction_type: TransactionType::label(kind, &tx.source),
                payment_method: tx.payment_method,
                description: tx.description.clone(),
                debit,
                credit,
                running_balance: Decimal::ZERO,
                reversed: tx.reversed,
            }
        })
        .chain(legacy.iter().map(|row| {
            let (debit, credit) = split(row.direction, row.resolved_amount(), false);
            LedgerLine {
                reference: LineRef::Legacy(row.id),
                date: row.entry_date,
                created_at: row.created_at,
                source: "legacy",
                transaction_type: legacy_label(kind.is_fund(), row.direction),
                payment_method: None,
                description: row.description.clone(),
                debit,
                credit,
                running_balance: Decimal::ZERO,
                reversed: false,
            }
        }))
        .collect();

    lines.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then(a.created_at.cmp(&b.created_at))
            .then(a.reference.cmp(&b.reference))
    });

    let mut balance = Decimal::ZERO;
    for line in &mut lines {
        balance = balance.saturating_add(line.credit).saturating_sub(line.debit);
        line.running_balance = balance;
    }

    LedgerView {
        account: account.reference,
        entries: lines,
        stored_balance: account.balance,
        closing_balance: balance,
        reconciled: balance == account.balance,
    }
}

fn split(direction: TransactionDirection, amount: Decimal, reversed: bool) -> (Decimal, Decimal) {
    if reversed {
        return (Decimal::ZERO, Decimal::ZERO);
    }
    match direction {
        TransactionDirection::Credit => (Decimal::ZERO, amount),
        TransactionDirection::Debit => (amount, Decimal::ZERO),
    }
}

fn legacy_label(is_fund: bool, direction: TransactionDirection) -> TransactionType {
    match (is_fund, direction) {
        (true, TransactionDirection::Credit) => TransactionType::Credit,
        (true, TransactionDirection::Debit) => TransactionType::Debit,
        (false, TransactionDirection::Credit) => TransactionType::Add,
        (false, TransactionDirection::Debit) => TransactionType::Subtract,
    }
}
