//! Ledger service: read-side ledger building and privileged ledger edits.

use chrono::NaiveDate;
use khata_shared::types::{LegacyRecordId, OperationId};
use rust_decimal::Decimal;
use serde::Deserialize;

use super::balance::{LedgerView, running_balance};
use super::entry::{LegacyRecord, Transaction};
use super::error::{LedgerError, ValidationErrors};
use super::plan::{LedgerPlan, PlanContext, TradeRecordId};
use super::types::TransactionDirection;
use super::validation;
use crate::account::{Account, AccountRef};
use crate::cheque::Cheque;

/// Everything written by one operation, as loaded for deletion.
#[derive(Debug, Clone)]
pub struct OperationSnapshot {
    /// The operation.
    pub operation_id: OperationId,
    /// Its transactions, on every account it touched.
    pub transactions: Vec<Transaction>,
    /// Cheques referenced by those transactions.
    pub cheques: Vec<Cheque>,
    /// Trade records it created.
    pub records: Vec<TradeRecordId>,
}

/// One row of a legacy import.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyImportRow {
    /// Direction as written in the old books (`add`, `deposit`, `out`, ...).
    pub direction: String,
    /// Explicit amount, if any.
    #[serde(default)]
    pub amount: Option<Decimal>,
    /// Description, parsed for `qty x item @ price` when the amount is missing.
    #[serde(default)]
    pub description: String,
    /// Ledger date, defaults to today.
    #[serde(default)]
    pub entry_date: Option<NaiveDate>,
}

/// Ledger service for building, verifying and editing account ledgers.
pub struct LedgerService;

impl LedgerService {
    /// Builds the ordered ledger of one account.
    #[must_use]
    pub fn build_ledger(
        account: &Account,
        transactions: &[Transaction],
        legacy: &[LegacyRecord],
    ) -> LedgerView {
        running_balance(account, transactions, legacy)
    }

    /// Fails when the running balance disagrees with the stored balance.
    pub fn verify(view: &LedgerView) -> Result<(), LedgerError> {
        if view.reconciled {
            Ok(())
        } else {
            Err(LedgerError::ReconciliationMismatch {
                account: view.account,
                stored: view.stored_balance,
                computed: view.closing_balance,
            })
        }
    }

    /// Plans the hard-delete of a whole operation.
    ///
    /// Every transaction of the operation is removed and its balance effect
    /// undone. Operations tied to a third-party cheque must go through the
    /// cheque's own cancellation instead; an own-cheque record is removed
    /// with its operation.
    pub fn plan_deletion(
        ctx: &PlanContext,
        operation: &OperationSnapshot,
    ) -> Result<LedgerPlan, LedgerError> {
        ctx.require_privileged("delete a transaction")?;

        if operation.transactions.is_empty() {
            return Err(LedgerError::NotFound(format!(
                "operation {}",
                operation.operation_id
            )));
        }

        let mut plan = LedgerPlan::for_operation(operation.operation_id);
        for cheque in &operation.cheques {
            if !cheque.own_cheque {
                return Err(LedgerError::InvalidChequeState {
                    cheque_id: cheque.id.to_string(),
                    state: cheque.state.as_str(),
                    action: "delete a transaction linked to it",
                });
            }
            plan.removed_cheque = Some(cheque.id);
        }

        for transaction in &operation.transactions {
            plan.delete(transaction)?;
        }
        plan.removed_records.extend(operation.records.iter().copied());

        plan.ensure_funds(&ctx.accounts)?;
        Ok(plan)
    }

    /// Plans the import of legacy rows onto one account.
    pub fn plan_legacy_import(
        ctx: &PlanContext,
        account: AccountRef,
        rows: &[LegacyImportRow],
    ) -> Result<LedgerPlan, LedgerError> {
        ctx.require_privileged("import legacy records")?;
        ctx.account(&account)?;

        let mut errors = ValidationErrors::new();
        if rows.is_empty() {
            errors.add("rows", "must contain at least one row");
        }

        let today = ctx.today();
        let mut plan = LedgerPlan::new();
        for (index, row) in rows.iter().enumerate() {
            let Some(direction) = TransactionDirection::parse_legacy(&row.direction) else {
                errors.add(
                    "direction",
                    format!("row {index}: '{}' is not a recognised direction", row.direction),
                );
                continue;
            };
            if row.amount.is_some_and(|a| a <= Decimal::ZERO) {
                errors.add("amount", format!("row {index}: must be greater than zero"));
                continue;
            }
            let posted = plan.post_legacy(LegacyRecord {
                id: LegacyRecordId::new(),
                account,
                direction,
                amount: row.amount,
                description: row.description.clone(),
                entry_date: validation::entry_date(row.entry_date, today),
                created_at: ctx.now,
            });
            if posted.is_err() {
                errors.add(
                    "amount",
                    format!("row {index}: takes the balance beyond the supported range"),
                );
            }
        }
        errors.finish()?;

        plan.ensure_funds(&ctx.accounts)?;
        Ok(plan)
    }
}
