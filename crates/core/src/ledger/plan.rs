//! Planned side effects of one operation.
//!
//! Services never write. They validate against an [`AccountSnapshot`] and
//! return a [`LedgerPlan`]; the persistence layer applies the whole plan
//! while still holding the locks it took to build the snapshot, so either
//! every effect lands or none does.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use khata_shared::Role;
use khata_shared::types::{ChequeId, DamageId, ExpenseId, OperationId, ReturnId, SaleId, TransactionId};
use rust_decimal::Decimal;

use super::entry::{LegacyRecord, Transaction};
use super::error::LedgerError;
use crate::account::{Account, AccountRef, AccountSnapshot};
use crate::cheque::Cheque;
use crate::trade::{DamageRecord, Expense, ProductReturn, Sale};

/// Explicit caller context for a planning call.
#[derive(Debug, Clone)]
pub struct PlanContext {
    /// Caller role from the authentication layer.
    pub role: Role,
    /// Current time.
    pub now: DateTime<Utc>,
    /// Accounts locked for this operation.
    pub accounts: AccountSnapshot,
}

impl PlanContext {
    /// Creates a context.
    #[must_use]
    pub fn new(role: Role, now: DateTime<Utc>, accounts: AccountSnapshot) -> Self {
        Self {
            role,
            now,
            accounts,
        }
    }

    /// Today's date.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    /// Looks up an account or fails with `NotFound`.
    pub fn account(&self, reference: &AccountRef) -> Result<&Account, LedgerError> {
        self.accounts
            .get(reference)
            .ok_or_else(|| LedgerError::NotFound(format!("account {reference}")))
    }

    /// Fails unless the caller may write.
    pub fn require_write(&self, action: &'static str) -> Result<(), LedgerError> {
        if self.role.can_write() {
            Ok(())
        } else {
            Err(LedgerError::permission(action, self.role))
        }
    }

    /// Fails unless the caller is admin or owner.
    pub fn require_privileged(&self, action: &'static str) -> Result<(), LedgerError> {
        if self.role.is_privileged() {
            Ok(())
        } else {
            Err(LedgerError::permission(action, self.role))
        }
    }
}

/// A trade record created by an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TradeRecord {
    /// New sale.
    Sale(Sale),
    /// New expense.
    Expense(Expense),
    /// New product return.
    Return(ProductReturn),
    /// New damage write-off.
    Damage(DamageRecord),
}

/// Identifies a trade record to remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradeRecordId {
    /// Sale.
    Sale(SaleId),
    /// Expense.
    Expense(ExpenseId),
    /// Product return.
    Return(ReturnId),
    /// Damage write-off.
    Damage(DamageId),
}

impl TradeRecord {
    /// Identifier of the record.
    #[must_use]
    pub const fn id(&self) -> TradeRecordId {
        match self {
            Self::Sale(s) => TradeRecordId::Sale(s.id),
            Self::Expense(e) => TradeRecordId::Expense(e.id),
            Self::Return(r) => TradeRecordId::Return(r.id),
            Self::Damage(d) => TradeRecordId::Damage(d.id),
        }
    }
}

/// Every write an operation needs, applied atomically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerPlan {
    /// Groups the written transactions.
    pub operation_id: OperationId,
    /// Net balance delta per account.
    pub balance_changes: BTreeMap<AccountRef, Decimal>,
    /// Transactions to append.
    pub transactions: Vec<Transaction>,
    /// Legacy rows to append.
    pub legacy_records: Vec<LegacyRecord>,
    /// Transactions to flag as reversed.
    pub reversed: Vec<(AccountRef, TransactionId)>,
    /// Transactions to remove.
    pub deleted: Vec<(AccountRef, TransactionId)>,
    /// Cheque to insert or replace.
    pub cheque: Option<Cheque>,
    /// Cheque to remove.
    pub removed_cheque: Option<ChequeId>,
    /// Trade records to insert.
    pub records: Vec<TradeRecord>,
    /// Expense to flag as reversed.
    pub reversed_expense: Option<ExpenseId>,
    /// Trade records to remove.
    pub removed_records: Vec<TradeRecordId>,
}

impl LedgerPlan {
    /// Creates an empty plan for a new operation.
    #[must_use]
    pub fn new() -> Self {
        Self::for_operation(OperationId::new())
    }

    /// Creates an empty plan under an existing operation id.
    #[must_use]
    pub fn for_operation(operation_id: OperationId) -> Self {
        Self {
            operation_id,
            balance_changes: BTreeMap::new(),
            transactions: Vec::new(),
            legacy_records: Vec::new(),
            reversed: Vec::new(),
            deleted: Vec::new(),
            cheque: None,
            removed_cheque: None,
            records: Vec::new(),
            reversed_expense: None,
            removed_records: Vec::new(),
        }
    }

    fn change(&mut self, account: AccountRef, delta: Decimal) -> Result<(), LedgerError> {
        let slot = self.balance_changes.entry(account).or_insert(Decimal::ZERO);
        *slot = slot
            .checked_add(delta)
            .ok_or_else(|| LedgerError::balance_overflow(account))?;
        Ok(())
    }

    /// Appends a transaction and its balance effect.
    pub fn post(&mut self, transaction: Transaction) -> Result<(), LedgerError> {
        self.change(transaction.account, transaction.signed_amount())?;
        self.transactions.push(transaction);
        Ok(())
    }

    /// Appends a legacy row and its resolved balance effect.
    pub fn post_legacy(&mut self, record: LegacyRecord) -> Result<(), LedgerError> {
        self.change(record.account, record.signed_amount())?;
        self.legacy_records.push(record);
        Ok(())
    }

    /// Flags a transaction reversed and undoes `delta`.
    pub fn reverse(
        &mut self,
        account: AccountRef,
        transaction_id: TransactionId,
        delta: Decimal,
    ) -> Result<(), LedgerError> {
        self.change(account, -delta)?;
        self.reversed.push((account, transaction_id));
        Ok(())
    }

    /// Removes a transaction and undoes whatever effect it still has.
    pub fn delete(&mut self, transaction: &Transaction) -> Result<(), LedgerError> {
        self.change(transaction.account, -transaction.signed_amount())?;
        self.deleted.push((transaction.account, transaction.id));
        Ok(())
    }

    /// Net delta planned for an account.
    #[must_use]
    pub fn delta(&self, account: &AccountRef) -> Decimal {
        self.balance_changes
            .get(account)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Accounts whose balance changes.
    pub fn touched_accounts(&self) -> impl Iterator<Item = &AccountRef> {
        self.balance_changes.keys()
    }

    /// Balance every touched account ends at.
    ///
    /// Fails before anything is written when an account is missing from the
    /// snapshot or its balance would leave the `Decimal` range.
    pub fn new_balances(
        &self,
        accounts: &AccountSnapshot,
    ) -> Result<BTreeMap<AccountRef, Decimal>, LedgerError> {
        self.balance_changes
            .iter()
            .map(|(reference, delta)| {
                let account = accounts
                    .get(reference)
                    .ok_or_else(|| LedgerError::NotFound(format!("account {reference}")))?;
                account
                    .balance
                    .checked_add(*delta)
                    .map(|balance| (*reference, balance))
                    .ok_or_else(|| LedgerError::balance_overflow(*reference))
            })
            .collect()
    }

    /// Checks every new balance fits and no bank or cash account ends up negative.
    pub fn ensure_funds(&self, accounts: &AccountSnapshot) -> Result<(), LedgerError> {
        for (reference, balance) in self.new_balances(accounts)? {
            let delta = self.delta(&reference);
            if reference.is_fund() && delta < Decimal::ZERO && balance < Decimal::ZERO {
                return Err(LedgerError::InsufficientFunds {
                    account: reference,
                    available: balance - delta,
                    requested: -delta,
                });
            }
        }
        Ok(())
    }
}

impl Default for LedgerPlan {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::types::{EntrySource, TransactionDirection};
    use rust_decimal_macros::dec;

    fn cash(balance: Decimal) -> Account {
        Account {
            reference: AccountRef::Cash,
            name: "Cash".into(),
            balance,
            created_at: Utc::now(),
        }
    }

    fn cash_tx(plan: &LedgerPlan, amount: Decimal, direction: TransactionDirection) -> Transaction {
        Transaction::draft(
            plan.operation_id,
            AccountRef::Cash,
            amount,
            EntrySource::CashTx { direction },
            "test",
            Utc::now().date_naive(),
            Utc::now(),
        )
    }

    #[test]
    fn test_post_accumulates_delta() {
        let mut plan = LedgerPlan::new();
        let tx = cash_tx(&plan, dec!(100), TransactionDirection::Credit);
        plan.post(tx).unwrap();
        let tx = cash_tx(&plan, dec!(30), TransactionDirection::Debit);
        plan.post(tx).unwrap();
        assert_eq!(plan.delta(&AccountRef::Cash), dec!(70));
        assert_eq!(plan.transactions.len(), 2);
    }

    #[test]
    fn test_ensure_funds_rejects_overdraw() {
        let mut plan = LedgerPlan::new();
        let tx = cash_tx(&plan, dec!(1000), TransactionDirection::Debit);
        plan.post(tx).unwrap();

        let snapshot = AccountSnapshot::new().with(cash(dec!(800)));
        let err = plan.ensure_funds(&snapshot).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientFunds { available, requested, .. }
                if available == dec!(800) && requested == dec!(1000)
        ));

        let snapshot = AccountSnapshot::new().with(cash(dec!(1000)));
        assert!(plan.ensure_funds(&snapshot).is_ok());
    }

    #[test]
    fn test_balance_overflow_is_rejected_before_apply() {
        let mut plan = LedgerPlan::new();
        let tx = cash_tx(&plan, dec!(1), TransactionDirection::Credit);
        plan.post(tx).unwrap();

        let snapshot = AccountSnapshot::new().with(cash(Decimal::MAX));
        let err = plan.ensure_funds(&snapshot).unwrap_err();
        assert!(err.field_errors().iter().any(|f| f.field == "amount"));

        let snapshot = AccountSnapshot::new().with(cash(Decimal::MAX - dec!(1)));
        assert_eq!(plan.new_balances(&snapshot).unwrap()[&AccountRef::Cash], Decimal::MAX);
    }

    #[test]
    fn test_accumulated_delta_overflow_is_rejected() {
        let mut plan = LedgerPlan::new();
        let tx = cash_tx(&plan, Decimal::MAX, TransactionDirection::Credit);
        plan.post(tx).unwrap();
        let tx = cash_tx(&plan, dec!(1), TransactionDirection::Credit);
        assert!(matches!(plan.post(tx), Err(LedgerError::Validation(_))));
        assert_eq!(plan.transactions.len(), 1);
    }

    #[test]
    fn test_delete_undoes_effect() {
        let mut plan = LedgerPlan::new();
        let tx = cash_tx(&plan, dec!(40), TransactionDirection::Credit);
        plan.delete(&tx).unwrap();
        assert_eq!(plan.delta(&AccountRef::Cash), dec!(-40));

        let mut reversed = cash_tx(&plan, dec!(40), TransactionDirection::Credit);
        reversed.reversed = true;
        let mut plan = LedgerPlan::new();
        plan.delete(&reversed).unwrap();
        assert_eq!(plan.delta(&AccountRef::Cash), Decimal::ZERO);
    }

    #[test]
    fn test_role_gates() {
        let ctx = PlanContext::new(Role::Viewer, Utc::now(), AccountSnapshot::new());
        assert!(matches!(
            ctx.require_write("record a sale"),
            Err(LedgerError::PermissionDenied { .. })
        ));
        let ctx = PlanContext::new(Role::Staff, Utc::now(), AccountSnapshot::new());
        assert!(ctx.require_write("record a sale").is_ok());
        assert!(ctx.require_privileged("cancel a cheque").is_err());
        assert!(matches!(
            ctx.account(&AccountRef::Cash),
            Err(LedgerError::NotFound(_))
        ));
    }
}
