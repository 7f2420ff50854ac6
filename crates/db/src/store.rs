//! In-memory record storage and plan application.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use dashmap::DashMap;
use khata_core::account::{Account, AccountRef, AccountSnapshot};
use khata_core::cheque::Cheque;
use khata_core::ledger::{LedgerError, LedgerPlan, LegacyRecord, TradeRecord, TradeRecordId, Transaction};
use khata_core::trade::{DamageRecord, Expense, ProductReturn, Sale};
use khata_shared::types::{
    ChequeId, DamageId, ExpenseId, OperationId, ReturnId, SaleId, TransactionId,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One account with everything recorded against it.
#[derive(Debug, Clone)]
pub struct AccountState {
    /// The account and its stored balance.
    pub account: Account,
    /// Transactions, in insertion order.
    pub transactions: Vec<Transaction>,
    /// Imported legacy rows.
    pub legacy: Vec<LegacyRecord>,
}

impl AccountState {
    pub(crate) fn new(account: Account) -> Self {
        Self {
            account,
            transactions: Vec::new(),
            legacy: Vec::new(),
        }
    }
}

/// What an operation wrote, for hard-delete.
#[derive(Debug, Clone, Default)]
pub(crate) struct OperationEntry {
    pub accounts: BTreeSet<AccountRef>,
    pub cheques: BTreeSet<ChequeId>,
    pub records: Vec<TradeRecordId>,
}

pub(crate) type AccountGuards = BTreeMap<AccountRef, OwnedMutexGuard<AccountState>>;
pub(crate) type ChequeGuards = BTreeMap<ChequeId, OwnedMutexGuard<Cheque>>;

/// Every stored record.
#[derive(Default)]
pub(crate) struct Store {
    pub accounts: DashMap<AccountRef, Arc<Mutex<AccountState>>>,
    pub cheques: DashMap<ChequeId, Arc<Mutex<Cheque>>>,
    pub operations: DashMap<OperationId, OperationEntry>,
    pub transaction_ops: DashMap<TransactionId, OperationId>,
    pub sales: DashMap<SaleId, Sale>,
    pub expenses: DashMap<ExpenseId, Expense>,
    pub returns: DashMap<ReturnId, ProductReturn>,
    pub damages: DashMap<DamageId, DamageRecord>,
}

impl Store {
    /// Locks the given accounts in sorted order. Unknown accounts are skipped.
    pub async fn lock_accounts(
        &self,
        references: impl IntoIterator<Item = AccountRef>,
    ) -> AccountGuards {
        let sorted: BTreeSet<AccountRef> = references.into_iter().collect();
        let mut guards = AccountGuards::new();
        for reference in sorted {
            let Some(slot) = self.accounts.get(&reference).map(|s| Arc::clone(s.value())) else {
                continue;
            };
            guards.insert(reference, slot.lock_owned().await);
        }
        guards
    }

    /// Locks the given cheques in sorted order. Unknown cheques are skipped.
    pub async fn lock_cheques(&self, ids: impl IntoIterator<Item = ChequeId>) -> ChequeGuards {
        let sorted: BTreeSet<ChequeId> = ids.into_iter().collect();
        let mut guards = ChequeGuards::new();
        for id in sorted {
            let Some(slot) = self.cheques.get(&id).map(|s| Arc::clone(s.value())) else {
                continue;
            };
            guards.insert(id, slot.lock_owned().await);
        }
        guards
    }

    /// Applies a plan while its accounts and cheques are locked.
    ///
    /// Fails without writing anything when the plan touches an account that
    /// is not locked or a new balance leaves the `Decimal` range. Planners
    /// already reject both; the second check runs against the locked state.
    pub fn apply(
        &self,
        plan: LedgerPlan,
        accounts: &mut AccountGuards,
        cheques: &mut ChequeGuards,
    ) -> Result<(), LedgerError> {
        let unlocked = plan
            .touched_accounts()
            .chain(plan.transactions.iter().map(|t| &t.account))
            .chain(plan.legacy_records.iter().map(|r| &r.account))
            .chain(plan.reversed.iter().map(|(a, _)| a))
            .chain(plan.deleted.iter().map(|(a, _)| a))
            .find(|a| !accounts.contains_key(a));
        if let Some(account) = unlocked {
            return Err(LedgerError::Storage(format!(
                "account {account} was not locked for operation {}",
                plan.operation_id
            )));
        }

        let snapshot = accounts
            .values()
            .map(|state| state.account.clone())
            .collect::<AccountSnapshot>();
        let balances = plan.new_balances(&snapshot)?;

        let LedgerPlan {
            operation_id,
            balance_changes: _,
            transactions,
            legacy_records,
            reversed,
            deleted,
            cheque,
            removed_cheque,
            records,
            reversed_expense,
            removed_records,
        } = plan;

        for (reference, balance) in balances {
            if let Some(state) = accounts.get_mut(&reference) {
                state.account.balance = balance;
            }
        }

        let mut entry = OperationEntry::default();
        for transaction in transactions {
            entry.accounts.insert(transaction.account);
            entry.cheques.extend(transaction.cheque_id);
            self.transaction_ops.insert(transaction.id, operation_id);
            if let Some(state) = accounts.get_mut(&transaction.account) {
                state.transactions.push(transaction);
            }
        }
        for record in legacy_records {
            entry.accounts.insert(record.account);
            if let Some(state) = accounts.get_mut(&record.account) {
                state.legacy.push(record);
            }
        }

        for (account, transaction_id) in reversed {
            if let Some(state) = accounts.get_mut(&account)
                && let Some(tx) = state.transactions.iter_mut().find(|t| t.id == transaction_id)
            {
                tx.reversed = true;
            }
        }
        for (account, transaction_id) in &deleted {
            if let Some(state) = accounts.get_mut(account) {
                state.transactions.retain(|t| t.id != *transaction_id);
            }
            self.transaction_ops.remove(transaction_id);
        }

        if let Some(cheque) = cheque {
            if cheque.operation_id == operation_id {
                entry.cheques.insert(cheque.id);
            }
            match cheques.get_mut(&cheque.id) {
                Some(guard) => **guard = cheque,
                None => {
                    self.cheques.insert(cheque.id, Arc::new(Mutex::new(cheque)));
                }
            }
        }
        if let Some(id) = removed_cheque {
            self.cheques.remove(&id);
        }

        for record in records {
            entry.records.push(record.id());
            match record {
                TradeRecord::Sale(sale) => {
                    self.sales.insert(sale.id, sale);
                }
                TradeRecord::Expense(expense) => {
                    self.expenses.insert(expense.id, expense);
                }
                TradeRecord::Return(ret) => {
                    self.returns.insert(ret.id, ret);
                }
                TradeRecord::Damage(damage) => {
                    self.damages.insert(damage.id, damage);
                }
            }
        }
        if let Some(id) = reversed_expense
            && let Some(mut expense) = self.expenses.get_mut(&id)
        {
            expense.reversed = true;
        }
        for id in removed_records {
            match id {
                TradeRecordId::Sale(id) => {
                    self.sales.remove(&id);
                }
                TradeRecordId::Expense(id) => {
                    self.expenses.remove(&id);
                }
                TradeRecordId::Return(id) => {
                    self.returns.remove(&id);
                }
                TradeRecordId::Damage(id) => {
                    self.damages.remove(&id);
                }
            }
        }

        if deleted.is_empty() {
            if !entry.accounts.is_empty() || !entry.cheques.is_empty() || !entry.records.is_empty()
            {
                self.operations.insert(operation_id, entry);
            }
        } else {
            self.operations.remove(&operation_id);
        }
        Ok(())
    }
}
