//! Ledger repository: locks, snapshots, plans and applies.
//!
//! Every write follows the same sequence:
//! 1. resolve the accounts (and cheques) the operation touches
//! 2. lock cheques, then accounts, each in sorted order
//! 3. build an [`AccountSnapshot`] from the locked state
//! 4. ask the core service for a [`LedgerPlan`]
//! 5. apply the plan before releasing any lock
//!
//! A failed plan leaves every record untouched.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use khata_core::account::{
    Account, AccountKind, AccountRef, AccountService, AccountSnapshot, OpenAccountRequest,
};
use khata_core::cheque::{
    CashOutItem, Cheque, ChequeAction, ChequeService, ChequeState,
};
use khata_core::ledger::{
    LedgerError, LedgerPlan, LedgerService, LedgerView, LegacyImportRow, OperationSnapshot,
    PlanContext, TradeRecord,
};
use khata_core::mutation::{MutationRequest, MutationService};
use khata_core::reports::{ReportError, ReportPeriod, ReportService, ReportSnapshot, ReportTotals};
use khata_core::trade::{
    DamageRecord, Expense, RecordDamageRequest, RecordExpenseRequest, RecordSaleRequest, Sale,
    TradeService,
};
use khata_shared::Role;
use khata_shared::types::{ChequeId, TransactionId};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, warn};

use crate::store::{AccountGuards, AccountState, ChequeGuards, Store};

/// Who is calling and when.
#[derive(Debug, Clone, Copy)]
pub struct Caller {
    /// Role from the authentication layer.
    pub role: Role,
    /// Time of the call.
    pub now: DateTime<Utc>,
}

impl Caller {
    /// A caller acting now.
    #[must_use]
    pub fn new(role: Role) -> Self {
        Self::at(role, Utc::now())
    }

    /// A caller acting at a fixed time.
    #[must_use]
    pub const fn at(role: Role, now: DateTime<Utc>) -> Self {
        Self { role, now }
    }
}

/// Result of one batch cash-out item.
#[derive(Debug)]
pub struct CashOutOutcome {
    /// Cheque the item referred to.
    pub cheque_id: ChequeId,
    /// Cleared cheque or the reason it was refused.
    pub result: Result<Cheque, LedgerError>,
}

/// In-memory ledger repository with per-account atomic read-modify-write.
pub struct LedgerRepository {
    store: Store,
    /// Writers share it, reports take it exclusively for a consistent view.
    gate: RwLock<()>,
}

impl LedgerRepository {
    /// Creates a repository holding only the cash account.
    ///
    /// # Errors
    ///
    /// Returns an error if the opening balance is negative.
    pub async fn new(cash_opening_balance: Decimal) -> Result<Self, LedgerError> {
        let repository = Self {
            store: Store::default(),
            gate: RwLock::new(()),
        };
        let (cash, plan) = AccountService::open_cash(cash_opening_balance, Utc::now())?;
        repository.insert_account(cash, plan).await?;
        Ok(repository)
    }

    // ========== Accounts ==========

    /// Opens a customer, supplier, shipper or bank account.
    pub async fn create_account(
        &self,
        caller: Caller,
        request: &OpenAccountRequest,
    ) -> Result<Account, LedgerError> {
        let ctx = PlanContext::new(caller.role, caller.now, AccountSnapshot::new());
        let (account, plan) = AccountService::open(&ctx, request).inspect_err(|e| {
            warn!(error = %e, kind = %request.kind, "account rejected");
        })?;
        let account = self.insert_account(account, plan).await?;
        info!(account = %account.reference, balance = %account.balance, "account opened");
        Ok(account)
    }

    async fn insert_account(
        &self,
        account: Account,
        plan: LedgerPlan,
    ) -> Result<Account, LedgerError> {
        let _gate = self.gate.read().await;
        let reference = account.reference;
        self.store
            .accounts
            .insert(reference, Arc::new(Mutex::new(AccountState::new(account))));
        let mut guards = self.store.lock_accounts([reference]).await;
        self.store
            .apply(plan, &mut guards, &mut ChequeGuards::new())?;
        guards
            .get(&reference)
            .map(|state| state.account.clone())
            .ok_or_else(|| LedgerError::NotFound(format!("account {reference}")))
    }

    /// Reads one account.
    pub async fn get_account(&self, reference: AccountRef) -> Result<Account, LedgerError> {
        let slot = self.account_slot(reference)?;
        let state = slot.lock().await;
        Ok(state.account.clone())
    }

    /// Lists accounts, optionally of one kind, oldest first.
    pub async fn list_accounts(&self, kind: Option<AccountKind>) -> Vec<Account> {
        let slots: Vec<_> = self
            .store
            .accounts
            .iter()
            .filter(|entry| kind.is_none_or(|k| entry.key().kind() == k))
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        let mut accounts = Vec::with_capacity(slots.len());
        for slot in slots {
            accounts.push(slot.lock().await.account.clone());
        }
        accounts.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.reference.cmp(&b.reference))
        });
        accounts
    }

    /// Number of open accounts, cash included.
    #[must_use]
    pub fn account_count(&self) -> usize {
        self.store.accounts.len()
    }

    fn account_slot(&self, reference: AccountRef) -> Result<Arc<Mutex<AccountState>>, LedgerError> {
        self.store
            .accounts
            .get(&reference)
            .map(|slot| Arc::clone(slot.value()))
            .ok_or_else(|| LedgerError::NotFound(format!("account {reference}")))
    }

    // ========== Mutations ==========

    /// Applies a balance mutation and returns the updated target account.
    pub async fn apply_mutation(
        &self,
        caller: Caller,
        target: AccountRef,
        request: &MutationRequest,
    ) -> Result<Account, LedgerError> {
        let _gate = self.gate.read().await;
        let mut guards = self
            .store
            .lock_accounts(MutationService::accounts_touched(target, request))
            .await;
        let ctx = context(caller, &guards);

        let plan = MutationService::plan(&ctx, target, request).inspect_err(|e| {
            warn!(account = %target, operation = %request.operation, error = %e, "mutation rejected");
        })?;
        let operation_id = plan.operation_id;
        let cheque_id = plan.cheque.as_ref().map(|c| c.id);
        self.store
            .apply(plan, &mut guards, &mut ChequeGuards::new())?;

        let account = guards
            .get(&target)
            .map(|state| state.account.clone())
            .ok_or_else(|| LedgerError::NotFound(format!("account {target}")))?;
        info!(
            account = %target,
            operation = %request.operation,
            amount = %request.amount,
            method = %request.payment_method,
            operation_id = %operation_id,
            cheque_id = ?cheque_id,
            balance = %account.balance,
            "mutation applied"
        );
        Ok(account)
    }

    // ========== Cheques ==========

    /// Reads one cheque.
    pub async fn get_cheque(&self, id: ChequeId) -> Result<Cheque, LedgerError> {
        let slot = self
            .store
            .cheques
            .get(&id)
            .map(|slot| Arc::clone(slot.value()))
            .ok_or_else(|| LedgerError::NotFound(format!("cheque {id}")))?;
        let cheque = slot.lock().await;
        Ok(cheque.clone())
    }

    /// Lists cheques, optionally in one state, newest first.
    pub async fn list_cheques(&self, state: Option<ChequeState>) -> Vec<Cheque> {
        let mut cheques = self.all_cheques().await;
        cheques.retain(|c| state.is_none_or(|s| c.state == s));
        cheques.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        cheques
    }

    async fn all_cheques(&self) -> Vec<Cheque> {
        let slots: Vec<_> = self
            .store
            .cheques
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        let mut cheques = Vec::with_capacity(slots.len());
        for slot in slots {
            cheques.push(slot.lock().await.clone());
        }
        cheques
    }

    /// Moves a cheque through one transition.
    pub async fn transition_cheque(
        &self,
        caller: Caller,
        id: ChequeId,
        action: &ChequeAction,
    ) -> Result<Cheque, LedgerError> {
        let _gate = self.gate.read().await;
        let mut cheques = self.store.lock_cheques([id]).await;
        let current = cheques
            .get(&id)
            .map(|guard| (**guard).clone())
            .ok_or_else(|| LedgerError::NotFound(format!("cheque {id}")))?;

        let mut accounts = self
            .store
            .lock_accounts(ChequeService::accounts_touched(&current, action))
            .await;
        let ctx = context(caller, &accounts);

        let plan = ChequeService::plan_transition(&ctx, &current, action).inspect_err(|e| {
            warn!(cheque_id = %id, action = action.name(), error = %e, "cheque transition rejected");
        })?;
        let changes: Vec<(AccountRef, Decimal)> =
            plan.balance_changes.iter().map(|(a, d)| (*a, *d)).collect();
        self.store.apply(plan, &mut accounts, &mut cheques)?;

        let updated = cheques
            .get(&id)
            .map(|guard| (**guard).clone())
            .ok_or_else(|| LedgerError::NotFound(format!("cheque {id}")))?;
        info!(
            cheque_id = %id,
            action = action.name(),
            from = current.state.as_str(),
            to = updated.state.as_str(),
            amount = %updated.amount,
            changes = ?changes,
            "cheque transition applied"
        );
        Ok(updated)
    }

    /// Cashes out several cheques.
    ///
    /// Items run concurrently and serialize only on the accounts they share.
    /// Each item succeeds or fails on its own; earlier successes stay applied.
    pub async fn cash_out_batch(&self, caller: Caller, items: &[CashOutItem]) -> Vec<CashOutOutcome> {
        let outcomes = join_all(items.iter().map(|item| async move {
            let action = ChequeAction::CashOut {
                destination: item.destination,
                bank_id: item.bank_id,
            };
            CashOutOutcome {
                cheque_id: item.cheque_id,
                result: self.transition_cheque(caller, item.cheque_id, &action).await,
            }
        }))
        .await;

        let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
        info!(
            items = outcomes.len(),
            succeeded = outcomes.len() - failed,
            failed,
            "batch cash-out finished"
        );
        outcomes
    }

    // ========== Ledger ==========

    /// Builds the running-balance ledger of an account.
    ///
    /// A mismatch with the stored balance is logged and reported in the
    /// view's `reconciled` flag.
    pub async fn list_ledger(&self, reference: AccountRef) -> Result<LedgerView, LedgerError> {
        let slot = self.account_slot(reference)?;
        let view = {
            let state = slot.lock().await;
            LedgerService::build_ledger(&state.account, &state.transactions, &state.legacy)
        };
        if !view.reconciled {
            error!(
                account = %reference,
                stored = %view.stored_balance,
                computed = %view.closing_balance,
                "ledger does not reconcile with stored balance"
            );
        }
        Ok(view)
    }

    /// Builds the ledger and fails on any reconciliation mismatch.
    pub async fn verify_ledger(&self, reference: AccountRef) -> Result<LedgerView, LedgerError> {
        let view = self.list_ledger(reference).await?;
        LedgerService::verify(&view)?;
        Ok(view)
    }

    /// Appends legacy rows to an account.
    pub async fn import_legacy(
        &self,
        caller: Caller,
        reference: AccountRef,
        rows: &[LegacyImportRow],
    ) -> Result<Account, LedgerError> {
        let _gate = self.gate.read().await;
        let mut guards = self.store.lock_accounts([reference]).await;
        let ctx = context(caller, &guards);
        let plan = LedgerService::plan_legacy_import(&ctx, reference, rows).inspect_err(|e| {
            warn!(account = %reference, rows = rows.len(), error = %e, "legacy import rejected");
        })?;
        self.store
            .apply(plan, &mut guards, &mut ChequeGuards::new())?;
        let account = guards
            .get(&reference)
            .map(|state| state.account.clone())
            .ok_or_else(|| LedgerError::NotFound(format!("account {reference}")))?;
        info!(account = %reference, rows = rows.len(), balance = %account.balance, "legacy rows imported");
        Ok(account)
    }

    /// Hard-deletes the operation a transaction belongs to.
    pub async fn delete_transaction(
        &self,
        caller: Caller,
        transaction_id: TransactionId,
    ) -> Result<(), LedgerError> {
        let _gate = self.gate.read().await;
        let operation_id = self
            .store
            .transaction_ops
            .get(&transaction_id)
            .map(|op| *op.value())
            .ok_or_else(|| LedgerError::NotFound(format!("transaction {transaction_id}")))?;
        let entry = self
            .store
            .operations
            .get(&operation_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| LedgerError::NotFound(format!("operation {operation_id}")))?;

        let mut cheques = self.store.lock_cheques(entry.cheques.iter().copied()).await;
        let mut accounts = self
            .store
            .lock_accounts(entry.accounts.iter().copied())
            .await;
        let ctx = context(caller, &accounts);

        let snapshot = OperationSnapshot {
            operation_id,
            transactions: accounts
                .values()
                .flat_map(|state| state.transactions.iter())
                .filter(|t| t.operation_id == operation_id)
                .cloned()
                .collect(),
            cheques: cheques.values().map(|guard| (**guard).clone()).collect(),
            records: entry.records.clone(),
        };
        let plan = LedgerService::plan_deletion(&ctx, &snapshot).inspect_err(|e| {
            warn!(transaction_id = %transaction_id, error = %e, "deletion rejected");
        })?;
        let removed = plan.deleted.len();
        self.store.apply(plan, &mut accounts, &mut cheques)?;
        info!(
            transaction_id = %transaction_id,
            operation_id = %operation_id,
            removed,
            "operation deleted"
        );
        Ok(())
    }

    // ========== Trade ==========

    /// Records a sale.
    pub async fn record_sale(
        &self,
        caller: Caller,
        request: &RecordSaleRequest,
    ) -> Result<Sale, LedgerError> {
        let records = self
            .plan_and_apply(caller, TradeService::sale_accounts(request), |ctx| {
                TradeService::plan_sale(ctx, request)
            })
            .await?;
        let sale = records
            .into_iter()
            .find_map(|record| match record {
                TradeRecord::Sale(sale) => Some(sale),
                _ => None,
            })
            .ok_or_else(|| LedgerError::Storage("sale was not recorded".into()))?;
        info!(sale_id = %sale.id, total = %sale.total, net = %sale.net(), method = %sale.payment_method, "sale recorded");
        Ok(sale)
    }

    /// Records an expense.
    pub async fn record_expense(
        &self,
        caller: Caller,
        request: &RecordExpenseRequest,
    ) -> Result<Expense, LedgerError> {
        let records = self
            .plan_and_apply(caller, TradeService::expense_accounts(request), |ctx| {
                TradeService::plan_expense(ctx, request)
            })
            .await?;
        let expense = records
            .into_iter()
            .find_map(|record| match record {
                TradeRecord::Expense(expense) => Some(expense),
                _ => None,
            })
            .ok_or_else(|| LedgerError::Storage("expense was not recorded".into()))?;
        info!(expense_id = %expense.id, amount = %expense.amount, method = %expense.payment_method, cheque_id = ?expense.cheque_id, "expense recorded");
        Ok(expense)
    }

    /// Records damaged stock.
    pub async fn record_damage(
        &self,
        caller: Caller,
        request: &RecordDamageRequest,
    ) -> Result<DamageRecord, LedgerError> {
        let records = self
            .plan_and_apply(caller, Vec::new(), |ctx| TradeService::plan_damage(ctx, request))
            .await?;
        let damage = records
            .into_iter()
            .find_map(|record| match record {
                TradeRecord::Damage(damage) => Some(damage),
                _ => None,
            })
            .ok_or_else(|| LedgerError::Storage("damage was not recorded".into()))?;
        info!(damage_id = %damage.id, loss = %damage.loss, "damage recorded");
        Ok(damage)
    }

    /// Locks accounts, plans, applies and returns the records created.
    async fn plan_and_apply(
        &self,
        caller: Caller,
        accounts: Vec<AccountRef>,
        planner: impl FnOnce(&PlanContext) -> Result<LedgerPlan, LedgerError>,
    ) -> Result<Vec<TradeRecord>, LedgerError> {
        let _gate = self.gate.read().await;
        let mut guards = self.store.lock_accounts(accounts).await;
        let ctx = context(caller, &guards);
        let plan = planner(&ctx).inspect_err(|e| warn!(error = %e, "trade record rejected"))?;
        let records = plan.records.clone();
        self.store
            .apply(plan, &mut guards, &mut ChequeGuards::new())?;
        Ok(records)
    }

    // ========== Reports ==========

    /// Builds a period report from one consistent view of every record.
    pub async fn report(&self, period: ReportPeriod) -> Result<ReportTotals, ReportError> {
        let _gate = self.gate.write().await;
        let slots: Vec<_> = self
            .store
            .accounts
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        let mut snapshot = ReportSnapshot::default();
        for slot in slots {
            let state = slot.lock().await;
            snapshot.accounts.push(state.account.clone());
            snapshot.transactions.extend(state.transactions.iter().cloned());
        }
        snapshot.cheques = self.all_cheques().await;
        snapshot.sales = self.store.sales.iter().map(|e| e.value().clone()).collect();
        snapshot.expenses = self.store.expenses.iter().map(|e| e.value().clone()).collect();
        snapshot.returns = self.store.returns.iter().map(|e| e.value().clone()).collect();
        snapshot.damages = self.store.damages.iter().map(|e| e.value().clone()).collect();
        ReportService::aggregate(period, &snapshot)
    }

    /// Ids of every transaction posted to an account.
    pub async fn transaction_ids(&self, reference: AccountRef) -> Result<BTreeSet<TransactionId>, LedgerError> {
        let slot = self.account_slot(reference)?;
        let state = slot.lock().await;
        Ok(state.transactions.iter().map(|t| t.id).collect())
    }
}

/// Snapshot of the locked accounts for a planning call.
fn context(caller: Caller, guards: &AccountGuards) -> PlanContext {
    let accounts = guards
        .values()
        .map(|state| state.account.clone())
        .collect::<AccountSnapshot>();
    PlanContext::new(caller.role, caller.now, accounts)
}
