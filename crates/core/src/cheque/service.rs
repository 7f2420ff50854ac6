//! Cheque state machine.
//!
//! ```text
//! pending ──cash out──────────────► cleared
//!    │ ───cancel──────────────────► cancelled
//!    └────transfer──► transferred_pending ──cash out transferred──► transferred_cashed
//!                            └──────cancel transferred───────────► cancelled
//! ```
//!
//! Only clearing touches bank or cash. Cancel and transfer move the
//! counterparty effect recognized when the cheque was written.

use khata_shared::types::{AccountId, TransactionId};
use rust_decimal::Decimal;

use super::types::{CashOutDestination, Cheque, ChequeAction, ChequeEffect, ChequeState, TransferTargetType};
use crate::account::AccountRef;
use crate::ledger::{
    EntrySource, LedgerError, LedgerPlan, PaymentMethod, PlanContext, Transaction,
    TransactionDirection,
};

/// Cheque service for lifecycle transitions.
pub struct ChequeService;

impl ChequeService {
    /// Accounts a transition reads or writes, for locking.
    ///
    /// Returns an empty list for actions that cannot resolve their accounts;
    /// planning then reports the missing input.
    #[must_use]
    pub fn accounts_touched(cheque: &Cheque, action: &ChequeAction) -> Vec<AccountRef> {
        let mut accounts = Vec::new();
        match action {
            ChequeAction::CashOut {
                destination,
                bank_id,
            } => {
                if let Some(destination) = Self::destination(cheque, *destination, *bank_id) {
                    accounts.push(destination);
                }
            }
            ChequeAction::Cancel { .. } | ChequeAction::CancelTransferred { .. } => {
                if let ChequeEffect::Account { account, .. } = cheque.effect {
                    accounts.push(account);
                }
            }
            ChequeAction::Transfer {
                target_type,
                target_id,
            } => {
                if let ChequeEffect::Account { account, .. } = cheque.effect {
                    accounts.push(account);
                }
                accounts.push(Self::transfer_target(*target_type, *target_id));
            }
            ChequeAction::CashOutTransferred => {}
        }
        accounts.sort();
        accounts.dedup();
        accounts
    }

    /// Plans one transition.
    pub fn plan_transition(
        ctx: &PlanContext,
        cheque: &Cheque,
        action: &ChequeAction,
    ) -> Result<LedgerPlan, LedgerError> {
        if cheque.own_cheque || cheque.state != action.required_state() {
            return Err(LedgerError::InvalidChequeState {
                cheque_id: cheque.id.to_string(),
                state: cheque.state.as_str(),
                action: action.name(),
            });
        }

        match action {
            ChequeAction::Cancel { .. } | ChequeAction::CancelTransferred { .. } => {
                ctx.require_privileged("cancel a cheque")?;
            }
            _ => ctx.require_write("change a cheque")?,
        }

        let mut plan = LedgerPlan::new();
        let mut updated = cheque.clone();
        updated.updated_at = ctx.now;

        match *action {
            ChequeAction::CashOut {
                destination,
                bank_id,
            } => {
                let fund = Self::resolve_destination(ctx, cheque, destination, bank_id)?;
                let direction = if cheque.is_payout() {
                    TransactionDirection::Debit
                } else {
                    TransactionDirection::Credit
                };
                let mut entry = Transaction::draft(
                    plan.operation_id,
                    fund,
                    cheque.amount,
                    EntrySource::fund(fund.kind(), direction),
                    format!("Cheque {} cashed out", cheque.id),
                    ctx.today(),
                    ctx.now,
                );
                entry.payment_method = Some(PaymentMethod::Cheque);
                entry.cheque_id = Some(cheque.id);
                entry.cheque_date = Some(cheque.cheque_date);
                entry.bank_id = match fund {
                    AccountRef::Bank(id) => Some(id),
                    _ => None,
                };
                plan.post(entry)?;

                updated.state = ChequeState::Cleared;
                updated.cleared_to = Some(fund);
            }
            ChequeAction::Cancel { confirm } | ChequeAction::CancelTransferred { confirm } => {
                if !confirm {
                    return Err(LedgerError::field(
                        "confirm",
                        "cancelling a cheque is irreversible and must be confirmed",
                    ));
                }
                Self::reverse_effect(ctx, cheque, &mut plan)?;
                updated.state = ChequeState::Cancelled;
            }
            ChequeAction::Transfer {
                target_type,
                target_id,
            } => {
                let target = Self::transfer_target(target_type, target_id);
                ctx.account(&target)?;
                if matches!(cheque.effect, ChequeEffect::Account { account, .. } if account == target)
                {
                    return Err(LedgerError::field(
                        "targetId",
                        "cheque is already held against this account",
                    ));
                }

                Self::reverse_effect(ctx, cheque, &mut plan)?;

                let delta = match target_type {
                    TransferTargetType::Customer => cheque.amount,
                    TransferTargetType::Supplier => -cheque.amount,
                };
                let direction = if delta > Decimal::ZERO {
                    TransactionDirection::Credit
                } else {
                    TransactionDirection::Debit
                };
                let mut entry = Transaction::draft(
                    plan.operation_id,
                    target,
                    cheque.amount,
                    EntrySource::Payment { direction },
                    format!("Cheque {} transferred", cheque.id),
                    ctx.today(),
                    ctx.now,
                );
                entry.payment_method = Some(PaymentMethod::Cheque);
                entry.cheque_id = Some(cheque.id);
                entry.cheque_date = Some(cheque.cheque_date);
                let transaction_id: TransactionId = entry.id;
                plan.post(entry)?;

                updated.effect = ChequeEffect::Account {
                    account: target,
                    transaction_id,
                    delta,
                };
                updated.transferred_to = Some(target);
                updated.state = ChequeState::TransferredPending;
            }
            ChequeAction::CashOutTransferred => {
                updated.state = ChequeState::TransferredCashed;
            }
        }

        plan.ensure_funds(&ctx.accounts)?;
        plan.cheque = Some(updated);
        Ok(plan)
    }

    /// Linked bank wins over the supplied one.
    fn destination(
        cheque: &Cheque,
        destination: CashOutDestination,
        bank_id: Option<AccountId>,
    ) -> Option<AccountRef> {
        match destination {
            CashOutDestination::Cash => Some(AccountRef::Cash),
            CashOutDestination::Bank => cheque.bank_id.or(bank_id).map(AccountRef::Bank),
        }
    }

    fn resolve_destination(
        ctx: &PlanContext,
        cheque: &Cheque,
        destination: CashOutDestination,
        bank_id: Option<AccountId>,
    ) -> Result<AccountRef, LedgerError> {
        let Some(fund) = Self::destination(cheque, destination, bank_id) else {
            return Err(LedgerError::field(
                "bankId",
                "is required when cashing out to a bank without a linked bank",
            ));
        };
        if !ctx.accounts.contains(&fund) {
            return Err(LedgerError::field("bankId", format!("unknown bank {fund}")));
        }
        Ok(fund)
    }

    fn transfer_target(
        target_type: TransferTargetType,
        target_id: AccountId,
    ) -> AccountRef {
        match target_type {
            TransferTargetType::Customer => AccountRef::Customer(target_id),
            TransferTargetType::Supplier => AccountRef::Supplier(target_id),
        }
    }

    fn reverse_effect(
        ctx: &PlanContext,
        cheque: &Cheque,
        plan: &mut LedgerPlan,
    ) -> Result<(), LedgerError> {
        match cheque.effect {
            ChequeEffect::Account {
                account,
                transaction_id,
                delta,
            } => {
                ctx.account(&account)?;
                plan.reverse(account, transaction_id, delta)?;
            }
            ChequeEffect::Expense { expense_id } => {
                plan.reversed_expense = Some(expense_id);
            }
        }
        Ok(())
    }
}
