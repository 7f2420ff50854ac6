//! Mutation service: validation and side effects of a balance mutation.

use khata_shared::types::{ChequeId, ReturnId};
use rust_decimal::Decimal;

use super::types::{FundFlow, MutationRequest};
use crate::account::{AccountKind, AccountRef};
use crate::cheque::{Cheque, ChequeEffect, ChequeState, ChequeType};
use crate::ledger::validation;
use crate::ledger::{
    EntrySource, LedgerError, LedgerPlan, OperationKind, PaymentMethod, PlanContext, TradeRecord,
    Transaction, ValidationErrors,
};
use crate::trade::ProductReturn;

/// Mutation service.
pub struct MutationService;

impl MutationService {
    /// Accounts a mutation reads or writes, for locking.
    #[must_use]
    pub fn accounts_touched(target: AccountRef, request: &MutationRequest) -> Vec<AccountRef> {
        let mut accounts = vec![target];
        if !target.is_fund() {
            match PaymentMethod::parse(&request.payment_method) {
                Some(PaymentMethod::Cash) => accounts.push(AccountRef::Cash),
                Some(PaymentMethod::Online | PaymentMethod::Cheque | PaymentMethod::OwnCheque) => {
                    accounts.extend(request.bank_id.map(AccountRef::Bank));
                }
                Some(PaymentMethod::Credit) | None => {}
            }
        }
        accounts.sort();
        accounts.dedup();
        accounts
    }

    /// Plans a mutation against `target`.
    ///
    /// Checks run in a fixed order: caller role, target existence, every
    /// request field, discount bounds, then fund sufficiency. Nothing is
    /// planned unless all of them pass.
    pub fn plan(
        ctx: &PlanContext,
        target: AccountRef,
        request: &MutationRequest,
    ) -> Result<LedgerPlan, LedgerError> {
        ctx.require_write("change an account balance")?;
        let account = ctx.account(&target)?;
        let kind = account.kind();
        let today = ctx.today();

        let mut errors = ValidationErrors::new();
        let operation = OperationKind::parse(&request.operation);
        if operation.is_none() {
            errors.add(
                "operation",
                format!(
                    "'{}' is not one of addBalance, subtractBalance, applyDiscount, processReturnRefund",
                    request.operation
                ),
            );
        }
        let flow = operation.and_then(|op| {
            let flow = FundFlow::of(kind, op);
            if flow.is_none() {
                errors.add("operation", format!("not available for {kind} accounts"));
            }
            flow
        });
        let amount = validation::positive_amount(&mut errors, "amount", request.amount);
        let method = validation::payment_method(&mut errors, &request.payment_method);

        let mut bank = None;
        let mut cheque_date = None;
        if let (Some(method), Some(op), Some((flow, _))) = (method, operation, flow) {
            check_method(&mut errors, kind, op, flow, method);
            if !kind.is_fund() {
                bank = validation::bank(&mut errors, ctx, method, request.bank_id);
                cheque_date =
                    validation::cheque_date(&mut errors, method, request.cheque_date, today);
            }
            validation::proof(&mut errors, method, request.proof_image.as_deref());
        }
        errors.finish()?;
        let (Some(operation), Some((flow, direction)), Some(amount), Some(method)) =
            (operation, flow, amount, method)
        else {
            return Err(LedgerError::field("operation", "is required"));
        };

        if operation == OperationKind::ApplyDiscount
            && (account.balance <= Decimal::ZERO || amount > account.balance)
        {
            return Err(LedgerError::DiscountExceedsOutstanding {
                outstanding: account.balance,
                requested: amount,
            });
        }

        let mut plan = LedgerPlan::new();
        let entry_date = validation::entry_date(request.entry_date, today);
        let description = describe(request, operation, method);

        if kind.is_fund() {
            let mut entry = Transaction::draft(
                plan.operation_id,
                target,
                amount,
                EntrySource::fund(kind, direction),
                description,
                entry_date,
                ctx.now,
            );
            entry.payment_method = Some(method);
            entry.bank_id = target.id().filter(|_| kind == AccountKind::Bank);
            entry.proof_image = request.proof_image.clone();
            plan.post(entry)?;
            plan.ensure_funds(&ctx.accounts)?;
            return Ok(plan);
        }

        let return_id = (operation == OperationKind::ProcessReturnRefund).then(ReturnId::new);
        let cheque_id = method.requires_cheque_date().then(ChequeId::new);
        let source = match (operation, return_id) {
            (OperationKind::ApplyDiscount, _) => EntrySource::Discount,
            (_, Some(return_id)) => EntrySource::Return { return_id },
            _ => EntrySource::Payment { direction },
        };
        let fund = match method {
            PaymentMethod::Cash => Some(AccountRef::Cash),
            PaymentMethod::Online | PaymentMethod::OwnCheque => bank,
            PaymentMethod::Cheque | PaymentMethod::Credit => None,
        };

        let link = |mut entry: Transaction| {
            entry.payment_method = Some(method);
            entry.bank_id = bank.and_then(AccountRef::id);
            entry.cheque_id = cheque_id;
            entry.cheque_date = cheque_date;
            entry.proof_image = request.proof_image.clone();
            entry
        };

        let entry = link(Transaction::draft(
            plan.operation_id,
            target,
            amount,
            source,
            description.clone(),
            entry_date,
            ctx.now,
        ));
        let (transaction_id, delta) = (entry.id, entry.signed_amount());
        plan.post(entry)?;

        if let (Some(fund), Some(fund_direction)) = (fund, flow.fund_direction()) {
            plan.post(link(Transaction::draft(
                plan.operation_id,
                fund,
                amount,
                EntrySource::fund(fund.kind(), fund_direction),
                description.clone(),
                entry_date,
                ctx.now,
            )))?;
        }

        if let Some(cheque_id) = cheque_id {
            let Some(cheque_type) = ChequeType::for_counterparty(kind) else {
                return Err(LedgerError::field("paymentMethod", "cheques need a counterparty"));
            };
            let own = method == PaymentMethod::OwnCheque;
            plan.cheque = Some(Cheque {
                id: cheque_id,
                operation_id: plan.operation_id,
                amount,
                cheque_type,
                bank_id: bank.and_then(AccountRef::id),
                cheque_date: cheque_date.unwrap_or(today),
                state: if own {
                    ChequeState::Cleared
                } else {
                    ChequeState::Pending
                },
                own_cheque: own,
                effect: ChequeEffect::Account {
                    account: target,
                    transaction_id,
                    delta,
                },
                transferred_to: None,
                cleared_to: if own { fund } else { None },
                cheque_image: request.proof_image.clone(),
                description: description.clone(),
                created_at: ctx.now,
                updated_at: ctx.now,
            });
        }

        if let (Some(return_id), Some(customer_id)) = (return_id, target.id()) {
            plan.records.push(TradeRecord::Return(ProductReturn {
                id: return_id,
                operation_id: plan.operation_id,
                customer_id,
                amount,
                payment_method: method,
                description,
                entry_date,
                created_at: ctx.now,
            }));
        }

        plan.ensure_funds(&ctx.accounts)?;
        Ok(plan)
    }
}

/// Method rules that depend on the account kind and operation.
fn check_method(
    errors: &mut ValidationErrors,
    kind: AccountKind,
    operation: OperationKind,
    flow: FundFlow,
    method: PaymentMethod,
) {
    match kind {
        AccountKind::Bank if method != PaymentMethod::Online => {
            errors.add("paymentMethod", "bank deposits and withdrawals are online");
            return;
        }
        AccountKind::Cash if method != PaymentMethod::Cash => {
            errors.add("paymentMethod", "cash deposits and withdrawals are cash");
            return;
        }
        AccountKind::Bank | AccountKind::Cash => return,
        _ => {}
    }

    if method == PaymentMethod::OwnCheque && flow != FundFlow::Out {
        errors.add("paymentMethod", "own cheques only pay money out");
        return;
    }

    match operation {
        OperationKind::ApplyDiscount if method != PaymentMethod::Credit => {
            errors.add("paymentMethod", "discounts are ledger-only and use credit");
        }
        OperationKind::ProcessReturnRefund if method == PaymentMethod::Cheque => {
            errors.add("paymentMethod", "refunds cannot be paid with a customer cheque");
        }
        OperationKind::AddBalance | OperationKind::SubtractBalance
            if method == PaymentMethod::Cheque =>
        {
            let payout = ChequeType::for_counterparty(kind).is_some_and(ChequeType::is_payout);
            if payout != (flow == FundFlow::Out) {
                errors.add(
                    "paymentMethod",
                    format!("a {kind} cheque cannot move money this way"),
                );
            }
        }
        _ => {}
    }
}

fn describe(request: &MutationRequest, operation: OperationKind, method: PaymentMethod) -> String {
    if !request.description.trim().is_empty() {
        return request.description.trim().to_string();
    }
    let what = match operation {
        OperationKind::AddBalance => "Balance added",
        OperationKind::SubtractBalance => "Balance subtracted",
        OperationKind::ApplyDiscount => "Discount",
        OperationKind::ProcessReturnRefund => "Return",
    };
    format!("{what} ({method})")
}
