//! Trade service: sales, expenses and damage write-offs.

use khata_shared::types::{ChequeId, DamageId, ExpenseId, OperationId, SaleId};
use rust_decimal::Decimal;

use super::types::{
    DamageRecord, Expense, ExpenseKind, RecordDamageRequest, RecordExpenseRequest,
    RecordSaleRequest, Sale,
};
use crate::account::AccountRef;
use crate::cheque::{Cheque, ChequeEffect, ChequeState, ChequeType};
use crate::ledger::validation;
use crate::ledger::{
    EntrySource, LedgerError, LedgerPlan, PaymentMethod, PlanContext, TradeRecord, Transaction,
    ValidationErrors,
};

/// Trade service for recording sales, expenses and damage.
pub struct TradeService;

impl TradeService {
    /// Accounts a sale reads or writes.
    #[must_use]
    pub fn sale_accounts(request: &RecordSaleRequest) -> Vec<AccountRef> {
        let mut accounts = Vec::new();
        if let Some(customer) = request.customer_id {
            accounts.push(AccountRef::Customer(customer));
        }
        match PaymentMethod::parse(&request.payment_method) {
            Some(PaymentMethod::Cash) => accounts.push(AccountRef::Cash),
            Some(PaymentMethod::Online) => {
                accounts.extend(request.bank_id.map(AccountRef::Bank));
            }
            _ => {}
        }
        accounts
    }

    /// Accounts an expense reads or writes.
    #[must_use]
    pub fn expense_accounts(request: &RecordExpenseRequest) -> Vec<AccountRef> {
        match PaymentMethod::parse(&request.payment_method) {
            Some(PaymentMethod::Cash) => vec![AccountRef::Cash],
            Some(_) => request.bank_id.map(AccountRef::Bank).into_iter().collect(),
            None => Vec::new(),
        }
    }

    /// Plans a sale.
    ///
    /// Credit sales raise the customer balance by the net amount; cash and
    /// online sales credit the fund instead.
    pub fn plan_sale(
        ctx: &PlanContext,
        request: &RecordSaleRequest,
    ) -> Result<LedgerPlan, LedgerError> {
        ctx.require_write("record a sale")?;

        let mut errors = ValidationErrors::new();
        let method = validation::payment_method(&mut errors, &request.payment_method);
        if method.is_some_and(|m| matches!(m, PaymentMethod::Cheque | PaymentMethod::OwnCheque)) {
            errors.add("paymentMethod", "sales are paid by cash, online or credit");
        }
        let total = validation::positive_amount(&mut errors, "total", request.total);
        validation::non_negative_amount(&mut errors, "costOfGoods", request.cost_of_goods);
        let discount = validation::non_negative_amount(&mut errors, "discount", request.discount);
        if let (Some(total), Some(discount)) = (total, discount)
            && discount > total
        {
            errors.add("discount", "must not exceed the sale total");
        }

        if let Some(customer) = request.customer_id
            && !ctx.accounts.contains(&AccountRef::Customer(customer))
        {
            errors.add("customerId", format!("unknown customer {customer}"));
        }
        let mut bank = None;
        if let Some(method) = method {
            if method == PaymentMethod::Credit && request.customer_id.is_none() {
                errors.add("customerId", "is required for credit sales");
            }
            if method == PaymentMethod::Online {
                bank = validation::bank(&mut errors, ctx, method, request.bank_id);
            }
            validation::proof(&mut errors, method, request.proof_image.as_deref());
        }
        errors.finish()?;
        let Some(method) = method else {
            return Err(LedgerError::field("paymentMethod", "is required"));
        };

        let sale = Sale {
            id: SaleId::new(),
            operation_id: OperationId::new(),
            customer_id: request.customer_id,
            total: request.total,
            cost_of_goods: request.cost_of_goods,
            discount: request.discount,
            payment_method: method,
            bank_id: bank.and_then(AccountRef::id),
            description: request.description.clone(),
            proof_image: request.proof_image.clone(),
            entry_date: validation::entry_date(request.entry_date, ctx.today()),
            created_at: ctx.now,
        };
        let mut plan = LedgerPlan::for_operation(sale.operation_id);

        let holder = match method {
            PaymentMethod::Credit => request.customer_id.map(AccountRef::Customer),
            PaymentMethod::Cash => Some(AccountRef::Cash),
            _ => bank,
        };
        if let Some(holder) = holder
            && sale.net() > Decimal::ZERO
        {
            let mut entry = Transaction::draft(
                plan.operation_id,
                holder,
                sale.net(),
                EntrySource::Sale { sale_id: sale.id },
                sale_description(&sale),
                sale.entry_date,
                ctx.now,
            );
            entry.payment_method = Some(method);
            entry.bank_id = sale.bank_id;
            entry.proof_image = sale.proof_image.clone();
            plan.post(entry)?;
        }

        plan.records.push(TradeRecord::Sale(sale));
        plan.ensure_funds(&ctx.accounts)?;
        Ok(plan)
    }

    /// Plans an expense.
    ///
    /// A cheque is accepted only for product purchases and leaves a pending
    /// product cheque; every other method pays from bank or cash at once.
    pub fn plan_expense(
        ctx: &PlanContext,
        request: &RecordExpenseRequest,
    ) -> Result<LedgerPlan, LedgerError> {
        ctx.require_write("record an expense")?;

        let mut errors = ValidationErrors::new();
        let method = validation::payment_method(&mut errors, &request.payment_method);
        let amount = validation::positive_amount(&mut errors, "amount", request.amount);
        let today = ctx.today();
        let mut bank = None;
        let mut cheque_date = None;
        if let Some(method) = method {
            if method == PaymentMethod::Credit {
                errors.add(
                    "paymentMethod",
                    "expenses are paid by cash, online, cheque or owncheque",
                );
            }
            if method == PaymentMethod::Cheque && request.kind == ExpenseKind::Operating {
                errors.add(
                    "paymentMethod",
                    "cheque payments are only accepted for product purchases",
                );
            }
            bank = validation::bank(&mut errors, ctx, method, request.bank_id);
            cheque_date = validation::cheque_date(&mut errors, method, request.cheque_date, today);
            validation::proof(&mut errors, method, request.proof_image.as_deref());
        }
        errors.finish()?;
        let (Some(method), Some(amount)) = (method, amount) else {
            return Err(LedgerError::field("paymentMethod", "is required"));
        };

        let mut plan = LedgerPlan::new();
        let mut expense = Expense {
            id: ExpenseId::new(),
            operation_id: plan.operation_id,
            kind: request.kind,
            category: request.category.clone(),
            amount,
            payment_method: method,
            bank_id: bank.and_then(AccountRef::id),
            cheque_id: None,
            description: request.description.clone(),
            entry_date: validation::entry_date(request.entry_date, today),
            created_at: ctx.now,
            reversed: false,
        };

        let fund = match method {
            PaymentMethod::Cash => Some(AccountRef::Cash),
            PaymentMethod::Online | PaymentMethod::OwnCheque => bank,
            PaymentMethod::Cheque | PaymentMethod::Credit => None,
        };

        if matches!(method, PaymentMethod::Cheque | PaymentMethod::OwnCheque) {
            let own = method == PaymentMethod::OwnCheque;
            let cheque = Cheque {
                id: ChequeId::new(),
                operation_id: plan.operation_id,
                amount,
                cheque_type: ChequeType::Product,
                bank_id: expense.bank_id,
                cheque_date: cheque_date.unwrap_or(today),
                state: if own {
                    ChequeState::Cleared
                } else {
                    ChequeState::Pending
                },
                own_cheque: own,
                effect: ChequeEffect::Expense {
                    expense_id: expense.id,
                },
                transferred_to: None,
                cleared_to: if own { fund } else { None },
                cheque_image: request.proof_image.clone(),
                description: expense_description(&expense),
                created_at: ctx.now,
                updated_at: ctx.now,
            };
            expense.cheque_id = Some(cheque.id);
            plan.cheque = Some(cheque);
        }

        if let Some(fund) = fund {
            let mut entry = Transaction::draft(
                plan.operation_id,
                fund,
                amount,
                EntrySource::Expense {
                    expense_id: expense.id,
                },
                expense_description(&expense),
                expense.entry_date,
                ctx.now,
            );
            entry.payment_method = Some(method);
            entry.bank_id = expense.bank_id;
            entry.cheque_id = expense.cheque_id;
            entry.cheque_date = cheque_date;
            entry.proof_image = request.proof_image.clone();
            plan.post(entry)?;
        }

        plan.records.push(TradeRecord::Expense(expense));
        plan.ensure_funds(&ctx.accounts)?;
        Ok(plan)
    }

    /// Plans a damage write-off. No balance moves.
    pub fn plan_damage(
        ctx: &PlanContext,
        request: &RecordDamageRequest,
    ) -> Result<LedgerPlan, LedgerError> {
        ctx.require_write("record damaged stock")?;

        let mut errors = ValidationErrors::new();
        validation::required_text(&mut errors, "description", &request.description);
        validation::positive_amount(&mut errors, "quantity", request.quantity);
        validation::non_negative_amount(&mut errors, "unitCost", request.unit_cost);
        errors.finish()?;
        let loss = request
            .quantity
            .checked_mul(request.unit_cost)
            .ok_or_else(|| LedgerError::field("unitCost", "quantity times unit cost is out of range"))?;

        let mut plan = LedgerPlan::new();
        plan.records.push(TradeRecord::Damage(DamageRecord {
            id: DamageId::new(),
            description: request.description.trim().to_string(),
            quantity: request.quantity,
            unit_cost: request.unit_cost,
            loss,
            entry_date: validation::entry_date(request.entry_date, ctx.today()),
            created_at: ctx.now,
        }));
        Ok(plan)
    }
}

fn sale_description(sale: &Sale) -> String {
    if sale.description.trim().is_empty() {
        format!("Sale {}", sale.id)
    } else {
        sale.description.clone()
    }
}

fn expense_description(expense: &Expense) -> String {
    if expense.description.trim().is_empty() {
        if expense.category.trim().is_empty() {
            format!("Expense {}", expense.id)
        } else {
            format!("Expense: {}", expense.category)
        }
    } else {
        expense.description.clone()
    }
}
