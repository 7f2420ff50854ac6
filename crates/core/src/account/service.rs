//! Account service for opening new accounts.

use chrono::{DateTime, Utc};
use khata_shared::types::AccountId;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::types::{Account, AccountKind, AccountRef};
use crate::ledger::validation;
use crate::ledger::{
    EntrySource, LedgerError, LedgerPlan, PlanContext, Transaction, TransactionDirection,
    ValidationErrors,
};

/// Request to open an account.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenAccountRequest {
    /// Kind of account. Cash cannot be opened.
    pub kind: AccountKind,
    /// Display name.
    pub name: String,
    /// Signed opening balance in the kind's convention.
    #[serde(default)]
    pub opening_balance: Option<Decimal>,
}

/// Account service.
pub struct AccountService;

impl AccountService {
    /// Plans a new account.
    ///
    /// The returned account starts at zero. A non-zero opening balance is
    /// posted as an `opening` transaction in the plan, so the balance always
    /// equals the sum of its transactions.
    pub fn open(
        ctx: &PlanContext,
        request: &OpenAccountRequest,
    ) -> Result<(Account, LedgerPlan), LedgerError> {
        ctx.require_write("open an account")?;

        let mut errors = ValidationErrors::new();
        if request.kind == AccountKind::Cash {
            errors.add("kind", "the cash account already exists");
        }
        validation::required_text(&mut errors, "name", &request.name);
        let opening = request.opening_balance.unwrap_or(Decimal::ZERO);
        if request.kind.is_fund() && opening < Decimal::ZERO {
            errors.add("openingBalance", "bank accounts cannot open overdrawn");
        }
        errors.finish()?;

        let account = Account {
            reference: AccountRef::with_id(request.kind, AccountId::new()),
            name: request.name.trim().to_string(),
            balance: Decimal::ZERO,
            created_at: ctx.now,
        };

        let mut plan = LedgerPlan::new();
        if !opening.is_zero() {
            let direction = if opening > Decimal::ZERO {
                TransactionDirection::Credit
            } else {
                TransactionDirection::Debit
            };
            plan.post(Transaction::draft(
                plan.operation_id,
                account.reference,
                opening.abs(),
                EntrySource::Opening { direction },
                "Opening balance",
                ctx.today(),
                ctx.now,
            ))?;
        }
        Ok((account, plan))
    }

    /// Plans the singleton cash account with its opening balance.
    pub fn open_cash(
        opening_balance: Decimal,
        now: DateTime<Utc>,
    ) -> Result<(Account, LedgerPlan), LedgerError> {
        if opening_balance < Decimal::ZERO {
            return Err(LedgerError::field(
                "cashOpeningBalance",
                "the cash box cannot open negative",
            ));
        }
        let account = Account {
            reference: AccountRef::Cash,
            name: "Cash".to_string(),
            balance: Decimal::ZERO,
            created_at: now,
        };
        let mut plan = LedgerPlan::new();
        if opening_balance > Decimal::ZERO {
            plan.post(Transaction::draft(
                plan.operation_id,
                AccountRef::Cash,
                opening_balance,
                EntrySource::Opening {
                    direction: TransactionDirection::Credit,
                },
                "Opening balance",
                now.date_naive(),
                now,
            ))?;
        }
        Ok((account, plan))
    }
}
