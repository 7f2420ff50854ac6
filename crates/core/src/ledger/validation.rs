//! Field validators shared by mutation and trade requests.
//!
//! Each validator records its failure in a [`ValidationErrors`] collector and
//! returns `None`, so a request reports every bad field at once.

use chrono::NaiveDate;
use khata_shared::types::{AccountId, Amount};
use rust_decimal::Decimal;

use super::error::ValidationErrors;
use super::plan::PlanContext;
use super::types::PaymentMethod;
use crate::account::AccountRef;

/// Requires a strictly positive amount.
pub fn positive_amount(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: Decimal,
) -> Option<Decimal> {
    match Amount::new(value) {
        Ok(amount) => Some(amount.value()),
        Err(e) => {
            errors.add(field, e.to_string());
            None
        }
    }
}

/// Requires zero or more.
pub fn non_negative_amount(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: Decimal,
) -> Option<Decimal> {
    if value >= Decimal::ZERO {
        Some(value)
    } else {
        errors.add(field, "must not be negative");
        None
    }
}

/// Normalizes a payment method name.
pub fn payment_method(errors: &mut ValidationErrors, raw: &str) -> Option<PaymentMethod> {
    let method = PaymentMethod::parse(raw);
    if method.is_none() {
        errors.add(
            "paymentMethod",
            format!("'{raw}' is not one of cash, online, cheque, owncheque, credit"),
        );
    }
    method
}

/// Requires and resolves the bank for bank-dependent methods.
///
/// A supplied bank is always checked, even when the method only links it.
pub fn bank(
    errors: &mut ValidationErrors,
    ctx: &PlanContext,
    method: PaymentMethod,
    bank_id: Option<AccountId>,
) -> Option<AccountRef> {
    match bank_id {
        None if method.requires_bank() => {
            errors.add("bankId", format!("is required for {method} payments"));
            None
        }
        None => None,
        Some(id) => {
            let reference = AccountRef::Bank(id);
            if ctx.accounts.contains(&reference) {
                Some(reference)
            } else {
                errors.add("bankId", format!("unknown bank {id}"));
                None
            }
        }
    }
}

/// Requires a present-or-future cheque date for cheque methods.
pub fn cheque_date(
    errors: &mut ValidationErrors,
    method: PaymentMethod,
    date: Option<NaiveDate>,
    today: NaiveDate,
) -> Option<NaiveDate> {
    if !method.requires_cheque_date() {
        return date;
    }
    match date {
        None => {
            errors.add("chequeDate", format!("is required for {method} payments"));
            None
        }
        Some(d) if d < today => {
            errors.add("chequeDate", format!("{d} is in the past"));
            None
        }
        Some(d) => Some(d),
    }
}

/// Requires a proof-of-payment image for online and cheque methods.
pub fn proof(errors: &mut ValidationErrors, method: PaymentMethod, proof: Option<&str>) {
    let missing = proof.is_none_or(|p| p.trim().is_empty());
    if method.requires_proof() && missing {
        errors.add(
            "proofImage",
            format!("is required for {method} payments"),
        );
    }
}

/// Requires non-blank text.
pub fn required_text(errors: &mut ValidationErrors, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, "must not be empty");
    }
}

/// Ledger date, defaulting to today.
#[must_use]
pub fn entry_date(date: Option<NaiveDate>, today: NaiveDate) -> NaiveDate {
    date.unwrap_or(today)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{Account, AccountSnapshot};
    use chrono::Utc;
    use khata_shared::Role;
    use rust_decimal_macros::dec;

    fn ctx_with_bank(bank: AccountId) -> PlanContext {
        let snapshot = AccountSnapshot::new().with(Account {
            reference: AccountRef::Bank(bank),
            name: "City Bank".into(),
            balance: dec!(100),
            created_at: Utc::now(),
        });
        PlanContext::new(Role::Staff, Utc::now(), snapshot)
    }

    #[test]
    fn test_amount_rules() {
        let mut errors = ValidationErrors::new();
        assert_eq!(positive_amount(&mut errors, "amount", dec!(1)), Some(dec!(1)));
        assert_eq!(positive_amount(&mut errors, "amount", dec!(0)), None);
        assert_eq!(non_negative_amount(&mut errors, "discount", dec!(0)), Some(dec!(0)));
        assert_eq!(non_negative_amount(&mut errors, "discount", dec!(-1)), None);
        assert_eq!(errors.errors().len(), 2);
    }

    #[test]
    fn test_bank_required_for_online() {
        let bank_id = AccountId::new();
        let ctx = ctx_with_bank(bank_id);
        let mut errors = ValidationErrors::new();

        assert_eq!(bank(&mut errors, &ctx, PaymentMethod::Online, None), None);
        assert!(errors.has("bankId"));

        let mut errors = ValidationErrors::new();
        assert_eq!(
            bank(&mut errors, &ctx, PaymentMethod::OwnCheque, Some(bank_id)),
            Some(AccountRef::Bank(bank_id))
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn test_cheque_bank_optional_but_checked() {
        let ctx = ctx_with_bank(AccountId::new());
        let mut errors = ValidationErrors::new();
        assert_eq!(bank(&mut errors, &ctx, PaymentMethod::Cheque, None), None);
        assert!(errors.is_empty());

        bank(&mut errors, &ctx, PaymentMethod::Cheque, Some(AccountId::new()));
        assert!(errors.has("bankId"));
    }

    #[test]
    fn test_cheque_date_rules() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let mut errors = ValidationErrors::new();
        assert_eq!(
            cheque_date(&mut errors, PaymentMethod::Cheque, Some(today), today),
            Some(today)
        );
        assert!(errors.is_empty());

        let yesterday = NaiveDate::from_ymd_opt(2025, 5, 31).unwrap();
        cheque_date(&mut errors, PaymentMethod::OwnCheque, Some(yesterday), today);
        assert!(errors.has("chequeDate"));

        let mut errors = ValidationErrors::new();
        cheque_date(&mut errors, PaymentMethod::Cheque, None, today);
        assert!(errors.has("chequeDate"));

        let mut errors = ValidationErrors::new();
        assert_eq!(cheque_date(&mut errors, PaymentMethod::Cash, None, today), None);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_proof_rules() {
        let mut errors = ValidationErrors::new();
        proof(&mut errors, PaymentMethod::Cash, None);
        proof(&mut errors, PaymentMethod::Online, Some("proofs/2025/06/a.png"));
        assert!(errors.is_empty());

        proof(&mut errors, PaymentMethod::Cheque, Some("  "));
        assert!(errors.has("proofImage"));
    }
}
