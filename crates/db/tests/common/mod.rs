//! Shared fixtures for repository tests.

#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use khata_core::account::{Account, AccountKind, OpenAccountRequest};
use khata_core::mutation::MutationRequest;
use khata_db::{Caller, LedgerRepository};
use khata_shared::Role;
use rust_decimal::Decimal;

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).unwrap()
}

pub fn staff() -> Caller {
    Caller::at(Role::Staff, now())
}

pub fn owner() -> Caller {
    Caller::at(Role::Owner, now())
}

pub fn viewer() -> Caller {
    Caller::at(Role::Viewer, now())
}

pub fn cheque_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
}

pub async fn open(
    repo: &LedgerRepository,
    kind: AccountKind,
    name: &str,
    opening: Option<Decimal>,
) -> Account {
    repo.create_account(
        owner(),
        &OpenAccountRequest {
            kind,
            name: name.to_string(),
            opening_balance: opening,
        },
    )
    .await
    .unwrap()
}

pub fn mutation(operation: &str, amount: Decimal, method: &str) -> MutationRequest {
    MutationRequest {
        operation: operation.to_string(),
        amount,
        payment_method: method.to_string(),
        bank_id: None,
        cheque_date: None,
        description: String::new(),
        proof_image: None,
        entry_date: None,
    }
}

pub fn cheque_mutation(operation: &str, amount: Decimal) -> MutationRequest {
    MutationRequest {
        cheque_date: Some(cheque_date()),
        proof_image: Some("proofs/2025/06/cheque.png".to_string()),
        ..mutation(operation, amount, "cheque")
    }
}
