//! Persistence layer for Khata.
//!
//! This crate provides:
//! - An in-memory store of accounts, transactions, cheques and trade records
//! - Per-account locking so concurrent writes to one account never lose updates
//! - The repository every HTTP handler goes through

pub mod repository;
mod store;

pub use repository::{CashOutOutcome, Caller, LedgerRepository};
pub use store::AccountState;
