//! Core business logic for Khata.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Every operation is a function of its explicit inputs: the request, the
//! caller's role, the locked account snapshot and the current time. Writes are
//! returned as a [`ledger::LedgerPlan`] for the persistence layer to apply.
//!
//! # Modules
//!
//! - `account` - Customers, suppliers, shippers, banks and the cash box
//! - `ledger` - Ledger entry model, running balance and operation plans
//! - `mutation` - Balance mutation rules per payment method
//! - `cheque` - Cheque state machine
//! - `trade` - Sales, expenses, returns and damage write-offs
//! - `reports` - Period reports
//! - `storage` - Proof-of-payment file storage

pub mod account;
pub mod cheque;
pub mod ledger;
pub mod mutation;
pub mod reports;
pub mod storage;
pub mod trade;
