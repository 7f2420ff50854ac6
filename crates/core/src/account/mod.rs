//! Customer, supplier, shipper, bank and cash accounts.
//!
//! Counterparty balances follow their own sign convention:
//! - Customer: positive means the customer owes the business.
//! - Supplier / Shipper: positive means the business owes them, negative means prepaid.
//! - Bank / Cash: available funds, never negative after a validated operation.

pub mod service;
pub mod types;

pub use service::{AccountService, OpenAccountRequest};
pub use types::{Account, AccountKind, AccountRef, AccountSnapshot, CASH_ACCOUNT_KEY};
