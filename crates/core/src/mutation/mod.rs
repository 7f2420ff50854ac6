//! Balance mutation rules.
//!
//! Decides every side effect of adding to, subtracting from, discounting or
//! refunding an account, given the payment method:
//! - `cash` and `online` move the cash box or a bank immediately
//! - `cheque` recognizes the counterparty balance now and leaves a pending cheque
//! - `owncheque` moves the bank immediately and keeps a cleared cheque as audit trail
//! - `credit` only touches the counterparty balance

pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use service::MutationService;
pub use types::{FundFlow, MutationRequest};
