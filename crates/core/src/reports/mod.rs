//! Period reports.
//!
//! A read-side projection over accounts, cheques, transactions and trade
//! records:
//! - Fund balances and pending cheques as of now
//! - Receivables and payables per counterparty kind
//! - Profit and loss for a calendar day, month or year

pub mod error;
pub mod service;
pub mod types;


pub use error::ReportError;
pub use service::ReportService;
pub use types::*;
