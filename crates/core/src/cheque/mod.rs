//! Cheque lifecycle.
//!
//! A cheque is in exactly one of pending, cleared, cancelled,
//! transferred-pending or transferred-cashed. Supplier, shipper and product
//! cheques are payouts: clearing debits the destination. Customer cheques are
//! receipts: clearing credits it.

pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;
#[cfg(test)]
mod tests;

pub use service::ChequeService;
pub use types::{
    CashOutDestination, CashOutItem, Cheque, ChequeAction, ChequeEffect, ChequeFlags, ChequeState,
    ChequeType, ChequeView, TransferTargetType,
};
