//! Trade records: sales, expenses, product returns and damage write-offs.

pub mod service;
pub mod types;


pub use service::TradeService;
pub use types::{
    DamageRecord, Expense, ExpenseKind, ProductReturn, RecordDamageRequest, RecordExpenseRequest,
    RecordSaleRequest, Sale,
};
