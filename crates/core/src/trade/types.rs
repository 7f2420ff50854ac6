//! Sales, expenses, returns and damage write-offs.

use chrono::{DateTime, NaiveDate, Utc};
use khata_shared::types::{AccountId, ChequeId, DamageId, ExpenseId, OperationId, ReturnId, SaleId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::PaymentMethod;

/// A recorded sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    /// Sale ID.
    pub id: SaleId,
    /// Operation that recorded it.
    pub operation_id: OperationId,
    /// Customer, required for credit sales.
    pub customer_id: Option<AccountId>,
    /// Invoice total before discount.
    pub total: Decimal,
    /// Cost of the goods sold.
    pub cost_of_goods: Decimal,
    /// Discount given on the invoice.
    pub discount: Decimal,
    /// `cash`, `online` or `credit`.
    pub payment_method: PaymentMethod,
    /// Bank for online sales.
    pub bank_id: Option<AccountId>,
    /// Description.
    pub description: String,
    /// Proof-of-payment key.
    pub proof_image: Option<String>,
    /// Ledger date.
    pub entry_date: NaiveDate,
    /// When it was recorded.
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Amount actually owed or received. Saturates at the range limits.
    #[must_use]
    pub fn net(&self) -> Decimal {
        self.total.saturating_sub(self.discount)
    }
}

/// Kind of expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExpenseKind {
    /// Rent, wages, utilities.
    Operating,
    /// Stock bought for resale.
    ProductPurchase,
}

/// A recorded expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    /// Expense ID.
    pub id: ExpenseId,
    /// Operation that recorded it.
    pub operation_id: OperationId,
    /// Kind.
    pub kind: ExpenseKind,
    /// Free-form category.
    pub category: String,
    /// Amount.
    pub amount: Decimal,
    /// `cash`, `online`, `cheque` or `owncheque`.
    pub payment_method: PaymentMethod,
    /// Bank used, if any.
    pub bank_id: Option<AccountId>,
    /// Cheque issued, if any.
    pub cheque_id: Option<ChequeId>,
    /// Description.
    pub description: String,
    /// Ledger date.
    pub entry_date: NaiveDate,
    /// When it was recorded.
    pub created_at: DateTime<Utc>,
    /// Undone by cancelling or transferring its cheque.
    pub reversed: bool,
}

/// Goods a customer brought back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductReturn {
    /// Return ID.
    pub id: ReturnId,
    /// Operation that recorded it.
    pub operation_id: OperationId,
    /// Customer returning the goods.
    pub customer_id: AccountId,
    /// Value of the returned goods.
    pub amount: Decimal,
    /// How the refund was made.
    pub payment_method: PaymentMethod,
    /// Description.
    pub description: String,
    /// Ledger date.
    pub entry_date: NaiveDate,
    /// When it was recorded.
    pub created_at: DateTime<Utc>,
}

/// Stock written off as damaged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DamageRecord {
    /// Record ID.
    pub id: DamageId,
    /// Description of the damaged goods.
    pub description: String,
    /// Units lost.
    pub quantity: Decimal,
    /// Cost per unit.
    pub unit_cost: Decimal,
    /// `quantity × unit_cost`.
    pub loss: Decimal,
    /// Ledger date.
    pub entry_date: NaiveDate,
    /// When it was recorded.
    pub created_at: DateTime<Utc>,
}

/// Request to record a sale.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSaleRequest {
    /// Customer, required for credit sales.
    #[serde(default)]
    pub customer_id: Option<AccountId>,
    /// Invoice total.
    pub total: Decimal,
    /// Cost of goods sold.
    #[serde(default)]
    pub cost_of_goods: Decimal,
    /// Discount on the invoice.
    #[serde(default)]
    pub discount: Decimal,
    /// Payment method name.
    pub payment_method: String,
    /// Bank for online sales.
    #[serde(default)]
    pub bank_id: Option<AccountId>,
    /// Proof-of-payment key.
    #[serde(default)]
    pub proof_image: Option<String>,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Ledger date.
    #[serde(default)]
    pub entry_date: Option<NaiveDate>,
}

/// Request to record an expense.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordExpenseRequest {
    /// Kind.
    pub kind: ExpenseKind,
    /// Category.
    #[serde(default)]
    pub category: String,
    /// Amount.
    pub amount: Decimal,
    /// Payment method name.
    pub payment_method: String,
    /// Bank, required for online and own-cheque payments.
    #[serde(default)]
    pub bank_id: Option<AccountId>,
    /// Cheque date for cheque payments.
    #[serde(default)]
    pub cheque_date: Option<NaiveDate>,
    /// Proof-of-payment key.
    #[serde(default)]
    pub proof_image: Option<String>,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Ledger date.
    #[serde(default)]
    pub entry_date: Option<NaiveDate>,
}

/// Request to record damaged stock.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDamageRequest {
    /// Description of the goods.
    pub description: String,
    /// Units lost.
    pub quantity: Decimal,
    /// Cost per unit.
    pub unit_cost: Decimal,
    /// Ledger date.
    #[serde(default)]
    pub entry_date: Option<NaiveDate>,
}
