//! Report data types.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::ReportError;
use crate::account::{Account, AccountKind};
use crate::cheque::Cheque;
use crate::ledger::Transaction;
use crate::trade::{DamageRecord, Expense, ProductReturn, Sale};

/// A calendar reporting period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "period", rename_all = "lowercase")]
pub enum ReportPeriod {
    /// One day.
    Daily {
        /// The day.
        date: NaiveDate,
    },
    /// One calendar month.
    Monthly {
        /// Year.
        year: i32,
        /// Month, 1 to 12.
        month: u32,
    },
    /// One calendar year.
    Yearly {
        /// Year.
        year: i32,
    },
}

impl ReportPeriod {
    /// Builds a period from query parameters.
    ///
    /// `daily` needs `month` and `day`, `monthly` needs `month`.
    pub fn from_query(
        period: &str,
        year: i32,
        month: Option<u32>,
        day: Option<u32>,
    ) -> Result<Self, ReportError> {
        let month_of = |month: Option<u32>| {
            month
                .filter(|m| (1..=12).contains(m))
                .ok_or_else(|| ReportError::InvalidPeriod(format!("{period} needs a month 1-12")))
        };
        match period.trim().to_lowercase().as_str() {
            "daily" => {
                let month = month_of(month)?;
                let date = day
                    .and_then(|d| NaiveDate::from_ymd_opt(year, month, d))
                    .ok_or_else(|| {
                        ReportError::InvalidPeriod(format!("no such day in {year}-{month:02}"))
                    })?;
                Ok(Self::Daily { date })
            }
            "monthly" => {
                let month = month_of(month)?;
                NaiveDate::from_ymd_opt(year, month, 1)
                    .map(|_| Self::Monthly { year, month })
                    .ok_or_else(|| ReportError::InvalidPeriod(format!("year {year} out of range")))
            }
            "yearly" => NaiveDate::from_ymd_opt(year, 1, 1)
                .map(|_| Self::Yearly { year })
                .ok_or_else(|| ReportError::InvalidPeriod(format!("year {year} out of range"))),
            other => Err(ReportError::InvalidPeriod(format!(
                "'{other}' is not one of daily, monthly, yearly"
            ))),
        }
    }

    /// Whether a ledger date falls inside the period.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        match *self {
            Self::Daily { date: day } => date == day,
            Self::Monthly { year, month } => date.year() == year && date.month() == month,
            Self::Yearly { year } => date.year() == year,
        }
    }
}

/// Everything a report reads, taken from one consistent view.
#[derive(Debug, Clone, Default)]
pub struct ReportSnapshot {
    /// All accounts with their stored balances.
    pub accounts: Vec<Account>,
    /// All cheques.
    pub cheques: Vec<Cheque>,
    /// All stored transactions.
    pub transactions: Vec<Transaction>,
    /// All sales.
    pub sales: Vec<Sale>,
    /// All expenses.
    pub expenses: Vec<Expense>,
    /// All product returns.
    pub returns: Vec<ProductReturn>,
    /// All damage write-offs.
    pub damages: Vec<DamageRecord>,
}

/// Bank and cash balances.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundTotals {
    /// Cash box balance.
    pub cash: Decimal,
    /// Sum of all bank balances.
    pub bank_total: Decimal,
    /// Number of bank accounts.
    pub bank_count: usize,
}

/// Pending cheques awaiting clearing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingChequeTotals {
    /// Customer cheques still to be cashed.
    pub receipts: Decimal,
    /// Supplier, shipper and product cheques still to clear.
    pub payouts: Decimal,
    /// Number of pending cheques.
    pub count: usize,
}

/// Receivable and payable totals for one counterparty kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterpartyTotals {
    /// Customer, supplier or shipper.
    pub kind: AccountKind,
    /// Owed to the business.
    pub receivable: Decimal,
    /// Accounts owing the business.
    pub receivable_count: usize,
    /// Owed by the business.
    pub payable: Decimal,
    /// Accounts the business owes.
    pub payable_count: usize,
}

impl CounterpartyTotals {
    pub(crate) const fn empty(kind: AccountKind) -> Self {
        Self {
            kind,
            receivable: Decimal::ZERO,
            receivable_count: 0,
            payable: Decimal::ZERO,
            payable_count: 0,
        }
    }
}

/// Profit and loss for the period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitAndLoss {
    /// Sale totals before discount.
    pub gross_sales: Decimal,
    /// Discounts given on sales.
    pub sale_discounts: Decimal,
    /// Goods returned by customers.
    pub returns: Decimal,
    /// `gross_sales - sale_discounts - returns`.
    pub net_revenue: Decimal,
    /// Cost of goods sold.
    pub cost_of_goods: Decimal,
    /// `net_revenue - cost_of_goods`.
    pub gross_profit: Decimal,
    /// Operating expenses.
    pub operating_expenses: Decimal,
    /// Stock bought, already covered by cost of goods.
    pub product_purchases: Decimal,
    /// Balance discounts granted to customers.
    pub discounts_given: Decimal,
    /// Balance discounts received from suppliers and shippers.
    pub discounts_received: Decimal,
    /// Damaged stock written off.
    pub damage_loss: Decimal,
    /// Bottom line.
    pub net_profit: Decimal,
}

/// A complete period report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTotals {
    /// Requested period.
    pub period: ReportPeriod,
    /// Current fund balances.
    pub funds: FundTotals,
    /// Current pending cheques.
    pub pending_cheques: PendingChequeTotals,
    /// Current dues per counterparty kind.
    pub counterparties: Vec<CounterpartyTotals>,
    /// Period profit and loss.
    pub profit_and_loss: ProfitAndLoss,
}
