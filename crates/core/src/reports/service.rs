//! Report generation service.

use rust_decimal::Decimal;

use super::error::ReportError;
use super::types::{
    CounterpartyTotals, FundTotals, PendingChequeTotals, ProfitAndLoss, ReportPeriod,
    ReportSnapshot, ReportTotals,
};
use crate::account::AccountKind;
use crate::cheque::ChequeState;
use crate::ledger::EntrySource;
use crate::trade::ExpenseKind;

/// Service for generating period reports.
pub struct ReportService;

impl ReportService {
    /// Aggregates a snapshot into report totals.
    ///
    /// Balances and pending cheques are current; profit and loss covers only
    /// records dated inside `period`. Reversed entries never count. A figure
    /// that leaves the decimal range fails the whole report.
    pub fn aggregate(
        period: ReportPeriod,
        snapshot: &ReportSnapshot,
    ) -> Result<ReportTotals, ReportError> {
        Ok(ReportTotals {
            period,
            funds: Self::funds(snapshot)?,
            pending_cheques: Self::pending_cheques(snapshot)?,
            counterparties: Self::counterparties(snapshot)?,
            profit_and_loss: Self::profit_and_loss(period, snapshot)?,
        })
    }

    fn funds(snapshot: &ReportSnapshot) -> Result<FundTotals, ReportError> {
        let mut funds = FundTotals::default();
        for account in &snapshot.accounts {
            match account.kind() {
                AccountKind::Cash => accumulate(&mut funds.cash, account.balance, "cash")?,
                AccountKind::Bank => {
                    accumulate(&mut funds.bank_total, account.balance, "bankTotal")?;
                    funds.bank_count += 1;
                }
                _ => {}
            }
        }
        Ok(funds)
    }

    fn pending_cheques(snapshot: &ReportSnapshot) -> Result<PendingChequeTotals, ReportError> {
        let mut totals = PendingChequeTotals::default();
        for cheque in snapshot
            .cheques
            .iter()
            .filter(|c| c.state == ChequeState::Pending)
        {
            if cheque.is_payout() {
                accumulate(&mut totals.payouts, cheque.amount, "payouts")?;
            } else {
                accumulate(&mut totals.receipts, cheque.amount, "receipts")?;
            }
            totals.count += 1;
        }
        Ok(totals)
    }

    fn counterparties(snapshot: &ReportSnapshot) -> Result<Vec<CounterpartyTotals>, ReportError> {
        let mut totals = [
            CounterpartyTotals::empty(AccountKind::Customer),
            CounterpartyTotals::empty(AccountKind::Supplier),
            CounterpartyTotals::empty(AccountKind::Shipper),
        ];
        for account in &snapshot.accounts {
            let Some(entry) = totals.iter_mut().find(|t| t.kind == account.kind()) else {
                continue;
            };
            // Customers owe on a positive balance, suppliers and shippers are owed.
            let owed_to_business = if account.kind() == AccountKind::Customer {
                account.balance
            } else {
                -account.balance
            };
            if owed_to_business > Decimal::ZERO {
                accumulate(&mut entry.receivable, owed_to_business, "receivable")?;
                entry.receivable_count += 1;
            } else if owed_to_business < Decimal::ZERO {
                accumulate(&mut entry.payable, -owed_to_business, "payable")?;
                entry.payable_count += 1;
            }
        }
        Ok(totals.to_vec())
    }

    fn profit_and_loss(
        period: ReportPeriod,
        snapshot: &ReportSnapshot,
    ) -> Result<ProfitAndLoss, ReportError> {
        let mut pl = ProfitAndLoss::default();

        for sale in snapshot.sales.iter().filter(|s| period.contains(s.entry_date)) {
            accumulate(&mut pl.gross_sales, sale.total, "grossSales")?;
            accumulate(&mut pl.sale_discounts, sale.discount, "saleDiscounts")?;
            accumulate(&mut pl.cost_of_goods, sale.cost_of_goods, "costOfGoods")?;
        }
        for ret in snapshot.returns.iter().filter(|r| period.contains(r.entry_date)) {
            accumulate(&mut pl.returns, ret.amount, "returns")?;
        }

        for expense in snapshot
            .expenses
            .iter()
            .filter(|e| !e.reversed && period.contains(e.entry_date))
        {
            match expense.kind {
                ExpenseKind::Operating => {
                    accumulate(&mut pl.operating_expenses, expense.amount, "operatingExpenses")?;
                }
                ExpenseKind::ProductPurchase => {
                    accumulate(&mut pl.product_purchases, expense.amount, "productPurchases")?;
                }
            }
        }

        for tx in snapshot.transactions.iter().filter(|t| {
            !t.reversed && t.source == EntrySource::Discount && period.contains(t.entry_date)
        }) {
            match tx.account.kind() {
                AccountKind::Customer => {
                    accumulate(&mut pl.discounts_given, tx.amount, "discountsGiven")?;
                }
                AccountKind::Supplier | AccountKind::Shipper => {
                    accumulate(&mut pl.discounts_received, tx.amount, "discountsReceived")?;
                }
                AccountKind::Bank | AccountKind::Cash => {}
            }
        }

        for damage in snapshot.damages.iter().filter(|d| period.contains(d.entry_date)) {
            accumulate(&mut pl.damage_loss, damage.loss, "damageLoss")?;
        }

        pl.net_revenue = subtract(pl.gross_sales, &[pl.sale_discounts, pl.returns], "netRevenue")?;
        pl.gross_profit = subtract(pl.net_revenue, &[pl.cost_of_goods], "grossProfit")?;
        let before_received = subtract(
            pl.gross_profit,
            &[pl.operating_expenses, pl.discounts_given, pl.damage_loss],
            "netProfit",
        )?;
        pl.net_profit = before_received
            .checked_add(pl.discounts_received)
            .ok_or(ReportError::Overflow("netProfit"))?;
        Ok(pl)
    }
}

fn accumulate(total: &mut Decimal, value: Decimal, figure: &'static str) -> Result<(), ReportError> {
    *total = total
        .checked_add(value)
        .ok_or(ReportError::Overflow(figure))?;
    Ok(())
}

fn subtract(from: Decimal, amounts: &[Decimal], figure: &'static str) -> Result<Decimal, ReportError> {
    amounts.iter().try_fold(from, |acc, amount| {
        acc.checked_sub(*amount).ok_or(ReportError::Overflow(figure))
    })
}
