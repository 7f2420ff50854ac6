//! Property-based tests for balance mutations.
//!
//! - A customer discount within the balance lands exactly on `B - D`
//! - A discount above the balance is rejected and plans nothing
//! - Funds never go negative after a planned mutation

use chrono::Utc;
use khata_shared::Role;
use khata_shared::types::AccountId;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::service::MutationService;
use super::types::MutationRequest;
use crate::account::{Account, AccountRef, AccountSnapshot};
use crate::ledger::{LedgerError, PlanContext};

/// Strategy to generate positive decimal amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn request(operation: &str, amount: Decimal, method: &str) -> MutationRequest {
    MutationRequest {
        operation: operation.into(),
        amount,
        payment_method: method.into(),
        bank_id: None,
        cheque_date: None,
        description: String::new(),
        proof_image: None,
        entry_date: None,
    }
}

fn ctx(accounts: &[(AccountRef, Decimal)]) -> PlanContext {
    let snapshot = accounts
        .iter()
        .map(|(reference, balance)| Account {
            reference: *reference,
            name: "prop".into(),
            balance: *balance,
            created_at: Utc::now(),
        })
        .collect::<AccountSnapshot>();
    PlanContext::new(Role::Staff, Utc::now(), snapshot)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Discount D <= B on a customer with balance B > 0 yields B - D.
    #[test]
    fn prop_discount_within_balance(
        balance in positive_amount(),
        fraction in 1u32..=100u32,
    ) {
        let customer = AccountRef::Customer(AccountId::new());
        let discount = (balance * Decimal::from(fraction) / Decimal::from(100)).round_dp(2);
        prop_assume!(discount > Decimal::ZERO);

        let plan = MutationService::plan(
            &ctx(&[(customer, balance)]),
            customer,
            &request("applyDiscount", discount, "credit"),
        ).unwrap();

        prop_assert_eq!(balance + plan.delta(&customer), balance - discount);
        prop_assert!(balance + plan.delta(&customer) >= Decimal::ZERO);
    }

    /// Discount D > B is rejected.
    #[test]
    fn prop_discount_above_balance_rejected(
        balance in positive_amount(),
        excess in positive_amount(),
    ) {
        let customer = AccountRef::Customer(AccountId::new());
        let result = MutationService::plan(
            &ctx(&[(customer, balance)]),
            customer,
            &request("applyDiscount", balance + excess, "credit"),
        );
        let rejected = matches!(result, Err(LedgerError::DiscountExceedsOutstanding { .. }));
        prop_assert!(rejected, "Expected DiscountExceedsOutstanding");
    }

    /// Paying a supplier in cash either fits the cash box or is refused.
    #[test]
    fn prop_cash_never_negative(
        cash in positive_amount(),
        amount in positive_amount(),
    ) {
        let supplier = AccountRef::Supplier(AccountId::new());
        let result = MutationService::plan(
            &ctx(&[(supplier, Decimal::ZERO), (AccountRef::Cash, cash)]),
            supplier,
            &request("addBalance", amount, "cash"),
        );
        match result {
            Ok(plan) => {
                prop_assert!(amount <= cash);
                prop_assert_eq!(cash + plan.delta(&AccountRef::Cash), cash - amount);
            }
            Err(LedgerError::InsufficientFunds { .. }) => prop_assert!(amount > cash),
            Err(other) => prop_assert!(false, "unexpected error {other}"),
        }
    }
}
