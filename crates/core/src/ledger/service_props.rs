//! Property-based tests for the running balance calculator.
//!
//! - Input order never changes the output
//! - Closing balance equals the signed sum of non-reversed entries
//! - Re-running on the same input is idempotent

use chrono::{Duration, TimeZone, Utc};
use khata_shared::types::{AccountId, OperationId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::entry::Transaction;
use super::service::LedgerService;
use super::types::{EntrySource, TransactionDirection};
use crate::account::{Account, AccountRef};

/// Strategy to generate positive decimal amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate a direction.
fn direction() -> impl Strategy<Value = TransactionDirection> {
    prop_oneof![
        Just(TransactionDirection::Credit),
        Just(TransactionDirection::Debit)
    ]
}

/// Strategy to generate raw entries: amount, direction, day offset, second offset, reversed.
fn raw_entries() -> impl Strategy<Value = Vec<(Decimal, TransactionDirection, i64, i64, bool)>> {
    prop::collection::vec(
        (positive_amount(), direction(), 0i64..5, 0i64..3, prop::bool::weighted(0.1)),
        1..30,
    )
}

fn build(
    account: AccountRef,
    raw: &[(Decimal, TransactionDirection, i64, i64, bool)],
) -> Vec<Transaction> {
    let base = Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap();
    raw.iter()
        .map(|(amount, direction, day, second, reversed)| {
            let created = base + Duration::days(*day) + Duration::seconds(*second);
            let mut tx = Transaction::draft(
                OperationId::new(),
                account,
                *amount,
                EntrySource::Payment {
                    direction: *direction,
                },
                "prop",
                created.date_naive(),
                created,
            );
            tx.reversed = *reversed;
            tx
        })
        .collect()
}

fn holder(account: AccountRef, balance: Decimal) -> Account {
    Account {
        reference: account,
        name: "prop".into(),
        balance,
        created_at: Utc::now(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Shuffling the input yields the same running balance sequence.
    #[test]
    fn prop_running_balance_order_independent(
        raw in raw_entries(),
        seed in any::<u64>(),
    ) {
        let reference = AccountRef::Customer(AccountId::new());
        let transactions = build(reference, &raw);

        let mut shuffled = transactions.clone();
        // Deterministic Fisher-Yates driven by the generated seed.
        let mut state = seed;
        for i in (1..shuffled.len()).rev() {
            state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            let j = usize::try_from(state % (i as u64 + 1)).unwrap();
            shuffled.swap(i, j);
        }

        let account = holder(reference, Decimal::ZERO);
        let a = LedgerService::build_ledger(&account, &transactions, &[]);
        let b = LedgerService::build_ledger(&account, &shuffled, &[]);

        let seq_a: Vec<_> = a.entries.iter().map(|e| (e.reference, e.running_balance)).collect();
        let seq_b: Vec<_> = b.entries.iter().map(|e| (e.reference, e.running_balance)).collect();
        prop_assert_eq!(seq_a, seq_b);
    }

    /// Closing balance is the signed sum of every non-reversed entry.
    #[test]
    fn prop_closing_balance_is_signed_sum(raw in raw_entries()) {
        let reference = AccountRef::Supplier(AccountId::new());
        let transactions = build(reference, &raw);
        let expected: Decimal = transactions.iter().map(Transaction::signed_amount).sum();

        let view = LedgerService::build_ledger(&holder(reference, expected), &transactions, &[]);

        prop_assert_eq!(view.closing_balance, expected);
        prop_assert!(view.reconciled);
        prop_assert_eq!(view.entries.len(), transactions.len());
        prop_assert!(LedgerService::verify(&view).is_ok());
    }

    /// Building twice yields identical output.
    #[test]
    fn prop_running_balance_idempotent(raw in raw_entries()) {
        let reference = AccountRef::Cash;
        let transactions = build(reference, &raw);
        let account = holder(reference, Decimal::ZERO);

        let first = LedgerService::build_ledger(&account, &transactions, &[]);
        let second = LedgerService::build_ledger(&account, &transactions, &[]);
        prop_assert_eq!(first, second);
    }

    /// Dates never go backwards along the output.
    #[test]
    fn prop_output_sorted(raw in raw_entries()) {
        let reference = AccountRef::Bank(AccountId::new());
        let transactions = build(reference, &raw);
        let view = LedgerService::build_ledger(&holder(reference, Decimal::ZERO), &transactions, &[]);

        for pair in view.entries.windows(2) {
            prop_assert!((pair[0].date, pair[0].created_at) <= (pair[1].date, pair[1].created_at));
        }
    }
}
