//! Property-based tests for the cheque state machine.
//!
//! - Payout cheques always lower the destination, receipts always raise it
//! - Terminal states reject every action
//! - Cancel and transfer never touch bank or cash

use chrono::{NaiveDate, Utc};
use khata_shared::Role;
use khata_shared::types::{AccountId, ChequeId, OperationId, TransactionId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::service::ChequeService;
use super::types::*;
use crate::account::{Account, AccountRef, AccountSnapshot};
use crate::ledger::{LedgerError, PlanContext};

/// Strategy to generate positive decimal amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn cheque_type() -> impl Strategy<Value = ChequeType> {
    prop_oneof![
        Just(ChequeType::Customer),
        Just(ChequeType::Supplier),
        Just(ChequeType::Shipper),
        Just(ChequeType::Product),
    ]
}

fn terminal_state() -> impl Strategy<Value = ChequeState> {
    prop_oneof![
        Just(ChequeState::Cleared),
        Just(ChequeState::Cancelled),
        Just(ChequeState::TransferredCashed),
    ]
}

fn any_action(target: AccountId) -> impl Strategy<Value = ChequeAction> {
    prop_oneof![
        Just(ChequeAction::CashOut {
            destination: CashOutDestination::Cash,
            bank_id: None
        }),
        Just(ChequeAction::Cancel { confirm: true }),
        Just(ChequeAction::Transfer {
            target_type: TransferTargetType::Supplier,
            target_id: target
        }),
        Just(ChequeAction::CashOutTransferred),
        Just(ChequeAction::CancelTransferred { confirm: true }),
    ]
}

fn make_cheque(cheque_type: ChequeType, amount: Decimal, holder: AccountRef) -> Cheque {
    let now = Utc::now();
    Cheque {
        id: ChequeId::new(),
        operation_id: OperationId::new(),
        amount,
        cheque_type,
        bank_id: None,
        cheque_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        state: ChequeState::Pending,
        own_cheque: false,
        effect: ChequeEffect::Account {
            account: holder,
            transaction_id: TransactionId::new(),
            delta: if cheque_type.is_payout() { -amount } else { amount },
        },
        transferred_to: None,
        cleared_to: None,
        cheque_image: None,
        description: String::new(),
        created_at: now,
        updated_at: now,
    }
}

fn funded(reference: AccountRef, balance: Decimal) -> Account {
    Account {
        reference,
        name: "prop".into(),
        balance,
        created_at: Utc::now(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Cash-out direction follows the payout classification.
    #[test]
    fn prop_cash_out_direction_follows_payout(
        cheque_type in cheque_type(),
        amount in positive_amount(),
        extra in positive_amount(),
    ) {
        let bank_id = AccountId::new();
        let bank = AccountRef::Bank(bank_id);
        let holder = AccountRef::Supplier(AccountId::new());
        let cheque = make_cheque(cheque_type, amount, holder);
        let balance = amount + extra;
        let ctx = PlanContext::new(
            Role::Staff,
            Utc::now(),
            AccountSnapshot::new().with(funded(bank, balance)),
        );

        let plan = ChequeService::plan_transition(
            &ctx,
            &cheque,
            &ChequeAction::CashOut { destination: CashOutDestination::Bank, bank_id: Some(bank_id) },
        ).unwrap();

        let after = balance + plan.delta(&bank);
        if cheque_type.is_payout() {
            prop_assert_eq!(after, balance - amount);
            prop_assert!(after < balance);
        } else {
            prop_assert_eq!(after, balance + amount);
            prop_assert!(after > balance);
        }
    }

    /// Cleared, cancelled and transferred-cashed cheques reject every action.
    #[test]
    fn prop_terminal_states_reject_all(
        state in terminal_state(),
        cheque_type in cheque_type(),
        amount in positive_amount(),
        action in any_action(AccountId::new()),
    ) {
        let holder = AccountRef::Customer(AccountId::new());
        let mut cheque = make_cheque(cheque_type, amount, holder);
        cheque.state = state;
        let ctx = PlanContext::new(
            Role::Owner,
            Utc::now(),
            AccountSnapshot::new()
                .with(funded(AccountRef::Cash, amount))
                .with(funded(holder, amount)),
        );

        let result = ChequeService::plan_transition(&ctx, &cheque, &action);
        let is_invalid_state = matches!(result, Err(LedgerError::InvalidChequeState { .. }));
        prop_assert!(is_invalid_state, "Expected InvalidChequeState");
    }

    /// Cancelling a pending cheque leaves every fund account alone and
    /// exactly undoes the recognized effect.
    #[test]
    fn prop_cancel_never_touches_funds(
        cheque_type in cheque_type(),
        amount in positive_amount(),
    ) {
        let holder = AccountRef::Shipper(AccountId::new());
        let cheque = make_cheque(cheque_type, amount, holder);
        let ctx = PlanContext::new(
            Role::Admin,
            Utc::now(),
            AccountSnapshot::new().with(funded(holder, Decimal::ZERO)),
        );

        let plan = ChequeService::plan_transition(&ctx, &cheque, &ChequeAction::Cancel { confirm: true })
            .unwrap();

        prop_assert!(plan.touched_accounts().all(|a| !a.is_fund()));
        let ChequeEffect::Account { delta, .. } = cheque.effect else {
            unreachable!("fixture always holds an account effect");
        };
        prop_assert_eq!(plan.delta(&holder), -delta);
    }
}
