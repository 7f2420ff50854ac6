//! Unit tests for cheque transitions.

use chrono::{NaiveDate, TimeZone, Utc};
use khata_shared::Role;
use khata_shared::types::{AccountId, ChequeId, ExpenseId, OperationId, TransactionId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::service::ChequeService;
use super::types::*;
use crate::account::{Account, AccountRef, AccountSnapshot};
use crate::ledger::{EntrySource, LedgerError, PlanContext, TransactionDirection};

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap()
}

fn account(reference: AccountRef, balance: Decimal) -> Account {
    Account {
        reference,
        name: "test".into(),
        balance,
        created_at: now(),
    }
}

fn cheque(cheque_type: ChequeType, holder: AccountRef, delta: Decimal) -> Cheque {
    Cheque {
        id: ChequeId::new(),
        operation_id: OperationId::new(),
        amount: dec!(5000),
        cheque_type,
        bank_id: None,
        cheque_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        state: ChequeState::Pending,
        own_cheque: false,
        effect: ChequeEffect::Account {
            account: holder,
            transaction_id: TransactionId::new(),
            delta,
        },
        transferred_to: None,
        cleared_to: None,
        cheque_image: Some("proofs/2025/06/c.png".into()),
        description: "test cheque".into(),
        created_at: now(),
        updated_at: now(),
    }
}

fn ctx(role: Role, accounts: impl IntoIterator<Item = Account>) -> PlanContext {
    PlanContext::new(role, now(), accounts.into_iter().collect::<AccountSnapshot>())
}

#[test]
fn test_customer_cheque_cash_out_to_cash_credits_cash() {
    let customer = AccountRef::Customer(AccountId::new());
    let pending = cheque(ChequeType::Customer, customer, dec!(5000));
    let ctx = ctx(Role::Staff, [account(AccountRef::Cash, dec!(0))]);

    let plan = ChequeService::plan_transition(
        &ctx,
        &pending,
        &ChequeAction::CashOut {
            destination: CashOutDestination::Cash,
            bank_id: None,
        },
    )
    .unwrap();

    assert_eq!(plan.delta(&AccountRef::Cash), dec!(5000));
    assert_eq!(plan.transactions.len(), 1);
    assert_eq!(
        plan.transactions[0].source,
        EntrySource::CashTx {
            direction: TransactionDirection::Credit
        }
    );
    assert_eq!(plan.transactions[0].cheque_id, Some(pending.id));
    let updated = plan.cheque.unwrap();
    assert_eq!(updated.state, ChequeState::Cleared);
    assert!(updated.flags().status);
    assert_eq!(updated.cleared_to, Some(AccountRef::Cash));
}

#[test]
fn test_payout_cash_out_checks_funds() {
    let bank_id = AccountId::new();
    let supplier = AccountRef::Supplier(AccountId::new());
    let mut payout = cheque(ChequeType::Supplier, supplier, dec!(-5000));
    payout.bank_id = Some(bank_id);
    let ctx = ctx(Role::Staff, [account(AccountRef::Bank(bank_id), dec!(4999))]);

    let err = ChequeService::plan_transition(
        &ctx,
        &payout,
        &ChequeAction::CashOut {
            destination: CashOutDestination::Bank,
            bank_id: None,
        },
    )
    .unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
}

#[test]
fn test_linked_bank_wins_over_supplied_bank() {
    let linked = AccountId::new();
    let other = AccountId::new();
    let customer = AccountRef::Customer(AccountId::new());
    let mut receipt = cheque(ChequeType::Customer, customer, dec!(5000));
    receipt.bank_id = Some(linked);
    let action = ChequeAction::CashOut {
        destination: CashOutDestination::Bank,
        bank_id: Some(other),
    };

    assert_eq!(
        ChequeService::accounts_touched(&receipt, &action),
        vec![AccountRef::Bank(linked)]
    );

    let ctx = ctx(
        Role::Staff,
        [
            account(AccountRef::Bank(linked), dec!(0)),
            account(AccountRef::Bank(other), dec!(0)),
        ],
    );
    let plan = ChequeService::plan_transition(&ctx, &receipt, &action).unwrap();
    assert_eq!(plan.delta(&AccountRef::Bank(linked)), dec!(5000));
    assert_eq!(plan.delta(&AccountRef::Bank(other)), Decimal::ZERO);
}

#[test]
fn test_bank_cash_out_without_any_bank_is_validation_error() {
    let customer = AccountRef::Customer(AccountId::new());
    let receipt = cheque(ChequeType::Customer, customer, dec!(5000));
    let ctx = ctx(Role::Staff, []);
    let err = ChequeService::plan_transition(
        &ctx,
        &receipt,
        &ChequeAction::CashOut {
            destination: CashOutDestination::Bank,
            bank_id: None,
        },
    )
    .unwrap_err();
    assert!(err.field_errors().iter().any(|f| f.field == "bankId"));
}

#[test]
fn test_cancel_reverses_counterparty_only() {
    let customer = AccountRef::Customer(AccountId::new());
    let pending = cheque(ChequeType::Customer, customer, dec!(5000));
    let ctx = ctx(Role::Admin, [account(customer, dec!(5000))]);

    let plan =
        ChequeService::plan_transition(&ctx, &pending, &ChequeAction::Cancel { confirm: true })
            .unwrap();

    assert_eq!(plan.delta(&customer), dec!(-5000));
    assert_eq!(plan.balance_changes.len(), 1);
    assert!(plan.transactions.is_empty());
    assert_eq!(plan.reversed.len(), 1);
    assert_eq!(plan.cheque.unwrap().state, ChequeState::Cancelled);
}

#[test]
fn test_cancel_requires_confirmation_and_privilege() {
    let customer = AccountRef::Customer(AccountId::new());
    let pending = cheque(ChequeType::Customer, customer, dec!(5000));

    let staff = ctx(Role::Staff, [account(customer, dec!(5000))]);
    assert!(matches!(
        ChequeService::plan_transition(&staff, &pending, &ChequeAction::Cancel { confirm: true }),
        Err(LedgerError::PermissionDenied { .. })
    ));

    let owner = ctx(Role::Owner, [account(customer, dec!(5000))]);
    let err =
        ChequeService::plan_transition(&owner, &pending, &ChequeAction::Cancel { confirm: false })
            .unwrap_err();
    assert!(err.field_errors().iter().any(|f| f.field == "confirm"));
}

#[test]
fn test_cancel_of_settled_cheque_reports_state_before_role() {
    let customer = AccountRef::Customer(AccountId::new());
    let mut cleared = cheque(ChequeType::Customer, customer, dec!(5000));
    cleared.state = ChequeState::Cleared;
    cleared.cleared_to = Some(AccountRef::Cash);

    let staff = ctx(Role::Staff, [account(customer, dec!(5000))]);
    assert!(matches!(
        ChequeService::plan_transition(&staff, &cleared, &ChequeAction::Cancel { confirm: true }),
        Err(LedgerError::InvalidChequeState { state: "cleared", .. })
    ));
}

#[test]
fn test_transfer_moves_effect_to_supplier() {
    let customer = AccountRef::Customer(AccountId::new());
    let supplier_id = AccountId::new();
    let supplier = AccountRef::Supplier(supplier_id);
    let pending = cheque(ChequeType::Customer, customer, dec!(5000));
    let ctx = ctx(
        Role::Staff,
        [account(customer, dec!(5000)), account(supplier, dec!(8000))],
    );

    let plan = ChequeService::plan_transition(
        &ctx,
        &pending,
        &ChequeAction::Transfer {
            target_type: TransferTargetType::Supplier,
            target_id: supplier_id,
        },
    )
    .unwrap();

    assert_eq!(plan.delta(&customer), dec!(-5000));
    assert_eq!(plan.delta(&supplier), dec!(-5000));
    let updated = plan.cheque.unwrap();
    assert_eq!(updated.state, ChequeState::TransferredPending);
    assert_eq!(updated.transferred_to, Some(supplier));
    assert!(matches!(
        updated.effect,
        ChequeEffect::Account { account, delta, .. } if account == supplier && delta == dec!(-5000)
    ));
    assert!(!plan.balance_changes.keys().any(|a| a.is_fund()));
}

#[test]
fn test_transfer_to_unknown_target_not_found() {
    let customer = AccountRef::Customer(AccountId::new());
    let pending = cheque(ChequeType::Customer, customer, dec!(5000));
    let ctx = ctx(Role::Staff, [account(customer, dec!(5000))]);
    assert!(matches!(
        ChequeService::plan_transition(
            &ctx,
            &pending,
            &ChequeAction::Transfer {
                target_type: TransferTargetType::Customer,
                target_id: AccountId::new(),
            },
        ),
        Err(LedgerError::NotFound(_))
    ));
}

#[test]
fn test_transferred_cheque_lifecycle() {
    let holder = AccountRef::Customer(AccountId::new());
    let mut transferred = cheque(ChequeType::Customer, holder, dec!(5000));
    transferred.state = ChequeState::TransferredPending;
    let ctx = ctx(Role::Owner, [account(holder, dec!(5000))]);

    for action in [
        ChequeAction::CashOut {
            destination: CashOutDestination::Cash,
            bank_id: None,
        },
        ChequeAction::Cancel { confirm: true },
    ] {
        assert!(matches!(
            ChequeService::plan_transition(&ctx, &transferred, &action),
            Err(LedgerError::InvalidChequeState { .. })
        ));
    }

    let settled =
        ChequeService::plan_transition(&ctx, &transferred, &ChequeAction::CashOutTransferred)
            .unwrap();
    assert!(settled.balance_changes.is_empty());
    assert!(settled.transactions.is_empty());
    let cheque = settled.cheque.unwrap();
    assert_eq!(cheque.state, ChequeState::TransferredCashed);
    assert!(cheque.flags().transferred_cashed_out);

    let cancelled = ChequeService::plan_transition(
        &ctx,
        &transferred,
        &ChequeAction::CancelTransferred { confirm: true },
    )
    .unwrap();
    assert_eq!(cancelled.delta(&holder), dec!(-5000));
    assert_eq!(cancelled.cheque.unwrap().state, ChequeState::Cancelled);
}

#[test]
fn test_product_cheque_cancel_reverses_expense() {
    let expense_id = ExpenseId::new();
    let mut product = cheque(ChequeType::Product, AccountRef::Cash, dec!(0));
    product.effect = ChequeEffect::Expense { expense_id };
    let ctx = ctx(Role::Admin, []);

    let plan =
        ChequeService::plan_transition(&ctx, &product, &ChequeAction::Cancel { confirm: true })
            .unwrap();
    assert_eq!(plan.reversed_expense, Some(expense_id));
    assert!(plan.balance_changes.is_empty());
}

#[test]
fn test_own_cheque_rejects_everything() {
    let supplier = AccountRef::Supplier(AccountId::new());
    let mut own = cheque(ChequeType::Supplier, supplier, dec!(-5000));
    own.own_cheque = true;
    own.state = ChequeState::Cleared;
    let ctx = ctx(Role::Owner, [account(supplier, dec!(0))]);
    assert!(matches!(
        ChequeService::plan_transition(&ctx, &own, &ChequeAction::Cancel { confirm: true }),
        Err(LedgerError::InvalidChequeState { .. })
    ));
}

#[test]
fn test_viewer_cannot_cash_out() {
    let customer = AccountRef::Customer(AccountId::new());
    let pending = cheque(ChequeType::Customer, customer, dec!(5000));
    let ctx = ctx(Role::Viewer, [account(AccountRef::Cash, dec!(0))]);
    assert!(matches!(
        ChequeService::plan_transition(
            &ctx,
            &pending,
            &ChequeAction::CashOut {
                destination: CashOutDestination::Cash,
                bank_id: None
            }
        ),
        Err(LedgerError::PermissionDenied { .. })
    ));
}
