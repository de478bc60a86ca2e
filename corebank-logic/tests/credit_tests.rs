mod common;

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use uuid::Uuid;

use common::{open_credit_line, test_bank, usd, TestBank};
use corebank_api::domain::{
    CreditTransactionCategory, NewTransaction, ProductType, StatementStatus, TransactionChannel,
    TransactionType,
};
use corebank_api::BankingError;
use corebank_db::StorageInterface;

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Draw on the line through the processor, then classify it on the cycle.
fn purchase(bank: &TestBank, credit_id: Uuid, amount: rust_decimal::Decimal, on: NaiveDate) {
    let created = bank
        .services
        .transactions
        .create_transaction(
            NewTransaction::new(
                TransactionType::Withdrawal,
                usd(amount),
                "card purchase",
                TransactionChannel::Online,
            )
            .from_account(credit_id),
        )
        .unwrap();
    let processed = bank
        .services
        .transactions
        .process_transaction(created.id)
        .unwrap();
    bank.services
        .credit
        .record_credit_transaction(
            credit_id,
            processed.id,
            CreditTransactionCategory::Purchase,
            usd(amount),
            "card purchase",
            on,
            on,
        )
        .unwrap();
}

#[test]
fn statement_cycle_with_grace_period() {
    let bank = test_bank();
    let (_, credit_id) = open_credit_line(&bank, dec!(3000));

    purchase(&bank, credit_id, dec!(500), date(2025, 1, 5));
    purchase(&bank, credit_id, dec!(300), date(2025, 1, 12));

    let statement = bank
        .services
        .credit
        .generate_statement(credit_id, date(2025, 1, 15))
        .unwrap();

    assert_eq!(statement.previous_balance, usd(dec!(0)));
    assert_eq!(statement.new_charges, usd(dec!(800)));
    assert_eq!(statement.current_balance, usd(dec!(800)));
    assert!(statement.minimum_payment_due >= usd(dec!(25)));
    assert_eq!(statement.available_credit, usd(dec!(2200)));
    assert_eq!(statement.due_date, date(2025, 2, 9));
    assert_eq!(statement.status, StatementStatus::Current);

    let tracker = bank
        .services
        .interest
        .current_grace_period(credit_id)
        .unwrap()
        .unwrap();
    assert!(tracker.grace_period_active);
    assert!(tracker.is_grace_period_valid());

    // Pay in full before the due date.
    bank.services
        .credit
        .make_payment(credit_id, usd(dec!(800)), date(2025, 2, 1))
        .unwrap();

    let tracker = bank
        .services
        .interest
        .current_grace_period(credit_id)
        .unwrap()
        .unwrap();
    assert!(tracker.full_payment_received);

    let statement = bank
        .services
        .credit
        .statement(statement.id)
        .unwrap()
        .unwrap();
    assert_eq!(statement.status, StatementStatus::PaidFull);
    assert_eq!(statement.paid_amount, usd(dec!(800)));

    // The following day's accrual run skips the account.
    let report = bank
        .services
        .interest
        .run_daily_accrual(date(2025, 2, 2))
        .unwrap();
    assert_eq!(report.count_for(ProductType::CreditLine), 0);

    // And the payment cleared the ledger balance.
    assert!(bank.services.accounts.book_balance(credit_id).unwrap().is_zero());
}

#[test]
fn statement_carries_the_previous_balance_forward() {
    let bank = test_bank();
    let (_, credit_id) = open_credit_line(&bank, dec!(3000));

    purchase(&bank, credit_id, dec!(600), date(2025, 1, 5));
    bank.services
        .credit
        .generate_statement(credit_id, date(2025, 1, 15))
        .unwrap();

    purchase(&bank, credit_id, dec!(150), date(2025, 2, 3));
    let second = bank
        .services
        .credit
        .generate_statement(credit_id, date(2025, 2, 15))
        .unwrap();

    assert_eq!(second.previous_balance, usd(dec!(600)));
    assert_eq!(second.new_charges, usd(dec!(150)));
    assert_eq!(second.current_balance, usd(dec!(750)));
}

#[test]
fn minimum_payment_formula() {
    let bank = test_bank();
    let (_, credit_id) = open_credit_line(&bank, dec!(10000));

    // Small balance: the floor wins. 2% of 800 = 16 -> 25.
    purchase(&bank, credit_id, dec!(800), date(2025, 1, 5));
    let statement = bank
        .services
        .credit
        .generate_statement(credit_id, date(2025, 1, 15))
        .unwrap();
    assert_eq!(statement.minimum_payment_due, usd(dec!(25)));

    // Large balance: the percentage wins and the >1,000 principal kicker
    // applies to the interest+fees leg. 2% of 5,800 = 116.
    purchase(&bank, credit_id, dec!(5000), date(2025, 2, 3));
    let statement = bank
        .services
        .credit
        .generate_statement(credit_id, date(2025, 2, 15))
        .unwrap();
    assert_eq!(statement.current_balance, usd(dec!(5800)));
    assert_eq!(statement.minimum_payment_due, usd(dec!(116)));
}

#[test]
fn minimum_payment_never_exceeds_the_balance() {
    let bank = test_bank();
    let (_, credit_id) = open_credit_line(&bank, dec!(3000));

    purchase(&bank, credit_id, dec!(10), date(2025, 1, 5));
    let statement = bank
        .services
        .credit
        .generate_statement(credit_id, date(2025, 1, 15))
        .unwrap();
    // Floor would be 25, but the balance is only 10.
    assert_eq!(statement.minimum_payment_due, usd(dec!(10)));
}

#[test]
fn statement_assigns_included_transactions() {
    let bank = test_bank();
    let (_, credit_id) = open_credit_line(&bank, dec!(3000));
    purchase(&bank, credit_id, dec!(200), date(2025, 1, 5));

    let statement = bank
        .services
        .credit
        .generate_statement(credit_id, date(2025, 1, 15))
        .unwrap();

    let rows = bank
        .storage
        .find(
            corebank_db::tables::CREDIT_TRANSACTIONS,
            &[("statement_id", serde_json::json!(statement.id))],
        )
        .unwrap();
    assert_eq!(rows.len(), 1);
}

#[test]
fn zero_balance_statement_opens_no_grace_tracker() {
    let bank = test_bank();
    let (_, credit_id) = open_credit_line(&bank, dec!(3000));

    bank.services
        .credit
        .generate_statement(credit_id, date(2025, 1, 15))
        .unwrap();
    assert!(bank
        .services
        .interest
        .current_grace_period(credit_id)
        .unwrap()
        .is_none());
}

#[test]
fn overlimit_spending_draws_a_fee() {
    let bank = test_bank();
    let (_, credit_id) = open_credit_line(&bank, dec!(1000));

    // 1,200 exceeds the available credit of 1,000; classification charges
    // the overlimit fee first.
    let created = bank
        .services
        .transactions
        .create_transaction(
            NewTransaction::new(
                TransactionType::Withdrawal,
                usd(dec!(900)),
                "large purchase",
                TransactionChannel::Online,
            )
            .from_account(credit_id),
        )
        .unwrap();
    let processed = bank
        .services
        .transactions
        .process_transaction(created.id)
        .unwrap();
    bank.services
        .credit
        .record_credit_transaction(
            credit_id,
            processed.id,
            CreditTransactionCategory::Purchase,
            usd(dec!(1200)),
            "over the limit",
            date(2025, 1, 5),
            date(2025, 1, 5),
        )
        .unwrap();

    let fees = bank
        .storage
        .find(
            corebank_db::tables::CREDIT_TRANSACTIONS,
            &[("category", serde_json::json!(CreditTransactionCategory::Fee))],
        )
        .unwrap();
    assert_eq!(fees.len(), 1);
}

#[test]
fn cash_advances_never_get_grace() {
    let bank = test_bank();
    let (_, credit_id) = open_credit_line(&bank, dec!(3000));

    let created = bank
        .services
        .transactions
        .create_transaction(
            NewTransaction::new(
                TransactionType::Withdrawal,
                usd(dec!(100)),
                "cash advance",
                TransactionChannel::Atm,
            )
            .from_account(credit_id),
        )
        .unwrap();
    let processed = bank
        .services
        .transactions
        .process_transaction(created.id)
        .unwrap();
    let credit_txn = bank
        .services
        .credit
        .record_credit_transaction(
            credit_id,
            processed.id,
            CreditTransactionCategory::CashAdvance,
            usd(dec!(100)),
            "cash advance",
            date(2025, 1, 5),
            date(2025, 1, 5),
        )
        .unwrap();

    assert!(!credit_txn.eligible_for_grace);
    assert!(!credit_txn.grace_period_applies);
}

#[test]
fn overdue_statements_are_charged_a_late_fee() {
    let bank = test_bank();
    let (_, credit_id) = open_credit_line(&bank, dec!(3000));
    purchase(&bank, credit_id, dec!(400), date(2025, 1, 5));

    let statement = bank
        .services
        .credit
        .generate_statement(credit_id, date(2025, 1, 15))
        .unwrap();
    // Due 2025-02-09 with nothing paid.

    let report = bank
        .services
        .credit
        .process_overdue_statements(date(2025, 2, 20))
        .unwrap();
    assert_eq!(report.late_fees_charged, 1);

    let statement = bank
        .services
        .credit
        .statement(statement.id)
        .unwrap()
        .unwrap();
    assert_eq!(statement.status, StatementStatus::Overdue);

    // The 35 late fee deepened the amount owed.
    assert_eq!(
        bank.services.accounts.book_balance(credit_id).unwrap(),
        usd(dec!(-435))
    );

    // A second sweep finds nothing: the statement is no longer CURRENT.
    let rerun = bank
        .services
        .credit
        .process_overdue_statements(date(2025, 2, 21))
        .unwrap();
    assert_eq!(rerun.late_fees_charged, 0);
}

#[test]
fn statements_on_time_with_minimum_paid_are_not_swept() {
    let bank = test_bank();
    let (_, credit_id) = open_credit_line(&bank, dec!(3000));
    purchase(&bank, credit_id, dec!(400), date(2025, 1, 5));
    bank.services
        .credit
        .generate_statement(credit_id, date(2025, 1, 15))
        .unwrap();

    bank.services
        .credit
        .make_payment(credit_id, usd(dec!(25)), date(2025, 2, 1))
        .unwrap();

    let report = bank
        .services
        .credit
        .process_overdue_statements(date(2025, 2, 20))
        .unwrap();
    assert_eq!(report.late_fees_charged, 0);
}

#[test]
fn credit_limit_adjustment_requires_a_credit_line() {
    let bank = test_bank();
    let (_, credit_id) = open_credit_line(&bank, dec!(1000));

    let updated = bank
        .services
        .credit
        .adjust_credit_limit(credit_id, usd(dec!(2000)), "good history")
        .unwrap();
    assert_eq!(updated.credit_limit, Some(usd(dec!(2000))));

    let (_, checking) = common::open_account(&bank, ProductType::Checking);
    let result = bank
        .services
        .credit
        .adjust_credit_limit(checking, usd(dec!(2000)), "nope");
    assert!(matches!(result, Err(BankingError::Validation { .. })));
}
