mod common;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use common::{open_account, test_bank, usd, TestBank};
use corebank_api::domain::{
    AmortizationMethod, KycTier, LoanState, LoanTerms, PaymentFrequency, ProductType,
    TransactionState, TransactionType,
};
use corebank_api::BankingError;

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn standard_terms() -> LoanTerms {
    LoanTerms {
        principal_amount: usd(dec!(10000)),
        annual_interest_rate: dec!(0.06),
        term_months: 12,
        payment_frequency: PaymentFrequency::Monthly,
        amortization_method: AmortizationMethod::EqualInstallment,
        first_payment_date: date(2025, 2, 1),
        allow_prepayment: true,
        prepayment_penalty_rate: None,
        grace_period_days: 10,
        late_fee: usd(dec!(25)),
    }
}

fn originate(bank: &TestBank) -> corebank_api::domain::Loan {
    let customer_id = bank.customers.add_customer(KycTier::Tier2);
    bank.services
        .loans
        .originate_loan(customer_id, standard_terms())
        .unwrap()
}

#[test]
fn origination_creates_a_liability_account_and_schedule() {
    let bank = test_bank();
    let loan = originate(&bank);

    assert_eq!(loan.state, LoanState::Originated);
    assert_eq!(loan.current_balance, usd(dec!(10000)));
    assert!(loan.originated_date.is_some());

    let account = bank
        .services
        .accounts
        .account(loan.account_id)
        .unwrap()
        .unwrap();
    assert_eq!(account.product_type, ProductType::Loan);
    assert!(account.is_liability_account());

    let schedule = bank.services.loans.amortization_schedule(loan.id).unwrap();
    assert_eq!(schedule.len(), 12);
}

#[test]
fn equal_installment_schedule_closes_to_zero() {
    let bank = test_bank();
    let loan = originate(&bank);

    let schedule = bank.services.loans.amortization_schedule(loan.id).unwrap();
    assert_eq!(schedule.len(), 12);

    // Level payment of 860.66 on a 10,000 / 6% / 12-month loan.
    assert_eq!(schedule[0].payment_amount, usd(dec!(860.66)));
    assert_eq!(schedule[0].interest_amount, usd(dec!(50.00)));

    let last = schedule.last().unwrap();
    assert!(last.remaining_balance.is_zero());

    // Principal sums back to the loan amount within a cent.
    let principal_total: Decimal = schedule
        .iter()
        .map(|entry| entry.principal_amount.amount())
        .sum();
    assert!((principal_total - dec!(10000)).abs() <= dec!(0.01));

    // Every row: payment = principal + interest within one minor unit.
    for entry in &schedule {
        entry.validate().unwrap();
    }

    // Payment dates advance month by month.
    assert_eq!(schedule[0].payment_date, date(2025, 2, 1));
    assert_eq!(schedule[1].payment_date, date(2025, 3, 1));
    assert_eq!(schedule[11].payment_date, date(2026, 1, 1));
}

#[test]
fn equal_principal_schedule_declines_and_terminates() {
    let bank = test_bank();
    let customer_id = bank.customers.add_customer(KycTier::Tier2);
    let mut terms = standard_terms();
    terms.amortization_method = AmortizationMethod::EqualPrincipal;
    let loan = bank.services.loans.originate_loan(customer_id, terms).unwrap();

    let schedule = bank.services.loans.amortization_schedule(loan.id).unwrap();
    assert_eq!(schedule.len(), 12);
    assert!(schedule.last().unwrap().remaining_balance.is_zero());

    // Payments decline as the balance amortizes.
    assert!(schedule[0].payment_amount > schedule[11].payment_amount);

    let principal_total: Decimal = schedule
        .iter()
        .map(|entry| entry.principal_amount.amount())
        .sum();
    assert!((principal_total - dec!(10000)).abs() <= dec!(0.01));
}

#[test]
fn bullet_schedule_is_interest_only_until_maturity() {
    let bank = test_bank();
    let customer_id = bank.customers.add_customer(KycTier::Tier2);
    let mut terms = standard_terms();
    terms.amortization_method = AmortizationMethod::Bullet;
    let loan = bank.services.loans.originate_loan(customer_id, terms).unwrap();

    let schedule = bank.services.loans.amortization_schedule(loan.id).unwrap();
    assert_eq!(schedule.len(), 12);

    for entry in &schedule[..11] {
        assert!(entry.principal_amount.is_zero());
        assert_eq!(entry.interest_amount, usd(dec!(50.00)));
        assert_eq!(entry.remaining_balance, usd(dec!(10000)));
    }
    let last = schedule.last().unwrap();
    assert_eq!(last.principal_amount, usd(dec!(10000)));
    assert!(last.remaining_balance.is_zero());
}

#[test]
fn disbursement_moves_the_principal() {
    let bank = test_bank();
    let (_, checking) = open_account(&bank, ProductType::Checking);
    let loan = originate(&bank);

    let disbursed = bank.services.loans.disburse_loan(loan.id, checking).unwrap();
    assert_eq!(disbursed.state, LoanState::Disbursed);
    assert!(disbursed.disbursed_date.is_some());

    assert_eq!(
        bank.services.accounts.book_balance(checking).unwrap(),
        usd(dec!(10000))
    );
    // The loan account carries the outstanding principal as a liability.
    assert_eq!(
        bank.services.accounts.book_balance(loan.account_id).unwrap(),
        usd(dec!(10000))
    );
}

#[test]
fn disbursing_twice_fails() {
    let bank = test_bank();
    let (_, checking) = open_account(&bank, ProductType::Checking);
    let loan = originate(&bank);

    bank.services.loans.disburse_loan(loan.id, checking).unwrap();
    let again = bank.services.loans.disburse_loan(loan.id, checking);
    assert!(matches!(again, Err(BankingError::BadState { .. })));
}

#[test]
fn payment_allocates_interest_first() {
    let bank = test_bank();
    let (_, checking) = open_account(&bank, ProductType::Checking);
    let loan = originate(&bank);
    bank.services.loans.disburse_loan(loan.id, checking).unwrap();

    let payment = bank
        .services
        .loans
        .make_payment(loan.id, usd(dec!(860.66)), date(2025, 2, 1), Some(checking))
        .unwrap();

    // First period: 10,000 x 0.5% = 50 interest, remainder principal.
    assert_eq!(payment.interest_amount, usd(dec!(50.00)));
    assert_eq!(payment.principal_amount, usd(dec!(810.66)));
    assert!(payment.late_fee.is_zero());

    let loan = bank.services.loans.loan(loan.id).unwrap().unwrap();
    assert_eq!(loan.state, LoanState::Active);
    assert_eq!(loan.current_balance, usd(dec!(9189.34)));
    assert_eq!(loan.total_paid, usd(dec!(860.66)));
    assert_eq!(loan.interest_paid, usd(dec!(50.00)));
    assert_eq!(loan.last_payment_date, Some(date(2025, 2, 1)));

    // The payment flowed from checking into the loan account.
    assert_eq!(
        bank.services.accounts.book_balance(checking).unwrap(),
        usd(dec!(9139.34))
    );
}

#[test]
fn payment_smaller_than_interest_is_all_interest() {
    let bank = test_bank();
    let (_, checking) = open_account(&bank, ProductType::Checking);
    let loan = originate(&bank);
    bank.services.loans.disburse_loan(loan.id, checking).unwrap();

    let payment = bank
        .services
        .loans
        .make_payment(loan.id, usd(dec!(20)), date(2025, 2, 1), Some(checking))
        .unwrap();
    assert_eq!(payment.interest_amount, usd(dec!(20)));
    assert!(payment.principal_amount.is_zero());

    let loan = bank.services.loans.loan(loan.id).unwrap().unwrap();
    assert_eq!(loan.current_balance, usd(dec!(10000)));
}

#[test]
fn overpaying_the_balance_pays_the_loan_off() {
    let bank = test_bank();
    let (_, checking) = open_account(&bank, ProductType::Checking);
    let loan = originate(&bank);
    bank.services.loans.disburse_loan(loan.id, checking).unwrap();

    // Balance plus the period's interest clears the loan in one payment.
    bank.services
        .loans
        .make_payment(loan.id, usd(dec!(10050)), date(2025, 2, 1), Some(checking))
        .unwrap();

    let loan = bank.services.loans.loan(loan.id).unwrap().unwrap();
    assert_eq!(loan.state, LoanState::PaidOff);
    assert!(loan.current_balance.is_zero());
}

#[test]
fn prepayment_penalty_applies_to_the_excess() {
    let bank = test_bank();
    let (_, checking) = open_account(&bank, ProductType::Checking);
    let customer_id = bank.customers.add_customer(KycTier::Tier2);
    let mut terms = standard_terms();
    terms.prepayment_penalty_rate = Some(dec!(0.02));
    let loan = bank.services.loans.originate_loan(customer_id, terms).unwrap();
    bank.services.loans.disburse_loan(loan.id, checking).unwrap();

    // 1,000 over the 860.66 scheduled payment; penalty is 2% of the excess.
    let payment = bank
        .services
        .loans
        .make_payment(loan.id, usd(dec!(1860.66)), date(2025, 2, 1), Some(checking))
        .unwrap();
    assert_eq!(payment.prepayment_penalty, usd(dec!(20.00)));
}

#[test]
fn payments_on_a_non_disbursed_loan_fail() {
    let bank = test_bank();
    let (_, checking) = open_account(&bank, ProductType::Checking);
    let loan = originate(&bank);

    let result =
        bank.services
            .loans
            .make_payment(loan.id, usd(dec!(100)), date(2025, 2, 1), Some(checking));
    assert!(matches!(result, Err(BankingError::BadState { .. })));
}

#[test]
fn delinquency_is_measured_against_the_schedule() {
    let bank = test_bank();
    let (_, checking) = open_account(&bank, ProductType::Checking);
    let loan = originate(&bank);
    bank.services.loans.disburse_loan(loan.id, checking).unwrap();

    // Nothing paid and the first scheduled date long past: the sweep
    // charges one late fee.
    let report = bank
        .services
        .loans
        .process_past_due_loans(date(2025, 3, 1))
        .unwrap();
    assert_eq!(report.loans_processed, 1);
    assert_eq!(report.late_fees_charged, 1);

    let loan_after = bank.services.loans.loan(loan.id).unwrap().unwrap();
    // 28 days past the 2025-02-01 scheduled date.
    assert_eq!(loan_after.days_past_due, 28);
    assert_eq!(loan_after.last_late_fee_date, Some(date(2025, 3, 1)));

    // Same month: no second fee.
    let rerun = bank
        .services
        .loans
        .process_past_due_loans(date(2025, 3, 15))
        .unwrap();
    assert_eq!(rerun.late_fees_charged, 0);

    // Next month: the fee recurs.
    let next_month = bank
        .services
        .loans
        .process_past_due_loans(date(2025, 4, 2))
        .unwrap();
    assert_eq!(next_month.late_fees_charged, 1);
}

#[test]
fn current_loans_report_zero_days_past_due() {
    let bank = test_bank();
    let (_, checking) = open_account(&bank, ProductType::Checking);
    let loan = originate(&bank);
    bank.services.loans.disburse_loan(loan.id, checking).unwrap();

    bank.services
        .loans
        .make_payment(loan.id, usd(dec!(860.66)), date(2025, 2, 1), Some(checking))
        .unwrap();

    // One payment covers the first scheduled installment; five days into
    // the next period nothing is past due yet.
    let report = bank
        .services
        .loans
        .process_past_due_loans(date(2025, 2, 6))
        .unwrap();
    assert_eq!(report.loans_processed, 0);
    assert_eq!(report.late_fees_charged, 0);

    let loan = bank.services.loans.loan(loan.id).unwrap().unwrap();
    assert_eq!(loan.days_past_due, 0);
}

#[test]
fn past_due_payment_collects_the_late_fee_first() {
    let bank = test_bank();
    let (_, checking) = open_account(&bank, ProductType::Checking);
    let loan = originate(&bank);
    bank.services.loans.disburse_loan(loan.id, checking).unwrap();

    // Mark the loan delinquent via the sweep.
    bank.services
        .loans
        .process_past_due_loans(date(2025, 3, 1))
        .unwrap();

    let payment = bank
        .services
        .loans
        .make_payment(loan.id, usd(dec!(885.66)), date(2025, 3, 2), Some(checking))
        .unwrap();

    // 25 came off the top as the late fee; the rest was allocated normally.
    assert_eq!(payment.late_fee, usd(dec!(25)));
    assert_eq!(payment.payment_amount, usd(dec!(860.66)));
    assert_eq!(payment.interest_amount, usd(dec!(50.00)));

    let transaction = bank
        .services
        .transactions
        .transaction(payment.transaction_id)
        .unwrap()
        .unwrap();
    assert_eq!(transaction.transaction_type, TransactionType::Payment);
    assert_eq!(transaction.state, TransactionState::Completed);
    // The processor charged payment plus fee.
    assert_eq!(transaction.amount, usd(dec!(885.66)));
}

#[test]
fn customer_loans_and_payment_history_are_queryable() {
    let bank = test_bank();
    let (_, checking) = open_account(&bank, ProductType::Checking);
    let loan = originate(&bank);
    bank.services.loans.disburse_loan(loan.id, checking).unwrap();
    bank.services
        .loans
        .make_payment(loan.id, usd(dec!(860.66)), date(2025, 2, 1), Some(checking))
        .unwrap();

    let loans = bank.services.loans.customer_loans(loan.customer_id).unwrap();
    assert_eq!(loans.len(), 1);

    let payments = bank.services.loans.loan_payments(loan.id).unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].payment_amount, usd(dec!(860.66)));
}
