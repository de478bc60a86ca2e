mod common;

use rust_decimal_macros::dec;

use common::{open_account, test_bank, usd};
use corebank_api::domain::{
    AccountOpening, AlertStatus, ComplianceDecision, Currency, KycTier, NewTransaction,
    ProductType, SuspiciousActivityType, TransactionChannel, TransactionState, TransactionType,
};
use corebank_api::BankingError;
use corebank_db::tables;
use corebank_db::StorageInterface;

#[test]
fn unknown_customer_is_blocked() {
    let bank = test_bank();
    let decision = bank
        .services
        .compliance
        .check_transaction(
            uuid::Uuid::new_v4(),
            uuid::Uuid::new_v4(),
            usd(dec!(10)),
            TransactionType::Deposit,
            None,
        )
        .unwrap();
    assert!(matches!(decision, ComplianceDecision::Blocked(_)));
}

#[test]
fn inactive_customer_is_blocked() {
    let bank = test_bank();
    let (customer_id, account_id) = open_account(&bank, ProductType::Checking);
    bank.customers.deactivate(customer_id);

    let decision = bank
        .services
        .compliance
        .check_transaction(
            customer_id,
            account_id,
            usd(dec!(10)),
            TransactionType::Deposit,
            None,
        )
        .unwrap();
    assert!(matches!(decision, ComplianceDecision::Blocked(_)));
}

#[test]
fn single_transaction_limit_blocks_by_tier() {
    let bank = test_bank();
    let customer_id = bank.customers.add_customer(KycTier::Tier1);
    let account = bank
        .services
        .accounts
        .create_account(AccountOpening::new(
            customer_id,
            ProductType::Checking,
            Currency::Usd,
            "tier1 checking",
        ))
        .unwrap();

    // Tier 1 single-transaction limit is 1,000.
    let created = bank
        .services
        .transactions
        .create_transaction(
            NewTransaction::new(
                TransactionType::Deposit,
                usd(dec!(1200)),
                "over the limit",
                TransactionChannel::Branch,
            )
            .to_account(account.id),
        )
        .unwrap();
    let result = bank.services.transactions.process_transaction(created.id);
    assert!(matches!(result, Err(BankingError::ComplianceBlocked { .. })));

    let transaction = bank
        .services
        .transactions
        .transaction(created.id)
        .unwrap()
        .unwrap();
    assert_eq!(transaction.state, TransactionState::Failed);
    assert!(matches!(
        transaction.compliance_decision,
        Some(ComplianceDecision::Blocked(_))
    ));

    let violations = bank
        .services
        .compliance
        .customer_violations(customer_id)
        .unwrap();
    assert!(!violations.is_empty());
}

#[test]
fn daily_limit_accumulates_across_completed_transactions() {
    let bank = test_bank();
    let customer_id = bank.customers.add_customer(KycTier::Tier1);
    let account = bank
        .services
        .accounts
        .create_account(AccountOpening::new(
            customer_id,
            ProductType::Checking,
            Currency::Usd,
            "tier1 checking",
        ))
        .unwrap();

    // Two 600 deposits: the first passes, the second breaks the 1,000
    // daily limit.
    let first = bank
        .services
        .transactions
        .create_transaction(
            NewTransaction::new(
                TransactionType::Deposit,
                usd(dec!(600)),
                "first",
                TransactionChannel::Branch,
            )
            .to_account(account.id),
        )
        .unwrap();
    bank.services
        .transactions
        .process_transaction(first.id)
        .unwrap();

    let second = bank
        .services
        .transactions
        .create_transaction(
            NewTransaction::new(
                TransactionType::Deposit,
                usd(dec!(600)),
                "second",
                TransactionChannel::Branch,
            )
            .to_account(account.id),
        )
        .unwrap();
    let result = bank.services.transactions.process_transaction(second.id);
    assert!(matches!(result, Err(BankingError::ComplianceBlocked { .. })));
}

#[test]
fn large_transactions_are_reported_not_blocked() {
    let bank = test_bank();
    let customer_id = bank.customers.add_customer(KycTier::Tier3);
    let account = bank
        .services
        .accounts
        .create_account(AccountOpening::new(
            customer_id,
            ProductType::Checking,
            Currency::Usd,
            "tier3 checking",
        ))
        .unwrap();

    let created = bank
        .services
        .transactions
        .create_transaction(
            NewTransaction::new(
                TransactionType::Deposit,
                usd(dec!(12000)),
                "large deposit",
                TransactionChannel::Branch,
            )
            .to_account(account.id),
        )
        .unwrap();
    let processed = bank
        .services
        .transactions
        .process_transaction(created.id)
        .unwrap();
    assert_eq!(processed.state, TransactionState::Completed);

    assert_eq!(
        bank.storage.count(tables::LARGE_TRANSACTION_REPORTS).unwrap(),
        1
    );
}

#[test]
fn structured_amounts_raise_an_alert_without_blocking() {
    let bank = test_bank();
    let customer_id = bank.customers.add_customer(KycTier::Tier3);
    let account_id = uuid::Uuid::new_v4();

    // 9,600 sits in the 95%-99.9% band under the 10,000 threshold.
    let decision = bank
        .services
        .compliance
        .check_transaction(
            customer_id,
            account_id,
            usd(dec!(9600)),
            TransactionType::Deposit,
            None,
        )
        .unwrap();
    assert!(matches!(decision, ComplianceDecision::Allow));

    let alerts = bank.services.compliance.alerts(None, None).unwrap();
    assert!(alerts
        .iter()
        .any(|alert| alert.activity_type == SuspiciousActivityType::StructuredTransaction));
}

#[test]
fn round_amount_alert_scores_by_tier() {
    let bank = test_bank();
    let tier0 = bank.customers.add_customer(KycTier::Tier0);
    let tier3 = bank.customers.add_customer(KycTier::Tier3);
    let account_id = uuid::Uuid::new_v4();

    // Tier-0 hard limits would block anyway; the alert is still recorded.
    let _ = bank
        .services
        .compliance
        .check_transaction(
            tier0,
            account_id,
            usd(dec!(5000)),
            TransactionType::Deposit,
            None,
        )
        .unwrap();
    let _ = bank
        .services
        .compliance
        .check_transaction(
            tier3,
            account_id,
            usd(dec!(5000)),
            TransactionType::Deposit,
            None,
        )
        .unwrap();

    let round_alerts: Vec<_> = bank
        .services
        .compliance
        .alerts(None, None)
        .unwrap()
        .into_iter()
        .filter(|alert| alert.activity_type == SuspiciousActivityType::RoundDollarAmounts)
        .collect();
    assert_eq!(round_alerts.len(), 2);
    let tier0_alert = round_alerts
        .iter()
        .find(|alert| alert.customer_id == tier0)
        .unwrap();
    let tier3_alert = round_alerts
        .iter()
        .find(|alert| alert.customer_id == tier3)
        .unwrap();
    assert_eq!(tier0_alert.risk_score, 60);
    assert_eq!(tier3_alert.risk_score, 30);
}

#[test]
fn velocity_elevates_to_review() {
    let bank = test_bank();
    let customer_id = bank.customers.add_customer(KycTier::Tier3);
    let account_id = uuid::Uuid::new_v4();

    // Each structured-amount check records a violation; after five the
    // velocity rule elevates to review.
    for _ in 0..5 {
        bank.services
            .compliance
            .check_transaction(
                customer_id,
                account_id,
                usd(dec!(9600)),
                TransactionType::Deposit,
                None,
            )
            .unwrap();
    }
    let decision = bank
        .services
        .compliance
        .check_transaction(
            customer_id,
            account_id,
            usd(dec!(9600)),
            TransactionType::Deposit,
            None,
        )
        .unwrap();
    assert!(matches!(decision, ComplianceDecision::Review(_)));
}

#[test]
fn review_leaves_the_transaction_pending() {
    let bank = test_bank();
    let customer_id = bank.customers.add_customer(KycTier::Tier3);
    let account = bank
        .services
        .accounts
        .create_account(AccountOpening::new(
            customer_id,
            ProductType::Checking,
            Currency::Usd,
            "reviewed checking",
        ))
        .unwrap();

    // Build up violation history to trip the velocity rule.
    for _ in 0..5 {
        bank.services
            .compliance
            .check_transaction(
                customer_id,
                account.id,
                usd(dec!(9600)),
                TransactionType::Deposit,
                None,
            )
            .unwrap();
    }

    let created = bank
        .services
        .transactions
        .create_transaction(
            NewTransaction::new(
                TransactionType::Deposit,
                usd(dec!(9600)),
                "needs review",
                TransactionChannel::Online,
            )
            .to_account(account.id),
        )
        .unwrap();
    let parked = bank
        .services
        .transactions
        .process_transaction(created.id)
        .unwrap();

    assert_eq!(parked.state, TransactionState::Pending);
    assert!(matches!(
        parked.compliance_decision,
        Some(ComplianceDecision::Review(_))
    ));
    assert!(parked.journal_entry_id.is_none());
}

#[test]
fn alerts_can_be_resolved() {
    let bank = test_bank();
    let customer_id = bank.customers.add_customer(KycTier::Tier3);

    bank.services
        .compliance
        .check_transaction(
            customer_id,
            uuid::Uuid::new_v4(),
            usd(dec!(9600)),
            TransactionType::Deposit,
            None,
        )
        .unwrap();

    let alert = bank
        .services
        .compliance
        .alerts(Some(AlertStatus::Open), None)
        .unwrap()
        .into_iter()
        .next()
        .unwrap();
    let resolved = bank
        .services
        .compliance
        .resolve_alert(alert.id, AlertStatus::FalsePositive, "verified payroll", "analyst-7")
        .unwrap();

    assert_eq!(resolved.status, AlertStatus::FalsePositive);
    assert_eq!(resolved.assigned_to.as_deref(), Some("analyst-7"));
    assert!(resolved.resolved_at.is_some());
}

#[test]
fn system_channel_skips_the_gate() {
    let bank = test_bank();
    let customer_id = bank.customers.add_customer(KycTier::Tier0);
    let account = bank
        .services
        .accounts
        .create_account(AccountOpening::new(
            customer_id,
            ProductType::Checking,
            Currency::Usd,
            "tier0 checking",
        ))
        .unwrap();

    // 5,000 is far over every Tier-0 limit, but system postings bypass the
    // gate entirely.
    let created = bank
        .services
        .transactions
        .create_transaction(
            NewTransaction::new(
                TransactionType::Deposit,
                usd(dec!(5000)),
                "system adjustment",
                TransactionChannel::System,
            )
            .to_account(account.id),
        )
        .unwrap();
    let processed = bank
        .services
        .transactions
        .process_transaction(created.id)
        .unwrap();
    assert_eq!(processed.state, TransactionState::Completed);
}
