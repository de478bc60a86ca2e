mod common;

use std::collections::HashMap;

use rust_decimal_macros::dec;
use uuid::Uuid;

use common::{test_bank, usd};
use corebank_api::domain::{
    Currency, JournalEntryState, JournalLine, LedgerAccountType, Money,
};
use corebank_api::BankingError;
use corebank_db::tables;
use corebank_db::StorageInterface;

fn transfer_lines(debit_account: Uuid, credit_account: Uuid, amount: Money) -> Vec<JournalLine> {
    vec![
        JournalLine::debit(debit_account, "in", amount).unwrap(),
        JournalLine::credit(credit_account, "out", amount).unwrap(),
    ]
}

#[test]
fn create_and_post_entry() {
    let bank = test_bank();
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();

    let entry = bank
        .services
        .ledger
        .create_entry("TXN-1", "funding", transfer_lines(a, b, usd(dec!(100))))
        .unwrap();
    assert_eq!(entry.state, JournalEntryState::Pending);

    // Pending entries never count toward balances.
    let balance = bank
        .services
        .ledger
        .account_balance(a, LedgerAccountType::Asset, Currency::Usd, None)
        .unwrap();
    assert!(balance.is_zero());

    let posted = bank.services.ledger.post_entry(entry.id).unwrap();
    assert_eq!(posted.state, JournalEntryState::Posted);
    assert!(posted.posted_at.is_some());

    let balance = bank
        .services
        .ledger
        .account_balance(a, LedgerAccountType::Asset, Currency::Usd, None)
        .unwrap();
    assert_eq!(balance, usd(dec!(100)));
}

#[test]
fn posting_twice_is_a_state_error() {
    let bank = test_bank();
    let entry = bank
        .services
        .ledger
        .create_entry(
            "TXN-2",
            "once only",
            transfer_lines(Uuid::new_v4(), Uuid::new_v4(), usd(dec!(10))),
        )
        .unwrap();

    bank.services.ledger.post_entry(entry.id).unwrap();
    let again = bank.services.ledger.post_entry(entry.id);
    assert!(matches!(again, Err(BankingError::BadState { .. })));
}

#[test]
fn unbalanced_entry_leaves_storage_untouched() {
    let bank = test_bank();
    let lines = vec![
        JournalLine::debit(Uuid::new_v4(), "in", usd(dec!(100))).unwrap(),
        JournalLine::credit(Uuid::new_v4(), "out", usd(dec!(90))).unwrap(),
    ];
    let result = bank.services.ledger.create_entry("TXN-3", "bad", lines);
    assert!(matches!(result, Err(BankingError::Unbalanced { .. })));
    assert_eq!(bank.storage.count(tables::JOURNAL_ENTRIES).unwrap(), 0);
}

#[test]
fn reversal_swaps_sides_and_flips_states() {
    let bank = test_bank();
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();

    let entry = bank
        .services
        .ledger
        .create_entry("TXN-4", "original", transfer_lines(a, b, usd(dec!(250))))
        .unwrap();
    bank.services.ledger.post_entry(entry.id).unwrap();

    let reverser = bank
        .services
        .ledger
        .reverse_entry(entry.id, "operator error")
        .unwrap();

    assert_eq!(reverser.state, JournalEntryState::Posted);
    assert_eq!(reverser.reverses, Some(entry.id));
    assert!(reverser.description.as_str().starts_with("REVERSAL:"));
    assert!(reverser.reference.as_str().starts_with("REV-"));

    let original = bank.services.ledger.entry(entry.id).unwrap().unwrap();
    assert_eq!(original.state, JournalEntryState::Reversed);
    assert_eq!(original.reversed_by, Some(reverser.id));

    // The reversing lines cancel the original exactly.
    let balance = bank
        .services
        .ledger
        .account_balance(a, LedgerAccountType::Asset, Currency::Usd, None)
        .unwrap();
    assert!(balance.is_zero());
}

#[test]
fn reversing_a_pending_entry_fails() {
    let bank = test_bank();
    let entry = bank
        .services
        .ledger
        .create_entry(
            "TXN-5",
            "never posted",
            transfer_lines(Uuid::new_v4(), Uuid::new_v4(), usd(dec!(10))),
        )
        .unwrap();
    let result = bank.services.ledger.reverse_entry(entry.id, "too soon");
    assert!(matches!(result, Err(BankingError::BadState { .. })));
}

#[test]
fn liability_balances_follow_credit_normal_convention() {
    let bank = test_bank();
    let liability = Uuid::new_v4();
    let asset = Uuid::new_v4();

    // Credit the liability account with 500 (e.g. a drawn credit line).
    let entry = bank
        .services
        .ledger
        .create_entry("TXN-6", "draw", transfer_lines(asset, liability, usd(dec!(500))))
        .unwrap();
    bank.services.ledger.post_entry(entry.id).unwrap();

    let owed = bank
        .services
        .ledger
        .account_balance(liability, LedgerAccountType::Liability, Currency::Usd, None)
        .unwrap();
    assert_eq!(owed, usd(dec!(500)));

    let held = bank
        .services
        .ledger
        .account_balance(asset, LedgerAccountType::Asset, Currency::Usd, None)
        .unwrap();
    assert_eq!(held, usd(dec!(500)));
}

#[test]
fn trial_balance_sums_to_zero() {
    let bank = test_bank();
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let c = Uuid::new_v4();

    for (reference, from, to, amount) in [
        ("T-1", a, b, dec!(1000)),
        ("T-2", b, c, dec!(350)),
        ("T-3", c, a, dec!(125.50)),
    ] {
        let entry = bank
            .services
            .ledger
            .create_entry(reference, "movement", transfer_lines(to, from, usd(amount)))
            .unwrap();
        bank.services.ledger.post_entry(entry.id).unwrap();
    }

    let accounts = HashMap::from([
        (a, LedgerAccountType::Asset),
        (b, LedgerAccountType::Asset),
        (c, LedgerAccountType::Asset),
    ]);
    let balances = bank
        .services
        .ledger
        .trial_balance(&accounts, Currency::Usd, None)
        .unwrap();

    let total: rust_decimal::Decimal =
        balances.values().map(|balance| balance.amount()).sum();
    assert_eq!(total, dec!(0));
}

#[test]
fn entry_queries_filter_by_state() {
    let bank = test_bank();
    let account = Uuid::new_v4();

    let pending = bank
        .services
        .ledger
        .create_entry(
            "TXN-7",
            "stays pending",
            transfer_lines(account, Uuid::new_v4(), usd(dec!(10))),
        )
        .unwrap();
    let posted = bank
        .services
        .ledger
        .create_entry(
            "TXN-8",
            "gets posted",
            transfer_lines(account, Uuid::new_v4(), usd(dec!(20))),
        )
        .unwrap();
    bank.services.ledger.post_entry(posted.id).unwrap();

    let all = bank
        .services
        .ledger
        .entries_for_account(account, None, None, None)
        .unwrap();
    assert_eq!(all.len(), 2);

    let only_posted = bank
        .services
        .ledger
        .entries_for_account(account, None, None, Some(JournalEntryState::Posted))
        .unwrap();
    assert_eq!(only_posted.len(), 1);
    assert_eq!(only_posted[0].id, posted.id);
    assert_ne!(only_posted[0].id, pending.id);
}
