use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use heapless::String as HeaplessString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::money::{Currency, Money};
use super::bounded;
use crate::{BankingError, BankingResult};

/// Lifecycle of a journal entry. Only POSTED entries count toward balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JournalEntryState {
    Pending,
    Posted,
    Reversed,
}

impl std::fmt::Display for JournalEntryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JournalEntryState::Pending => "pending",
            JournalEntryState::Posted => "posted",
            JournalEntryState::Reversed => "reversed",
        };
        f.write_str(s)
    }
}

/// Accounting classification that fixes the normal-balance sign convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LedgerAccountType {
    /// Debit normal balance
    Asset,
    /// Credit normal balance
    Liability,
    /// Credit normal balance
    Equity,
    /// Credit normal balance
    Revenue,
    /// Debit normal balance
    Expense,
}

impl LedgerAccountType {
    pub fn is_credit_normal(&self) -> bool {
        matches!(
            self,
            LedgerAccountType::Liability | LedgerAccountType::Equity | LedgerAccountType::Revenue
        )
    }
}

/// One side of a journal entry: exactly one of debit/credit is non-zero and
/// both carry the same currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    pub account_id: Uuid,
    pub description: String,
    pub debit: Money,
    pub credit: Money,
}

impl JournalLine {
    pub fn debit(account_id: Uuid, description: &str, amount: Money) -> BankingResult<Self> {
        if amount.is_zero() {
            return Err(BankingError::LineMalformed(
                "debit amount must be non-zero".to_string(),
            ));
        }
        Ok(JournalLine {
            account_id,
            description: description.to_string(),
            debit: amount,
            credit: Money::zero(amount.currency()),
        })
    }

    pub fn credit(account_id: Uuid, description: &str, amount: Money) -> BankingResult<Self> {
        if amount.is_zero() {
            return Err(BankingError::LineMalformed(
                "credit amount must be non-zero".to_string(),
            ));
        }
        Ok(JournalLine {
            account_id,
            description: description.to_string(),
            debit: Money::zero(amount.currency()),
            credit: amount,
        })
    }

    pub fn is_debit(&self) -> bool {
        !self.debit.is_zero()
    }

    pub fn is_credit(&self) -> bool {
        !self.credit.is_zero()
    }

    /// The non-zero side of the line.
    pub fn amount(&self) -> Money {
        if self.is_debit() {
            self.debit
        } else {
            self.credit
        }
    }

    pub fn currency(&self) -> Currency {
        self.debit.currency()
    }

    /// Re-check structural validity for lines reconstituted from storage.
    pub fn validate(&self) -> BankingResult<()> {
        if self.debit.is_zero() && self.credit.is_zero() {
            return Err(BankingError::LineMalformed(
                "line must carry either a debit or a credit amount".to_string(),
            ));
        }
        if !self.debit.is_zero() && !self.credit.is_zero() {
            return Err(BankingError::LineMalformed(
                "line cannot carry both debit and credit amounts".to_string(),
            ));
        }
        if self.debit.currency() != self.credit.currency() {
            return Err(BankingError::LineMalformed(
                "debit and credit sides must share a currency".to_string(),
            ));
        }
        Ok(())
    }
}

/// A balanced set of debit/credit lines recording one economic event.
/// Immutable once posted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: Uuid,
    /// External reference, typically the originating transaction id.
    pub reference: HeaplessString<100>,
    pub description: HeaplessString<500>,
    pub lines: Vec<JournalLine>,
    pub state: JournalEntryState,
    pub posted_at: Option<DateTime<Utc>>,
    /// Id of the entry that reversed this one.
    pub reversed_by: Option<Uuid>,
    /// Id of the entry this one reverses.
    pub reverses: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JournalEntry {
    pub fn new(reference: &str, description: &str, lines: Vec<JournalLine>) -> BankingResult<Self> {
        let now = Utc::now();
        let entry = JournalEntry {
            id: Uuid::new_v4(),
            reference: bounded("reference", reference)?,
            description: bounded("description", description)?,
            lines,
            state: JournalEntryState::Pending,
            posted_at: None,
            reversed_by: None,
            reverses: None,
            created_at: now,
            updated_at: now,
        };
        entry.validate_balance()?;
        Ok(entry)
    }

    /// The fundamental double-entry rule: per currency, debits equal credits.
    pub fn validate_balance(&self) -> BankingResult<()> {
        if self.lines.is_empty() {
            return Err(BankingError::EmptyEntry);
        }

        let mut totals: BTreeMap<Currency, (Decimal, Decimal)> = BTreeMap::new();
        for line in &self.lines {
            line.validate()?;
            let entry = totals
                .entry(line.currency())
                .or_insert((Decimal::ZERO, Decimal::ZERO));
            entry.0 += line.debit.amount();
            entry.1 += line.credit.amount();
        }

        for (currency, (debits, credits)) in totals {
            if debits != credits {
                return Err(BankingError::Unbalanced {
                    currency,
                    debits,
                    credits,
                });
            }
        }
        Ok(())
    }

    pub fn affected_accounts(&self) -> BTreeSet<Uuid> {
        self.lines.iter().map(|line| line.account_id).collect()
    }

    pub fn currencies(&self) -> BTreeSet<Currency> {
        self.lines.iter().map(|line| line.currency()).collect()
    }

    /// Total debit-side amount for one currency.
    pub fn total_amount(&self, currency: Currency) -> Money {
        let total = self
            .lines
            .iter()
            .filter(|line| line.currency() == currency && line.is_debit())
            .map(|line| line.debit.amount())
            .sum();
        Money::new(total, currency)
    }

    pub fn can_be_modified(&self) -> bool {
        self.state == JournalEntryState::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn usd(amount: Decimal) -> Money {
        Money::new(amount, Currency::Usd)
    }

    #[test]
    fn balanced_entry_constructs() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let entry = JournalEntry::new(
            "TXN-1",
            "transfer",
            vec![
                JournalLine::debit(a, "in", usd(dec!(100))).unwrap(),
                JournalLine::credit(b, "out", usd(dec!(100))).unwrap(),
            ],
        )
        .unwrap();

        assert_eq!(entry.state, JournalEntryState::Pending);
        assert_eq!(entry.affected_accounts().len(), 2);
        assert_eq!(entry.total_amount(Currency::Usd), usd(dec!(100)));
    }

    #[test]
    fn unbalanced_entry_is_rejected() {
        let result = JournalEntry::new(
            "TXN-2",
            "bad",
            vec![
                JournalLine::debit(Uuid::new_v4(), "in", usd(dec!(100))).unwrap(),
                JournalLine::credit(Uuid::new_v4(), "out", usd(dec!(99))).unwrap(),
            ],
        );
        assert!(matches!(result, Err(BankingError::Unbalanced { .. })));
    }

    #[test]
    fn empty_entry_is_rejected() {
        let result = JournalEntry::new("TXN-3", "empty", vec![]);
        assert!(matches!(result, Err(BankingError::EmptyEntry)));
    }

    #[test]
    fn zero_line_is_rejected() {
        assert!(JournalLine::debit(Uuid::new_v4(), "zero", usd(dec!(0))).is_err());
    }

    #[test]
    fn balance_is_checked_per_currency() {
        // Balanced in USD, balanced in JPY: fine
        let entry = JournalEntry::new(
            "TXN-4",
            "multi-currency",
            vec![
                JournalLine::debit(Uuid::new_v4(), "", usd(dec!(10))).unwrap(),
                JournalLine::credit(Uuid::new_v4(), "", usd(dec!(10))).unwrap(),
                JournalLine::debit(Uuid::new_v4(), "", Money::new(dec!(500), Currency::Jpy))
                    .unwrap(),
                JournalLine::credit(Uuid::new_v4(), "", Money::new(dec!(500), Currency::Jpy))
                    .unwrap(),
            ],
        );
        assert!(entry.is_ok());

        // Balanced in total but not per currency: rejected
        let entry = JournalEntry::new(
            "TXN-5",
            "cross-currency",
            vec![
                JournalLine::debit(Uuid::new_v4(), "", usd(dec!(10))).unwrap(),
                JournalLine::credit(Uuid::new_v4(), "", Money::new(dec!(10), Currency::Eur))
                    .unwrap(),
            ],
        );
        assert!(matches!(entry, Err(BankingError::Unbalanced { .. })));
    }
}
