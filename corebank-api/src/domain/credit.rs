use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::money::Money;
use crate::{BankingError, BankingResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatementStatus {
    /// Current unpaid statement
    Current,
    /// Paid in full by due date
    PaidFull,
    /// Minimum payment made
    PaidMinimum,
    /// Past due date with balance
    Overdue,
    Closed,
}

/// Classification of a posting on a revolving credit line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreditTransactionCategory {
    /// Regular purchases, eligible for grace
    Purchase,
    /// Never eligible for grace
    CashAdvance,
    BalanceTransfer,
    /// Never eligible for grace
    Fee,
    Payment,
    Interest,
    Reversal,
}

impl CreditTransactionCategory {
    pub fn is_charge(&self) -> bool {
        matches!(
            self,
            CreditTransactionCategory::Purchase
                | CreditTransactionCategory::CashAdvance
                | CreditTransactionCategory::BalanceTransfer
        )
    }

    pub fn eligible_for_grace(&self) -> bool {
        !matches!(
            self,
            CreditTransactionCategory::CashAdvance | CreditTransactionCategory::Fee
        )
    }
}

/// Monthly credit line statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditStatement {
    pub id: Uuid,
    pub account_id: Uuid,
    pub statement_date: NaiveDate,
    pub due_date: NaiveDate,

    pub previous_balance: Money,
    pub new_charges: Money,
    pub payments_credits: Money,
    pub interest_charged: Money,
    pub fees_charged: Money,
    pub current_balance: Money,

    pub minimum_payment_due: Money,
    pub available_credit: Money,
    pub credit_limit: Money,

    pub grace_period_active: bool,
    pub status: StatementStatus,
    pub paid_amount: Money,
    pub paid_date: Option<NaiveDate>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CreditStatement {
    pub fn validate_currency_consistency(&self) -> BankingResult<()> {
        let currency = self.current_balance.currency();
        let amounts = [
            &self.previous_balance,
            &self.new_charges,
            &self.payments_credits,
            &self.interest_charged,
            &self.fees_charged,
            &self.minimum_payment_due,
            &self.available_credit,
            &self.credit_limit,
            &self.paid_amount,
        ];
        if amounts.iter().any(|money| money.currency() != currency) {
            return Err(BankingError::validation(
                "statement",
                "all statement amounts must use the same currency",
            ));
        }
        Ok(())
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        today > self.due_date && !self.current_balance.is_zero()
    }

    pub fn days_overdue(&self, today: NaiveDate) -> i64 {
        if !self.is_overdue(today) {
            return 0;
        }
        (today - self.due_date).num_days()
    }

    pub fn is_minimum_paid(&self) -> bool {
        self.paid_amount >= self.minimum_payment_due
    }

    pub fn is_paid_full(&self) -> bool {
        self.paid_amount >= self.current_balance
    }

    pub fn remaining_balance(&self) -> BankingResult<Money> {
        self.current_balance.checked_sub(&self.paid_amount)
    }
}

/// Per-cycle classifier over an underlying transaction on a credit line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditTransaction {
    pub id: Uuid,
    pub account_id: Uuid,
    /// The underlying processed transaction.
    pub transaction_id: Uuid,
    pub category: CreditTransactionCategory,
    pub amount: Money,
    pub transaction_date: NaiveDate,
    pub post_date: NaiveDate,
    pub description: String,
    /// Category-level eligibility; false for cash advances and fees.
    pub eligible_for_grace: bool,
    /// Whether grace actually applies, from prior-cycle payment history.
    pub grace_period_applies: bool,
    pub interest_charged: Money,
    /// Statement this transaction was billed on.
    pub statement_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Currency;
    use rust_decimal_macros::dec;

    fn usd(amount: rust_decimal::Decimal) -> Money {
        Money::new(amount, Currency::Usd)
    }

    fn statement(balance: Money, minimum: Money, paid: Money) -> CreditStatement {
        let now = Utc::now();
        CreditStatement {
            id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            statement_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2025, 1, 26).unwrap(),
            previous_balance: usd(dec!(0)),
            new_charges: balance,
            payments_credits: usd(dec!(0)),
            interest_charged: usd(dec!(0)),
            fees_charged: usd(dec!(0)),
            current_balance: balance,
            minimum_payment_due: minimum,
            available_credit: usd(dec!(0)),
            credit_limit: usd(dec!(3000)),
            grace_period_active: true,
            status: StatementStatus::Current,
            paid_amount: paid,
            paid_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn payment_status_predicates() {
        let s = statement(usd(dec!(800)), usd(dec!(25)), usd(dec!(0)));
        assert!(!s.is_minimum_paid());
        assert!(!s.is_paid_full());

        let s = statement(usd(dec!(800)), usd(dec!(25)), usd(dec!(25)));
        assert!(s.is_minimum_paid());
        assert!(!s.is_paid_full());

        let s = statement(usd(dec!(800)), usd(dec!(25)), usd(dec!(800)));
        assert!(s.is_paid_full());
        assert_eq!(s.remaining_balance().unwrap(), usd(dec!(0)));
    }

    #[test]
    fn overdue_requires_balance_and_past_due_date() {
        let s = statement(usd(dec!(800)), usd(dec!(25)), usd(dec!(0)));
        assert!(!s.is_overdue(NaiveDate::from_ymd_opt(2025, 1, 26).unwrap()));
        assert!(s.is_overdue(NaiveDate::from_ymd_opt(2025, 1, 27).unwrap()));
        assert_eq!(s.days_overdue(NaiveDate::from_ymd_opt(2025, 2, 5).unwrap()), 10);

        let paid_off = statement(usd(dec!(0)), usd(dec!(0)), usd(dec!(0)));
        assert!(!paid_off.is_overdue(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()));
    }

    #[test]
    fn grace_eligibility_by_category() {
        assert!(CreditTransactionCategory::Purchase.eligible_for_grace());
        assert!(CreditTransactionCategory::BalanceTransfer.eligible_for_grace());
        assert!(!CreditTransactionCategory::CashAdvance.eligible_for_grace());
        assert!(!CreditTransactionCategory::Fee.eligible_for_grace());
    }
}
