use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::money::Money;
use crate::{BankingError, BankingResult};

/// Loan lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanState {
    /// Approved and created
    Originated,
    /// Funds disbursed to the customer
    Disbursed,
    /// In regular repayment
    Active,
    PaidOff,
    Defaulted,
    WrittenOff,
    Closed,
}

impl std::fmt::Display for LoanState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LoanState::Originated => "originated",
            LoanState::Disbursed => "disbursed",
            LoanState::Active => "active",
            LoanState::PaidOff => "paid_off",
            LoanState::Defaulted => "defaulted",
            LoanState::WrittenOff => "written_off",
            LoanState::Closed => "closed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AmortizationMethod {
    /// French method: equal payments
    EqualInstallment,
    /// Equal principal, declining interest
    EqualPrincipal,
    /// Interest only, principal at maturity
    Bullet,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentFrequency {
    Weekly,
    BiWeekly,
    Monthly,
    Quarterly,
    SemiAnnually,
    Annually,
}

impl PaymentFrequency {
    pub fn payments_per_year(&self) -> u32 {
        match self {
            PaymentFrequency::Weekly => 52,
            PaymentFrequency::BiWeekly => 26,
            PaymentFrequency::Monthly => 12,
            PaymentFrequency::Quarterly => 4,
            PaymentFrequency::SemiAnnually => 2,
            PaymentFrequency::Annually => 1,
        }
    }
}

/// Contractual terms of a loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal_amount: Money,
    /// e.g. 0.075 for 7.5%
    pub annual_interest_rate: Decimal,
    pub term_months: u32,
    pub payment_frequency: PaymentFrequency,
    pub amortization_method: AmortizationMethod,
    pub first_payment_date: NaiveDate,
    pub allow_prepayment: bool,
    /// e.g. 0.02 for a 2% penalty on the prepaid excess
    pub prepayment_penalty_rate: Option<Decimal>,
    /// Days past a scheduled date before a late fee applies.
    pub grace_period_days: u32,
    pub late_fee: Money,
}

impl LoanTerms {
    pub fn validate(&self) -> BankingResult<()> {
        if !self.principal_amount.is_positive() {
            return Err(BankingError::validation(
                "principal_amount",
                "principal must be positive",
            ));
        }
        if self.annual_interest_rate < Decimal::ZERO {
            return Err(BankingError::validation(
                "annual_interest_rate",
                "interest rate cannot be negative",
            ));
        }
        if self.term_months == 0 {
            return Err(BankingError::validation(
                "term_months",
                "term must be greater than zero",
            ));
        }
        if self.late_fee.currency() != self.principal_amount.currency() {
            return Err(BankingError::validation(
                "late_fee",
                "late fee currency must match principal currency",
            ));
        }
        if self.total_payments() == 0 {
            return Err(BankingError::validation(
                "term_months",
                "term too short for the selected payment frequency",
            ));
        }
        Ok(())
    }

    /// Total number of scheduled payments, truncating partial periods.
    pub fn total_payments(&self) -> u32 {
        self.term_months * self.payment_frequency.payments_per_year() / 12
    }

    pub fn periodic_rate(&self) -> Decimal {
        self.annual_interest_rate / Decimal::from(self.payment_frequency.payments_per_year())
    }

    /// Scheduled payment for the equal-installment method:
    /// `P * c(1+c)^n / ((1+c)^n - 1)`, falling back to `P / n` at zero rate.
    pub fn scheduled_payment(&self) -> BankingResult<Money> {
        let principal = self.principal_amount.amount();
        let periodic_rate = self.periodic_rate();
        let num_payments = self.total_payments();

        if periodic_rate.is_zero() {
            return self.principal_amount.div(Decimal::from(num_payments));
        }

        let factor = (Decimal::ONE + periodic_rate).powi(num_payments as i64);
        let payment = principal * (periodic_rate * factor) / (factor - Decimal::ONE);
        Ok(Money::new(payment, self.principal_amount.currency()))
    }
}

/// A loan bound to one internal liability account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    pub id: Uuid,
    /// Companion loan account in the ledger.
    pub account_id: Uuid,
    pub customer_id: Uuid,
    pub terms: LoanTerms,
    pub state: LoanState,

    /// Remaining principal.
    pub current_balance: Money,
    pub total_paid: Money,
    pub interest_paid: Money,
    pub principal_paid: Money,

    pub originated_date: Option<NaiveDate>,
    pub disbursed_date: Option<NaiveDate>,
    pub first_payment_date: Option<NaiveDate>,
    pub last_payment_date: Option<NaiveDate>,
    pub maturity_date: Option<NaiveDate>,

    pub days_past_due: u32,
    pub last_late_fee_date: Option<NaiveDate>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loan {
    pub fn is_in_repayment(&self) -> bool {
        matches!(self.state, LoanState::Disbursed | LoanState::Active)
    }

    pub fn is_paid_off(&self) -> bool {
        self.current_balance.is_zero() || self.state == LoanState::PaidOff
    }

    pub fn is_past_due(&self) -> bool {
        self.days_past_due > 0
    }
}

/// Single row of an amortization schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationEntry {
    pub payment_number: u32,
    pub payment_date: NaiveDate,
    pub payment_amount: Money,
    pub principal_amount: Money,
    pub interest_amount: Money,
    pub remaining_balance: Money,
}

impl AmortizationEntry {
    /// Payment must equal principal + interest within one minor unit.
    pub fn validate(&self) -> BankingResult<()> {
        let computed = self.principal_amount.checked_add(&self.interest_amount)?;
        let tolerance = Decimal::ONE
            / Decimal::from(10u32.pow(self.payment_amount.currency().precision()));
        if (computed.amount() - self.payment_amount.amount()).abs() > tolerance {
            return Err(BankingError::Invariant(format!(
                "amortization entry {}: payment {} != principal {} + interest {}",
                self.payment_number,
                self.payment_amount,
                self.principal_amount,
                self.interest_amount
            )));
        }
        Ok(())
    }
}

/// Record of one loan payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanPayment {
    pub id: Uuid,
    pub loan_id: Uuid,
    pub transaction_id: Uuid,
    pub payment_date: NaiveDate,
    pub payment_amount: Money,
    pub principal_amount: Money,
    pub interest_amount: Money,
    pub late_fee: Money,
    pub prepayment_penalty: Money,
    pub scheduled_payment_number: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Currency;
    use rust_decimal_macros::dec;

    fn terms(principal: Decimal, rate: Decimal, months: u32) -> LoanTerms {
        LoanTerms {
            principal_amount: Money::new(principal, Currency::Usd),
            annual_interest_rate: rate,
            term_months: months,
            payment_frequency: PaymentFrequency::Monthly,
            amortization_method: AmortizationMethod::EqualInstallment,
            first_payment_date: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
            allow_prepayment: true,
            prepayment_penalty_rate: None,
            grace_period_days: 10,
            late_fee: Money::new(dec!(25), Currency::Usd),
        }
    }

    #[test]
    fn equal_installment_payment_formula() {
        // 10,000 at 6% over 12 months: the classic 860.66 installment
        let payment = terms(dec!(10000), dec!(0.06), 12).scheduled_payment().unwrap();
        assert_eq!(payment.amount(), dec!(860.66));
    }

    #[test]
    fn zero_rate_payment_is_simple_division() {
        let payment = terms(dec!(1200), dec!(0), 12).scheduled_payment().unwrap();
        assert_eq!(payment.amount(), dec!(100.00));
    }

    #[test]
    fn total_payments_truncates_partial_periods() {
        let mut t = terms(dec!(1000), dec!(0.05), 13);
        assert_eq!(t.total_payments(), 13);

        t.term_months = 7;
        t.payment_frequency = PaymentFrequency::Quarterly;
        assert_eq!(t.total_payments(), 2);
    }

    #[test]
    fn terms_validation() {
        assert!(terms(dec!(0), dec!(0.06), 12).validate().is_err());
        assert!(terms(dec!(1000), dec!(-0.01), 12).validate().is_err());
        assert!(terms(dec!(1000), dec!(0.06), 0).validate().is_err());
        assert!(terms(dec!(1000), dec!(0.06), 12).validate().is_ok());
    }

    #[test]
    fn amortization_entry_tolerance() {
        let entry = AmortizationEntry {
            payment_number: 1,
            payment_date: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
            payment_amount: Money::new(dec!(860.66), Currency::Usd),
            principal_amount: Money::new(dec!(810.66), Currency::Usd),
            interest_amount: Money::new(dec!(50.00), Currency::Usd),
            remaining_balance: Money::new(dec!(9189.34), Currency::Usd),
        };
        assert!(entry.validate().is_ok());

        let broken = AmortizationEntry {
            interest_amount: Money::new(dec!(55.00), Currency::Usd),
            ..entry
        };
        assert!(broken.validate().is_err());
    }
}
