use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::account::ProductType;
use super::money::{Currency, Money};
use crate::{BankingError, BankingResult};

/// Day-count conventions for converting an annual rate to a daily rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterestCalculationMethod {
    Actual365,
    /// Common for loans
    Actual360,
    Thirty360,
}

impl InterestCalculationMethod {
    pub fn day_count_divisor(&self) -> Decimal {
        match self {
            InterestCalculationMethod::Actual365 => Decimal::from(365),
            InterestCalculationMethod::Actual360 | InterestCalculationMethod::Thirty360 => {
                Decimal::from(360)
            }
        }
    }
}

/// How often interest compounds. Informational; accrual itself is daily.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompoundingFrequency {
    Daily,
    Monthly,
    Quarterly,
    Annually,
}

/// Interest rate configuration per (product type, currency).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterestRateConfig {
    pub id: Uuid,
    pub product_type: ProductType,
    pub currency: Currency,
    /// Annual rate as a fraction, e.g. 0.02 for 2%.
    pub annual_rate: Decimal,
    pub calculation_method: InterestCalculationMethod,
    pub compounding_frequency: CompoundingFrequency,
    /// Minimum balance required to earn interest (deposit products).
    pub minimum_balance: Option<Money>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InterestRateConfig {
    pub fn validate(&self) -> BankingResult<()> {
        if self.annual_rate < Decimal::ZERO || self.annual_rate > Decimal::ONE {
            return Err(BankingError::validation(
                "annual_rate",
                "annual interest rate must be between 0 and 1 (0-100%)",
            ));
        }
        if let Some(minimum) = &self.minimum_balance {
            if minimum.currency() != self.currency {
                return Err(BankingError::validation(
                    "minimum_balance",
                    "minimum balance currency must match config currency",
                ));
            }
        }
        Ok(())
    }

    pub fn daily_rate(&self) -> Decimal {
        self.annual_rate / self.calculation_method.day_count_divisor()
    }
}

/// Daily interest accrual record: at most one per (account, date).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterestAccrual {
    pub id: Uuid,
    pub account_id: Uuid,
    pub accrual_date: NaiveDate,
    /// Balance the day's interest was computed on.
    pub principal_balance: Money,
    pub daily_rate: Decimal,
    pub accrued_amount: Money,
    /// Total accrued since the last posting, inclusive of this row.
    pub cumulative_accrued: Money,
    pub calculation_method: InterestCalculationMethod,
    pub rate_config_id: Uuid,
    pub posted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Grace period tracking for revolving credit. While valid, purchases accrue
/// no interest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GracePeriodTracker {
    pub id: Uuid,
    pub account_id: Uuid,
    pub statement_date: NaiveDate,
    pub statement_balance: Money,
    pub due_date: NaiveDate,
    pub grace_period_active: bool,
    pub full_payment_received: bool,
    pub grace_period_lost_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GracePeriodTracker {
    pub fn is_grace_period_valid(&self) -> bool {
        self.grace_period_active && self.grace_period_lost_date.is_none()
    }

    pub fn days_until_due(&self, today: NaiveDate) -> i64 {
        (self.due_date - today).num_days()
    }
}
