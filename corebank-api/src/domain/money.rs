use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::{BankingError, BankingResult};

/// ISO 4217 currency codes supported by the engine, with minor-unit precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
    Jpy,
    Cad,
    Chf,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Jpy => "JPY",
            Currency::Cad => "CAD",
            Currency::Chf => "CHF",
        }
    }

    /// Number of decimal places for the currency's minor unit.
    pub fn precision(&self) -> u32 {
        match self {
            Currency::Jpy => 0,
            _ => 2,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = BankingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "GBP" => Ok(Currency::Gbp),
            "JPY" => Ok(Currency::Jpy),
            "CAD" => Ok(Currency::Cad),
            "CHF" => Ok(Currency::Chf),
            other => Err(BankingError::validation(
                "currency",
                format!("unsupported currency code: {other}"),
            )),
        }
    }
}

/// An exact decimal amount bound to a currency.
///
/// Every construction rounds half-up to the currency's minor-unit precision,
/// so a `Money` value is always representable in that currency. Arithmetic
/// across currencies is a hard error; money never passes through binary
/// floating point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Money {
            amount: amount
                .round_dp_with_strategy(currency.precision(), RoundingStrategy::MidpointAwayFromZero),
            currency,
        }
    }

    pub fn zero(currency: Currency) -> Self {
        Money::new(Decimal::ZERO, currency)
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    fn require_same_currency(&self, other: &Money) -> BankingResult<()> {
        if self.currency != other.currency {
            return Err(BankingError::CurrencyMismatch {
                expected: self.currency,
                actual: other.currency,
            });
        }
        Ok(())
    }

    pub fn checked_add(&self, other: &Money) -> BankingResult<Money> {
        self.require_same_currency(other)?;
        Ok(Money::new(self.amount + other.amount, self.currency))
    }

    pub fn checked_sub(&self, other: &Money) -> BankingResult<Money> {
        self.require_same_currency(other)?;
        Ok(Money::new(self.amount - other.amount, self.currency))
    }

    pub fn mul(&self, factor: Decimal) -> Money {
        Money::new(self.amount * factor, self.currency)
    }

    pub fn div(&self, divisor: Decimal) -> BankingResult<Money> {
        if divisor.is_zero() {
            return Err(BankingError::validation("divisor", "division by zero"));
        }
        Ok(Money::new(self.amount / divisor, self.currency))
    }

    pub fn negate(&self) -> Money {
        Money::new(-self.amount, self.currency)
    }

    pub fn abs(&self) -> Money {
        Money::new(self.amount.abs(), self.currency)
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    pub fn try_cmp(&self, other: &Money) -> BankingResult<Ordering> {
        self.require_same_currency(other)?;
        Ok(self.amount.cmp(&other.amount))
    }

    pub fn max_of(self, other: Money) -> BankingResult<Money> {
        Ok(match self.try_cmp(&other)? {
            Ordering::Less => other,
            _ => self,
        })
    }

    pub fn min_of(self, other: Money) -> BankingResult<Money> {
        Ok(match self.try_cmp(&other)? {
            Ordering::Greater => other,
            _ => self,
        })
    }
}

impl PartialOrd for Money {
    /// Cross-currency comparison yields `None`; callers that need a hard
    /// error use [`Money::try_cmp`].
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.currency != other.currency {
            return None;
        }
        Some(self.amount.cmp(&other.amount))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.currency.code(), self.amount)
    }
}
