//! Process-wide configuration, loaded once by the host. Defaults cover every
//! field; `COREBANK_*` environment variables override them (nested sections
//! separated by `__`, e.g. `COREBANK_CREDIT__LATE_FEE_USD=40`).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use corebank_api::domain::{
    Currency, InterestCalculationMethod, KycTier, Money, ProductType,
};
use corebank_api::{BankingError, BankingResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Regulatory reporting threshold for single transactions.
    pub large_transaction_threshold_usd: Decimal,
    pub credit: CreditConfig,
    pub loan: LoanConfig,
    pub interest: InterestConfig,
    pub kyc: KycConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditConfig {
    /// Days from statement date to due date.
    pub grace_period_days: u32,
    /// Minimum payment as a fraction of the statement balance.
    pub minimum_payment_rate: Decimal,
    pub minimum_payment_floor_usd: Decimal,
    pub late_fee_usd: Decimal,
    pub overlimit_fee_usd: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanConfig {
    pub default_late_fee_usd: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterestConfig {
    /// Seed rate configurations per (product type, currency).
    pub default_rates: Vec<DefaultRate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultRate {
    pub product_type: ProductType,
    pub currency: Currency,
    pub annual_rate: Decimal,
    pub calculation_method: InterestCalculationMethod,
    pub minimum_balance: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KycConfig {
    pub tier0: TierLimits,
    pub tier1: TierLimits,
    pub tier2: TierLimits,
    pub tier3: TierLimits,
}

/// Per-tier transaction limits, denominated in USD and applied in the
/// transaction currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierLimits {
    pub single_transaction_limit: Decimal,
    pub daily_transaction_limit: Decimal,
    pub monthly_transaction_limit: Decimal,
    pub annual_cumulative_limit: Option<Decimal>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        CoreConfig {
            large_transaction_threshold_usd: Decimal::from(10_000),
            credit: CreditConfig {
                grace_period_days: 25,
                minimum_payment_rate: Decimal::new(2, 2), // 2%
                minimum_payment_floor_usd: Decimal::from(25),
                late_fee_usd: Decimal::from(35),
                overlimit_fee_usd: Decimal::from(25),
            },
            loan: LoanConfig {
                default_late_fee_usd: Decimal::from(25),
            },
            interest: InterestConfig {
                default_rates: vec![
                    DefaultRate {
                        product_type: ProductType::Savings,
                        currency: Currency::Usd,
                        annual_rate: Decimal::new(2, 2), // 2% APY
                        calculation_method: InterestCalculationMethod::Actual365,
                        minimum_balance: Some(Decimal::ONE),
                    },
                    DefaultRate {
                        product_type: ProductType::Checking,
                        currency: Currency::Usd,
                        annual_rate: Decimal::new(5, 3), // 0.5% APY
                        calculation_method: InterestCalculationMethod::Actual365,
                        minimum_balance: Some(Decimal::from(100)),
                    },
                    DefaultRate {
                        product_type: ProductType::CreditLine,
                        currency: Currency::Usd,
                        annual_rate: Decimal::new(1899, 4), // 18.99% APR
                        calculation_method: InterestCalculationMethod::Actual365,
                        minimum_balance: None,
                    },
                    DefaultRate {
                        product_type: ProductType::Loan,
                        currency: Currency::Usd,
                        annual_rate: Decimal::new(75, 3), // 7.5% APR
                        calculation_method: InterestCalculationMethod::Actual360,
                        minimum_balance: None,
                    },
                ],
            },
            kyc: KycConfig {
                tier0: TierLimits {
                    single_transaction_limit: Decimal::from(100),
                    daily_transaction_limit: Decimal::from(100),
                    monthly_transaction_limit: Decimal::from(1_000),
                    annual_cumulative_limit: None,
                },
                tier1: TierLimits {
                    single_transaction_limit: Decimal::from(1_000),
                    daily_transaction_limit: Decimal::from(1_000),
                    monthly_transaction_limit: Decimal::from(10_000),
                    annual_cumulative_limit: Some(Decimal::from(50_000)),
                },
                tier2: TierLimits {
                    single_transaction_limit: Decimal::from(10_000),
                    daily_transaction_limit: Decimal::from(10_000),
                    monthly_transaction_limit: Decimal::from(100_000),
                    annual_cumulative_limit: Some(Decimal::from(500_000)),
                },
                tier3: TierLimits {
                    single_transaction_limit: Decimal::from(100_000),
                    daily_transaction_limit: Decimal::from(100_000),
                    monthly_transaction_limit: Decimal::from(1_000_000),
                    annual_cumulative_limit: None,
                },
            },
        }
    }
}

impl CoreConfig {
    /// Layered load: built-in defaults, then `COREBANK_*` environment
    /// overrides.
    pub fn load() -> BankingResult<Self> {
        let defaults = config::Config::try_from(&CoreConfig::default())
            .map_err(|err| BankingError::validation("config", err.to_string()))?;
        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(config::Environment::with_prefix("COREBANK").separator("__"))
            .build()
            .map_err(|err| BankingError::validation("config", err.to_string()))?;
        settings
            .try_deserialize()
            .map_err(|err| BankingError::validation("config", err.to_string()))
    }

    pub fn tier_limits(&self, tier: KycTier) -> BankingResult<&TierLimits> {
        Ok(match tier {
            KycTier::Tier0 => &self.kyc.tier0,
            KycTier::Tier1 => &self.kyc.tier1,
            KycTier::Tier2 => &self.kyc.tier2,
            KycTier::Tier3 => &self.kyc.tier3,
        })
    }

    pub fn large_transaction_threshold(&self) -> Money {
        Money::new(self.large_transaction_threshold_usd, Currency::Usd)
    }

    /// Fee parameters are USD-denominated and applied in the account
    /// currency.
    pub fn credit_late_fee(&self, currency: Currency) -> Money {
        Money::new(self.credit.late_fee_usd, currency)
    }

    pub fn credit_overlimit_fee(&self, currency: Currency) -> Money {
        Money::new(self.credit.overlimit_fee_usd, currency)
    }

    pub fn credit_minimum_payment_floor(&self, currency: Currency) -> Money {
        Money::new(self.credit.minimum_payment_floor_usd, currency)
    }

    pub fn loan_default_late_fee(&self, currency: Currency) -> Money {
        Money::new(self.loan.default_late_fee_usd, currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_parameters() {
        let config = CoreConfig::default();
        assert_eq!(config.large_transaction_threshold_usd, Decimal::from(10_000));
        assert_eq!(config.credit.grace_period_days, 25);
        assert_eq!(config.credit.minimum_payment_rate, Decimal::new(2, 2));
        assert_eq!(config.credit.late_fee_usd, Decimal::from(35));
        assert_eq!(config.loan.default_late_fee_usd, Decimal::from(25));
        assert_eq!(config.interest.default_rates.len(), 4);
        assert_eq!(
            config.tier_limits(KycTier::Tier3).unwrap().daily_transaction_limit,
            Decimal::from(100_000)
        );
    }

    #[test]
    fn fees_are_applied_in_the_account_currency() {
        let config = CoreConfig::default();
        let fee = config.credit_late_fee(Currency::Eur);
        assert_eq!(fee.currency(), Currency::Eur);
        assert_eq!(fee.amount(), Decimal::from(35));
    }
}
