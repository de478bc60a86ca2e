use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    Currency, GracePeriodTracker, InterestRateConfig, Money, ProductType,
};
use crate::error::BankingResult;

/// Daily accrual, grace-period handling for revolving credit, and monthly
/// posting through the transaction pipeline.
pub trait InterestService: Send + Sync {
    /// Accrue one day of interest for every eligible ACTIVE account.
    /// Idempotent per (account, date); individual account failures are
    /// logged to the audit trail and the run continues.
    fn run_daily_accrual(&self, accrual_date: NaiveDate) -> BankingResult<AccrualRunReport>;

    /// Post each account's unposted accruals for exactly the given month as
    /// one interest transaction, using a stable `INT-<account>-YYYYMM`
    /// idempotency key so re-runs collapse.
    fn post_monthly_interest(&self, month: u32, year: i32)
        -> BankingResult<InterestPostingReport>;

    /// Reassess the grace period after a payment on a revolving credit
    /// account. Returns the updated tracker when one exists.
    fn update_grace_period_status(
        &self,
        account_id: Uuid,
        payment_amount: Money,
        payment_date: NaiveDate,
    ) -> BankingResult<Option<GracePeriodTracker>>;

    /// Open a new grace tracker for a statement cycle.
    fn create_grace_period(
        &self,
        account_id: Uuid,
        statement_date: NaiveDate,
        statement_balance: Money,
        due_date: NaiveDate,
    ) -> BankingResult<GracePeriodTracker>;

    fn current_grace_period(&self, account_id: Uuid)
        -> BankingResult<Option<GracePeriodTracker>>;

    fn upsert_rate_config(&self, config: InterestRateConfig) -> BankingResult<InterestRateConfig>;

    fn rate_config(
        &self,
        product_type: ProductType,
        currency: Currency,
    ) -> BankingResult<Option<InterestRateConfig>>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccrualRunReport {
    pub accrual_date: NaiveDate,
    pub accounts_processed: i64,
    pub accruals: Vec<AccountAccrual>,
    pub errors: Vec<String>,
}

impl AccrualRunReport {
    pub fn count_for(&self, product_type: ProductType) -> usize {
        self.accruals
            .iter()
            .filter(|accrual| accrual.product_type == product_type)
            .count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountAccrual {
    pub account_id: Uuid,
    pub product_type: ProductType,
    pub principal_balance: Money,
    pub daily_rate: Decimal,
    pub accrued_amount: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterestPostingReport {
    pub month: u32,
    pub year: i32,
    pub postings: Vec<InterestPosting>,
    pub errors: Vec<String>,
}

impl InterestPostingReport {
    pub fn transactions_for(&self, product_type: ProductType) -> Vec<Uuid> {
        self.postings
            .iter()
            .filter(|posting| posting.product_type == product_type)
            .map(|posting| posting.transaction_id)
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterestPosting {
    pub account_id: Uuid,
    pub product_type: ProductType,
    pub transaction_id: Uuid,
    pub amount: Money,
    pub accrual_count: usize,
}
