use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use corebank_api::domain::{
    CompoundingFrequency, InterestCalculationMethod, ProductType,
};

use crate::storage::StorageModel;
use crate::tables;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterestRateConfigModel {
    pub id: Uuid,
    pub product_type: ProductType,
    pub currency: String,
    pub annual_rate: Decimal,
    pub calculation_method: InterestCalculationMethod,
    pub compounding_frequency: CompoundingFrequency,
    pub minimum_balance_amount: Option<String>,
    pub minimum_balance_currency: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StorageModel for InterestRateConfigModel {
    const TABLE: &'static str = tables::INTEREST_RATE_CONFIGS;

    fn record_id(&self) -> String {
        self.id.to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterestAccrualModel {
    pub id: Uuid,
    pub account_id: Uuid,
    pub accrual_date: NaiveDate,
    pub principal_amount: String,
    pub principal_currency: String,
    pub daily_rate: Decimal,
    pub accrued_amount: String,
    pub accrued_currency: String,
    pub cumulative_amount: String,
    pub cumulative_currency: String,
    pub calculation_method: InterestCalculationMethod,
    pub rate_config_id: Uuid,
    pub posted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StorageModel for InterestAccrualModel {
    const TABLE: &'static str = tables::INTEREST_ACCRUALS;

    fn record_id(&self) -> String {
        self.id.to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GracePeriodModel {
    pub id: Uuid,
    pub account_id: Uuid,
    pub statement_date: NaiveDate,
    pub statement_balance_amount: String,
    pub statement_balance_currency: String,
    pub due_date: NaiveDate,
    pub grace_period_active: bool,
    pub full_payment_received: bool,
    pub grace_period_lost_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StorageModel for GracePeriodModel {
    const TABLE: &'static str = tables::GRACE_PERIODS;

    fn record_id(&self) -> String {
        self.id.to_string()
    }
}
