use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use corebank_api::domain::{AmortizationMethod, LoanState, PaymentFrequency};

use crate::storage::StorageModel;
use crate::tables;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanTermsModel {
    pub principal_amount: String,
    pub principal_currency: String,
    pub annual_interest_rate: Decimal,
    pub term_months: u32,
    pub payment_frequency: PaymentFrequency,
    pub amortization_method: AmortizationMethod,
    pub first_payment_date: NaiveDate,
    pub allow_prepayment: bool,
    pub prepayment_penalty_rate: Option<Decimal>,
    pub grace_period_days: u32,
    pub late_fee_amount: String,
    pub late_fee_currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanModel {
    pub id: Uuid,
    pub account_id: Uuid,
    pub customer_id: Uuid,
    pub terms: LoanTermsModel,
    pub state: LoanState,

    pub current_balance_amount: String,
    pub total_paid_amount: String,
    pub interest_paid_amount: String,
    pub principal_paid_amount: String,
    pub currency: String,

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

impl StorageModel for LoanModel {
    const TABLE: &'static str = tables::LOANS;

    fn record_id(&self) -> String {
        self.id.to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanPaymentModel {
    pub id: Uuid,
    pub loan_id: Uuid,
    pub transaction_id: Uuid,
    pub payment_date: NaiveDate,
    pub payment_amount: String,
    pub principal_amount: String,
    pub interest_amount: String,
    pub late_fee_amount: String,
    pub prepayment_penalty_amount: String,
    pub currency: String,
    pub scheduled_payment_number: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StorageModel for LoanPaymentModel {
    const TABLE: &'static str = tables::LOAN_PAYMENTS;

    fn record_id(&self) -> String {
        self.id.to_string()
    }
}

/// One schedule row; keyed `<loan_id>_<payment_number>` so regeneration
/// overwrites in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationEntryModel {
    pub loan_id: Uuid,
    pub payment_number: u32,
    pub payment_date: NaiveDate,
    pub payment_amount: String,
    pub principal_amount: String,
    pub interest_amount: String,
    pub remaining_balance_amount: String,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StorageModel for AmortizationEntryModel {
    const TABLE: &'static str = tables::AMORTIZATION_SCHEDULES;

    fn record_id(&self) -> String {
        format!("{}_{}", self.loan_id, self.payment_number)
    }
}
