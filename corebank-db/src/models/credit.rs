use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use corebank_api::domain::{CreditTransactionCategory, StatementStatus};

use crate::storage::StorageModel;
use crate::tables;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditStatementModel {
    pub id: Uuid,
    pub account_id: Uuid,
    pub statement_date: NaiveDate,
    pub due_date: NaiveDate,

    pub previous_balance_amount: String,
    pub new_charges_amount: String,
    pub payments_credits_amount: String,
    pub interest_charged_amount: String,
    pub fees_charged_amount: String,
    pub current_balance_amount: String,
    pub minimum_payment_due_amount: String,
    pub available_credit_amount: String,
    pub credit_limit_amount: String,
    pub paid_amount: String,
    /// Single currency for every statement amount.
    pub currency: String,

    pub grace_period_active: bool,
    pub status: StatementStatus,
    pub paid_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StorageModel for CreditStatementModel {
    const TABLE: &'static str = tables::CREDIT_STATEMENTS;

    fn record_id(&self) -> String {
        self.id.to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditTransactionModel {
    pub id: Uuid,
    pub account_id: Uuid,
    pub transaction_id: Uuid,
    pub category: CreditTransactionCategory,
    pub amount: String,
    pub currency: String,
    pub transaction_date: NaiveDate,
    pub post_date: NaiveDate,
    pub description: String,
    pub eligible_for_grace: bool,
    pub grace_period_applies: bool,
    pub interest_charged_amount: String,
    pub interest_charged_currency: String,
    pub statement_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StorageModel for CreditTransactionModel {
    const TABLE: &'static str = tables::CREDIT_TRANSACTIONS;

    fn record_id(&self) -> String {
        self.id.to_string()
    }
}
