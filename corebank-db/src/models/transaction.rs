use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use corebank_api::domain::{
    ComplianceDecision, TransactionChannel, TransactionState, TransactionType,
};

use crate::storage::StorageModel;
use crate::tables;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionModel {
    pub id: Uuid,
    pub transaction_type: TransactionType,
    pub from_account_id: Option<Uuid>,
    pub to_account_id: Option<Uuid>,
    pub amount: String,
    pub currency: String,
    pub description: String,
    pub idempotency_key: String,
    pub channel: TransactionChannel,
    pub state: TransactionState,
    pub compliance_decision: Option<ComplianceDecision>,
    pub error_message: Option<String>,
    pub journal_entry_id: Option<Uuid>,
    pub original_transaction_id: Option<Uuid>,
    pub reversal_transaction_id: Option<Uuid>,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StorageModel for TransactionModel {
    const TABLE: &'static str = tables::TRANSACTIONS;

    fn record_id(&self) -> String {
        self.id.to_string()
    }
}
