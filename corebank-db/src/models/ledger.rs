use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use corebank_api::domain::JournalEntryState;

use crate::storage::StorageModel;
use crate::tables;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalLineModel {
    pub account_id: Uuid,
    pub description: String,
    pub debit_amount: String,
    pub debit_currency: String,
    pub credit_amount: String,
    pub credit_currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntryModel {
    pub id: Uuid,
    pub reference: String,
    pub description: String,
    pub lines: Vec<JournalLineModel>,
    pub state: JournalEntryState,
    pub posted_at: Option<DateTime<Utc>>,
    pub reversed_by: Option<Uuid>,
    pub reverses: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StorageModel for JournalEntryModel {
    const TABLE: &'static str = tables::JOURNAL_ENTRIES;

    fn record_id(&self) -> String {
        self.id.to_string()
    }
}
