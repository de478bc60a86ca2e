use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use corebank_api::domain::AuditEventType;

use crate::storage::StorageModel;
use crate::tables;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEventModel {
    pub id: Uuid,
    pub sequence: u64,
    pub event_type: AuditEventType,
    pub entity_type: String,
    pub entity_id: String,
    pub metadata: BTreeMap<String, String>,
    pub recorded_at: DateTime<Utc>,
    pub previous_digest: String,
    pub digest: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StorageModel for AuditEventModel {
    const TABLE: &'static str = tables::AUDIT_EVENTS;

    fn record_id(&self) -> String {
        self.id.to_string()
    }
}
