use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use corebank_api::domain::{AlertStatus, ComplianceAction, SuspiciousActivityType};

use crate::storage::StorageModel;
use crate::tables;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceViolationModel {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub account_id: Uuid,
    pub transaction_id: Option<Uuid>,
    pub description: String,
    pub amount: String,
    pub currency: String,
    pub action_taken: ComplianceAction,
    pub reviewer: Option<String>,
    pub review_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StorageModel for ComplianceViolationModel {
    const TABLE: &'static str = tables::COMPLIANCE_VIOLATIONS;

    fn record_id(&self) -> String {
        self.id.to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuspiciousActivityAlertModel {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub account_id: Option<Uuid>,
    pub transaction_id: Option<Uuid>,
    pub activity_type: SuspiciousActivityType,
    pub description: String,
    pub risk_score: u8,
    pub status: AlertStatus,
    pub assigned_to: Option<String>,
    pub resolution_notes: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StorageModel for SuspiciousActivityAlertModel {
    const TABLE: &'static str = tables::SUSPICIOUS_ACTIVITY_ALERTS;

    fn record_id(&self) -> String {
        self.id.to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LargeTransactionReportModel {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub transaction_id: Option<Uuid>,
    pub amount: String,
    pub amount_currency: String,
    pub transaction_type: String,
    pub threshold_amount: String,
    pub threshold_currency: String,
    pub filed_at: Option<DateTime<Utc>>,
    pub filing_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StorageModel for LargeTransactionReportModel {
    const TABLE: &'static str = tables::LARGE_TRANSACTION_REPORTS;

    fn record_id(&self) -> String {
        self.id.to_string()
    }
}
