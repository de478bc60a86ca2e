use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::money::Money;

/// KYC tiers with graduated transaction limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KycTier {
    /// No KYC, minimal limits
    Tier0,
    /// Basic KYC
    Tier1,
    /// Enhanced KYC
    Tier2,
    /// Full KYC, highest limits
    Tier3,
}

impl std::fmt::Display for KycTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            KycTier::Tier0 => "tier_0",
            KycTier::Tier1 => "tier_1",
            KycTier::Tier2 => "tier_2",
            KycTier::Tier3 => "tier_3",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CustomerState {
    Active,
    Inactive,
    Suspended,
}

/// Customer view consumed by the compliance gate. Customer CRUD itself is an
/// external collaborator; the core only reads this projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub customer_id: Uuid,
    pub state: CustomerState,
    pub kyc_tier: KycTier,
}

impl CustomerProfile {
    pub fn is_active(&self) -> bool {
        self.state == CustomerState::Active
    }
}

/// Gate outcome as an explicit sum type. Advisories elevate at most to
/// `Review`; only hard limit violations block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComplianceDecision {
    Allow,
    Review(Vec<String>),
    Blocked(Vec<String>),
}

impl ComplianceDecision {
    pub fn is_allow(&self) -> bool {
        matches!(self, ComplianceDecision::Allow)
    }

    pub fn reasons(&self) -> &[String] {
        match self {
            ComplianceDecision::Allow => &[],
            ComplianceDecision::Review(reasons) | ComplianceDecision::Blocked(reasons) => reasons,
        }
    }
}

/// Action recorded against a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComplianceAction {
    Allow,
    Block,
    Review,
    Report,
    FreezeAccount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuspiciousActivityType {
    UnusualTransactionSize,
    HighVelocity,
    RoundDollarAmounts,
    RapidMovement,
    /// Just below the reporting threshold
    StructuredTransaction,
    DormantAccountActivity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertStatus {
    Open,
    Investigating,
    Resolved,
    FalsePositive,
}

/// Non-blocking advisory produced by the suspicious-pattern checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuspiciousActivityAlert {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub account_id: Option<Uuid>,
    pub transaction_id: Option<Uuid>,
    pub activity_type: SuspiciousActivityType,
    pub description: String,
    /// 1-100; higher is more suspicious.
    pub risk_score: u8,
    pub status: AlertStatus,
    pub assigned_to: Option<String>,
    pub resolution_notes: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SuspiciousActivityAlert {
    pub fn is_high_risk(&self) -> bool {
        self.risk_score >= 80
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceViolation {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub account_id: Uuid,
    pub transaction_id: Option<Uuid>,
    pub description: String,
    pub amount: Money,
    pub action_taken: ComplianceAction,
    pub reviewer: Option<String>,
    pub review_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Side record for regulatory large-transaction filings. Reporting never
/// blocks the transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LargeTransactionReport {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub transaction_id: Option<Uuid>,
    pub amount: Money,
    pub transaction_type: String,
    pub reporting_threshold: Money,
    pub filed_at: Option<DateTime<Utc>>,
    pub filing_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
