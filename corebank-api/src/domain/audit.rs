use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kinds of events recorded on the tamper-evident audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditEventType {
    // Accounts
    AccountCreated,
    AccountUpdated,
    AccountFrozen,
    AccountUnfrozen,
    AccountClosed,
    AccountHoldPlaced,
    AccountHoldReleased,

    // Ledger
    JournalEntryCreated,
    JournalEntryPosted,
    JournalEntryReversed,

    // Transactions
    TransactionCreated,
    TransactionPosted,
    TransactionFailed,
    TransactionReversed,

    // Interest
    InterestAccrued,
    InterestPosted,

    // Credit lines
    CreditStatementGenerated,
    CreditPaymentMade,
    CreditLimitChanged,

    // Loans
    LoanOriginated,
    LoanDisbursed,
    LoanPaymentMade,
    LoanLateFeeCharged,

    // Compliance
    LargeTransactionReported,
    SuspiciousActivityFlagged,
    ComplianceViolationRecorded,

    // Batch job failures (jobs continue past individual accounts)
    JobError,
}

impl std::fmt::Display for AuditEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AuditEventType::AccountCreated => "account_created",
            AuditEventType::AccountUpdated => "account_updated",
            AuditEventType::AccountFrozen => "account_frozen",
            AuditEventType::AccountUnfrozen => "account_unfrozen",
            AuditEventType::AccountClosed => "account_closed",
            AuditEventType::AccountHoldPlaced => "account_hold_placed",
            AuditEventType::AccountHoldReleased => "account_hold_released",
            AuditEventType::JournalEntryCreated => "journal_entry_created",
            AuditEventType::JournalEntryPosted => "journal_entry_posted",
            AuditEventType::JournalEntryReversed => "journal_entry_reversed",
            AuditEventType::TransactionCreated => "transaction_created",
            AuditEventType::TransactionPosted => "transaction_posted",
            AuditEventType::TransactionFailed => "transaction_failed",
            AuditEventType::TransactionReversed => "transaction_reversed",
            AuditEventType::InterestAccrued => "interest_accrued",
            AuditEventType::InterestPosted => "interest_posted",
            AuditEventType::CreditStatementGenerated => "credit_statement_generated",
            AuditEventType::CreditPaymentMade => "credit_payment_made",
            AuditEventType::CreditLimitChanged => "credit_limit_changed",
            AuditEventType::LoanOriginated => "loan_originated",
            AuditEventType::LoanDisbursed => "loan_disbursed",
            AuditEventType::LoanPaymentMade => "loan_payment_made",
            AuditEventType::LoanLateFeeCharged => "loan_late_fee_charged",
            AuditEventType::LargeTransactionReported => "large_transaction_reported",
            AuditEventType::SuspiciousActivityFlagged => "suspicious_activity_flagged",
            AuditEventType::ComplianceViolationRecorded => "compliance_violation_recorded",
            AuditEventType::JobError => "job_error",
        };
        f.write_str(s)
    }
}

/// Immutable hash-chained audit event. Correction is by appending a
/// compensating event; there is no update or delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: Uuid,
    /// Strictly increasing per process, assigned at append time.
    pub sequence: u64,
    pub event_type: AuditEventType,
    pub entity_type: String,
    pub entity_id: String,
    pub metadata: BTreeMap<String, String>,
    pub recorded_at: DateTime<Utc>,
    /// Hex digest of the previous event; all zeros for the genesis event.
    pub previous_digest: String,
    /// `blake3(previous_digest || canonical payload)` as hex.
    pub digest: String,
}

impl AuditEvent {
    /// Digest seed for the first event in the chain.
    pub const GENESIS_DIGEST: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";

    /// Canonical payload string the digest commits to. Metadata keys are
    /// iterated in sorted (BTreeMap) order so the encoding is stable.
    pub fn canonical_payload(&self) -> String {
        let metadata = self
            .metadata
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join(";");
        format!(
            "{}|{}|{}|{}|{}|{}",
            self.sequence,
            self.event_type,
            self.entity_type,
            self.entity_id,
            self.recorded_at.to_rfc3339(),
            metadata
        )
    }

    pub fn compute_digest(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.previous_digest.as_bytes());
        hasher.update(self.canonical_payload().as_bytes());
        hasher.finalize().to_hex().to_string()
    }
}

/// Result of replaying the audit chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub total_events: u64,
    /// Events whose stored digest does not match their recomputed digest.
    pub hash_errors: Vec<u64>,
    /// Events whose previous_digest does not match the prior event's digest.
    pub chain_breaks: Vec<u64>,
}

impl IntegrityReport {
    pub fn is_intact(&self) -> bool {
        self.hash_errors.is_empty() && self.chain_breaks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_commits_to_payload() {
        let mut event = AuditEvent {
            id: Uuid::new_v4(),
            sequence: 0,
            event_type: AuditEventType::AccountCreated,
            entity_type: "account".to_string(),
            entity_id: Uuid::new_v4().to_string(),
            metadata: BTreeMap::from([("currency".to_string(), "USD".to_string())]),
            recorded_at: Utc::now(),
            previous_digest: AuditEvent::GENESIS_DIGEST.to_string(),
            digest: String::new(),
        };
        event.digest = event.compute_digest();
        assert_eq!(event.digest, event.compute_digest());

        // Any metadata change breaks the digest
        event
            .metadata
            .insert("currency".to_string(), "EUR".to_string());
        assert_ne!(event.digest, event.compute_digest());
    }

    #[test]
    fn metadata_order_is_canonical() {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let build = |pairs: Vec<(&str, &str)>| AuditEvent {
            id,
            sequence: 3,
            event_type: AuditEventType::TransactionPosted,
            entity_type: "transaction".to_string(),
            entity_id: "t-1".to_string(),
            metadata: pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            recorded_at: now,
            previous_digest: AuditEvent::GENESIS_DIGEST.to_string(),
            digest: String::new(),
        };

        let a = build(vec![("amount", "10"), ("channel", "branch")]);
        let b = build(vec![("channel", "branch"), ("amount", "10")]);
        assert_eq!(a.compute_digest(), b.compute_digest());
    }
}
