use uuid::Uuid;

use crate::domain::{
    AlertStatus, ComplianceDecision, ComplianceViolation, Money, SuspiciousActivityAlert,
    TransactionType,
};
use crate::error::BankingResult;

/// Pre-transaction policy gate consumed by the transaction processor. Pure
/// validator over ledger state: it records side records (reports, alerts,
/// violations) but never mutates balances.
pub trait ComplianceService: Send + Sync {
    /// Check a proposed transaction. Hard limit violations yield
    /// `Blocked`; advisories elevate at most to `Review`; large-transaction
    /// reporting files a side record without affecting the decision.
    fn check_transaction(
        &self,
        customer_id: Uuid,
        account_id: Uuid,
        amount: Money,
        transaction_type: TransactionType,
        transaction_id: Option<Uuid>,
    ) -> BankingResult<ComplianceDecision>;

    fn customer_violations(&self, customer_id: Uuid) -> BankingResult<Vec<ComplianceViolation>>;

    /// Alerts sorted by risk score (highest first), optionally filtered.
    fn alerts(
        &self,
        status: Option<AlertStatus>,
        min_risk_score: Option<u8>,
    ) -> BankingResult<Vec<SuspiciousActivityAlert>>;

    fn resolve_alert(
        &self,
        alert_id: Uuid,
        resolution: AlertStatus,
        notes: &str,
        reviewer: &str,
    ) -> BankingResult<SuspiciousActivityAlert>;
}
