use std::collections::BTreeMap;

use crate::domain::{AuditEvent, AuditEventType, IntegrityReport};
use crate::error::BankingResult;

/// Append-only, hash-chained event log. There is no update or delete;
/// corrections append compensating events.
pub trait AuditTrail: Send + Sync {
    fn record(
        &self,
        event_type: AuditEventType,
        entity_type: &str,
        entity_id: &str,
        metadata: BTreeMap<String, String>,
    ) -> BankingResult<AuditEvent>;

    fn events_for_entity(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> BankingResult<Vec<AuditEvent>>;

    /// All events in sequence order.
    fn all_events(&self) -> BankingResult<Vec<AuditEvent>>;

    /// Replay the chain, reporting digest mismatches and chain breaks.
    /// Violations are reported, never repaired.
    fn verify_integrity(&self) -> BankingResult<IntegrityReport>;
}
