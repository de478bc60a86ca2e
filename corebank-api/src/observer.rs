use crate::domain::{Account, AuditEventType, Transaction};

/// Observer hook for hosts that mirror domain activity onto an event bus or
/// read model. Passed at construction; the engine itself never depends on a
/// listener being present.
pub trait DomainObserver: Send + Sync {
    fn on_account_event(&self, _account: &Account, _event_type: AuditEventType) {}
    fn on_transaction_event(&self, _transaction: &Transaction, _event_type: AuditEventType) {}
}

/// Null-object observer used when the host wires nothing in.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl DomainObserver for NoopObserver {}
