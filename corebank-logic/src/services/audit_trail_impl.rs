use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use corebank_api::domain::{AuditEvent, AuditEventType, IntegrityReport};
use corebank_api::service::AuditTrail;
use corebank_api::{BankingError, BankingResult};
use corebank_db::models::AuditEventModel;
use corebank_db::StorageInterface;

use crate::mappers::AuditEventMapper;
use crate::services::{all_models, find_models, save_model};

/// Hash-chained append-only log over the `audit_events` table.
///
/// The chain head is re-read from storage under the append lock, so events
/// recorded inside a rolled-back scope simply vanish and the next append
/// chains from the last event that actually persisted.
pub struct AuditTrailImpl {
    storage: Arc<dyn StorageInterface>,
    append_lock: Mutex<()>,
}

impl AuditTrailImpl {
    pub fn new(storage: Arc<dyn StorageInterface>) -> Self {
        AuditTrailImpl {
            storage,
            append_lock: Mutex::new(()),
        }
    }

    fn chain_head(&self) -> BankingResult<(u64, String)> {
        let models: Vec<AuditEventModel> = all_models(self.storage.as_ref())?;
        Ok(models
            .into_iter()
            .max_by_key(|model| model.sequence)
            .map(|model| (model.sequence + 1, model.digest))
            .unwrap_or((0, AuditEvent::GENESIS_DIGEST.to_string())))
    }

    fn sorted_events(mut models: Vec<AuditEventModel>) -> BankingResult<Vec<AuditEvent>> {
        models.sort_by_key(|model| model.sequence);
        models.into_iter().map(AuditEventMapper::from_model).collect()
    }
}

impl AuditTrail for AuditTrailImpl {
    fn record(
        &self,
        event_type: AuditEventType,
        entity_type: &str,
        entity_id: &str,
        metadata: BTreeMap<String, String>,
    ) -> BankingResult<AuditEvent> {
        let _guard = self
            .append_lock
            .lock()
            .map_err(|_| BankingError::StorageFailure("audit append lock poisoned".to_string()))?;

        let (sequence, previous_digest) = self.chain_head()?;
        let mut event = AuditEvent {
            id: Uuid::new_v4(),
            sequence,
            event_type,
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            metadata,
            recorded_at: Utc::now(),
            previous_digest,
            digest: String::new(),
        };
        event.digest = event.compute_digest();

        save_model(self.storage.as_ref(), &AuditEventMapper::to_model(&event))?;
        tracing::debug!(
            sequence = event.sequence,
            event_type = %event.event_type,
            entity_type,
            entity_id,
            "audit event recorded"
        );
        Ok(event)
    }

    fn events_for_entity(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> BankingResult<Vec<AuditEvent>> {
        let models: Vec<AuditEventModel> = find_models(
            self.storage.as_ref(),
            &[
                ("entity_type", json!(entity_type)),
                ("entity_id", json!(entity_id)),
            ],
        )?;
        Self::sorted_events(models)
    }

    fn all_events(&self) -> BankingResult<Vec<AuditEvent>> {
        Self::sorted_events(all_models(self.storage.as_ref())?)
    }

    fn verify_integrity(&self) -> BankingResult<IntegrityReport> {
        let events = self.all_events()?;
        let mut hash_errors = Vec::new();
        let mut chain_breaks = Vec::new();
        let mut previous_digest = AuditEvent::GENESIS_DIGEST.to_string();

        for event in &events {
            if event.digest != event.compute_digest() {
                hash_errors.push(event.sequence);
            }
            if event.previous_digest != previous_digest {
                chain_breaks.push(event.sequence);
            }
            previous_digest = event.digest.clone();
        }

        let report = IntegrityReport {
            total_events: events.len() as u64,
            hash_errors,
            chain_breaks,
        };
        if !report.is_intact() {
            tracing::warn!(
                hash_errors = report.hash_errors.len(),
                chain_breaks = report.chain_breaks.len(),
                "audit chain integrity violation detected"
            );
        }
        Ok(report)
    }
}
