use corebank_api::domain::AuditEvent;
use corebank_api::BankingResult;
use corebank_db::models::AuditEventModel;

pub struct AuditEventMapper;

impl AuditEventMapper {
    pub fn to_model(event: &AuditEvent) -> AuditEventModel {
        AuditEventModel {
            id: event.id,
            sequence: event.sequence,
            event_type: event.event_type,
            entity_type: event.entity_type.clone(),
            entity_id: event.entity_id.clone(),
            metadata: event.metadata.clone(),
            recorded_at: event.recorded_at,
            previous_digest: event.previous_digest.clone(),
            digest: event.digest.clone(),
            created_at: event.recorded_at,
            updated_at: event.recorded_at,
        }
    }

    pub fn from_model(model: AuditEventModel) -> BankingResult<AuditEvent> {
        Ok(AuditEvent {
            id: model.id,
            sequence: model.sequence,
            event_type: model.event_type,
            entity_type: model.entity_type,
            entity_id: model.entity_id,
            metadata: model.metadata,
            recorded_at: model.recorded_at,
            previous_digest: model.previous_digest,
            digest: model.digest,
        })
    }
}
