use crate::domain::value_objects::{EntityId, EntityPayload, EntityType, MutationKind, SyncStatus};
use serde::{Deserialize, Serialize};

/// Draft for a new mutation queue entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueueEntryDraft {
    pub entity_type: EntityType,
    pub entity_id: EntityId,
    pub kind: MutationKind,
    pub payload: EntityPayload,
}

impl QueueEntryDraft {
    pub fn new(
        entity_type: EntityType,
        entity_id: EntityId,
        kind: MutationKind,
        payload: EntityPayload,
    ) -> Self {
        Self {
            entity_type,
            entity_id,
            kind,
            payload,
        }
    }
}

/// Filter for listing cached records. Local filtering only; offline
/// queries do not reproduce server-side query semantics.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RecordFilter {
    pub sync_status: Option<SyncStatus>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl RecordFilter {
    pub fn with_status(status: SyncStatus) -> Self {
        Self {
            sync_status: Some(status),
            ..Self::default()
        }
    }
}
