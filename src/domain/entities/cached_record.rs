use crate::domain::value_objects::{EntityId, EntityPayload, EntityType, SyncStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Local mirror of one server entity, plus the sync bookkeeping fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CachedRecord {
    pub entity_type: EntityType,
    pub entity_id: EntityId,
    pub data: EntityPayload,
    pub sync_status: SyncStatus,
    pub last_synced: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl CachedRecord {
    pub fn new(
        entity_type: EntityType,
        entity_id: EntityId,
        data: EntityPayload,
        sync_status: SyncStatus,
        last_synced: Option<DateTime<Utc>>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            entity_type,
            entity_id,
            data,
            sync_status,
            last_synced,
            updated_at,
        }
    }

    /// A record fetched from the server; synced from the start.
    pub fn from_server(entity_type: EntityType, entity_id: EntityId, data: EntityPayload) -> Self {
        let now = Utc::now();
        Self::new(
            entity_type,
            entity_id,
            data,
            SyncStatus::Synced,
            Some(now),
            now,
        )
    }

    /// A record proposed locally while offline; pending until replayed.
    pub fn proposed(entity_type: EntityType, entity_id: EntityId, data: EntityPayload) -> Self {
        Self::new(
            entity_type,
            entity_id,
            data,
            SyncStatus::Pending,
            None,
            Utc::now(),
        )
    }

    pub fn mark_synced(&mut self, synced_at: DateTime<Utc>) {
        self.sync_status = SyncStatus::Synced;
        self.last_synced = Some(synced_at);
    }
}
