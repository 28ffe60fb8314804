use crate::domain::value_objects::EntityType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheStatusSnapshot {
    pub total_records: u64,
    pub pending_records: u64,
    pub failed_records: u64,
    pub queued_mutations: u64,
    pub entity_types: Vec<EntityTypeStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntityTypeStatus {
    pub entity_type: EntityType,
    pub record_count: u64,
    pub pending_count: u64,
    pub failed_count: u64,
    pub last_synced: Option<DateTime<Utc>>,
}
