use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CachedEntityRow {
    pub entity_type: String,
    pub entity_id: String,
    pub data: String,
    pub sync_status: String,
    pub last_synced: Option<i64>,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QueueEntryRow {
    pub id: i64,
    pub entity_type: String,
    pub entity_id: String,
    pub kind: String,
    pub payload: String,
    pub status: String,
    pub retry_count: i32,
    pub last_attempt: Option<i64>,
    pub last_error: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MetadataRow {
    pub id: i64,
    pub key: String,
    pub value: String,
    pub updated_at: i64,
}
