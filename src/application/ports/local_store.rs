use crate::domain::entities::{
    CacheStatusSnapshot, CachedRecord, QueueEntry, QueueEntryDraft, RecordFilter,
};
use crate::domain::value_objects::{EntityId, EntityType, MetadataKey, QueueId, SyncStatus};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// The single narrow surface for all durable local state. Every
/// mutation of cached records, the queue, and metadata goes through
/// here so sync bookkeeping cannot drift out of step with the queue.
#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn get(
        &self,
        entity_type: EntityType,
        id: &EntityId,
    ) -> Result<Option<CachedRecord>, AppError>;

    async fn list(
        &self,
        entity_type: EntityType,
        filter: RecordFilter,
    ) -> Result<Vec<CachedRecord>, AppError>;

    /// Upsert by id. Last write wins at this layer; the sync engine,
    /// not the store, arbitrates real conflicts.
    async fn put(&self, record: CachedRecord) -> Result<(), AppError>;

    async fn remove(&self, entity_type: EntityType, id: &EntityId) -> Result<(), AppError>;

    /// Enqueue a mutation. Fails with `InvalidSequence` for an
    /// update/delete while an unconfirmed create for the same entity is
    /// still queued; callers merge into the pending create instead.
    async fn enqueue_mutation(&self, draft: QueueEntryDraft) -> Result<QueueId, AppError>;

    /// All pending entries in global replay order (created_at, id).
    async fn pending_mutations(&self) -> Result<Vec<QueueEntry>, AppError>;

    /// Entries (pending or failed) for one entity, in replay order.
    async fn mutations_for_entity(
        &self,
        entity_type: EntityType,
        id: &EntityId,
    ) -> Result<Vec<QueueEntry>, AppError>;

    async fn update_mutation_payload(&self, id: QueueId, payload: Value) -> Result<(), AppError>;

    async fn remove_mutation(&self, id: QueueId) -> Result<(), AppError>;

    /// Record an attempt outcome: bumps retry_count and last_attempt,
    /// stores the error if any, and returns the updated entry.
    async fn record_attempt(
        &self,
        id: QueueId,
        error: Option<&str>,
    ) -> Result<QueueEntry, AppError>;

    /// Terminal failure: the entry is retained with status failed for
    /// user inspection, never retried automatically.
    async fn mark_mutation_failed(&self, id: QueueId, error: &str) -> Result<(), AppError>;

    /// Remove a record and every queue entry for it. Used when a
    /// never-synced local entity is deleted before any network call.
    async fn purge_entity(&self, entity_type: EntityType, id: &EntityId) -> Result<u64, AppError>;

    /// Rewrite a temporary id to the server-assigned one across the
    /// cached record and any remaining queue entries.
    async fn rewrite_entity_id(
        &self,
        entity_type: EntityType,
        from: &EntityId,
        to: &EntityId,
    ) -> Result<(), AppError>;

    async fn set_sync_status(
        &self,
        entity_type: EntityType,
        id: &EntityId,
        status: SyncStatus,
        last_synced: Option<DateTime<Utc>>,
    ) -> Result<(), AppError>;

    /// Bulk refresh from authoritative server reads. Rows whose local
    /// status is pending or failed are left untouched.
    async fn apply_server_state(
        &self,
        entity_type: EntityType,
        records: Vec<CachedRecord>,
    ) -> Result<(), AppError>;

    async fn get_metadata(&self, key: &MetadataKey) -> Result<Option<Value>, AppError>;

    async fn set_metadata(&self, key: &MetadataKey, value: Value) -> Result<(), AppError>;

    async fn cache_status(&self) -> Result<CacheStatusSnapshot, AppError>;

    /// Evict synced records whose last_synced is older than the cutoff.
    /// Pending and failed records are never evicted.
    async fn evict_stale(&self, older_than: DateTime<Utc>) -> Result<u64, AppError>;
}
