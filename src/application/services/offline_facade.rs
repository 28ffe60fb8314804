use crate::application::ports::{ApiFailure, LocalStore, RemoteApi, SyncNotifier};
use crate::application::services::connectivity_monitor::ConnectivityMonitor;
use crate::application::services::sync_engine::server_id_of;
use crate::domain::entities::{CachedRecord, QueueEntryDraft, RecordFilter};
use crate::domain::value_objects::{EntityId, EntityPayload, EntityType, MutationKind};
use crate::shared::error::{AppError, Result};
use serde_json::Value;
use std::sync::Arc;

/// Result of a read. `from_cache` lets the UI flag staleness.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadOutcome<T> {
    pub data: T,
    pub from_cache: bool,
}

impl<T> ReadOutcome<T> {
    fn server(data: T) -> Self {
        Self {
            data,
            from_cache: false,
        }
    }

    fn cached(data: T) -> Self {
        Self {
            data,
            from_cache: true,
        }
    }
}

/// Normalized result of a write. UI code switches on the variant; raw
/// network errors never reach it.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    /// Confirmed — by the server, or fully resolved locally with no
    /// server work required (delete of a never-synced record).
    Confirmed(Option<CachedRecord>),
    /// Stored locally and queued for replay on the next sync cycle.
    Queued(CachedRecord),
    /// Delete accepted locally and queued for replay.
    QueuedDelete,
    /// Permanently rejected by the server; requires user action.
    Rejected { status: u16, message: String },
}

impl WriteOutcome {
    pub fn is_queued(&self) -> bool {
        matches!(self, WriteOutcome::Queued(_) | WriteOutcome::QueuedDelete)
    }

    pub fn record(&self) -> Option<&CachedRecord> {
        match self {
            WriteOutcome::Confirmed(record) => record.as_ref(),
            WriteOutcome::Queued(record) => Some(record),
            _ => None,
        }
    }
}

/// The single entry point UI code calls instead of the network. Hides
/// the online/offline branching: reads fall back to the cache, writes
/// fall back to an optimistic local echo plus a queue entry.
pub struct OfflineFacade {
    store: Arc<dyn LocalStore>,
    api: Arc<dyn RemoteApi>,
    monitor: Arc<ConnectivityMonitor>,
    notifier: Arc<dyn SyncNotifier>,
}

impl OfflineFacade {
    pub fn new(
        store: Arc<dyn LocalStore>,
        api: Arc<dyn RemoteApi>,
        monitor: Arc<ConnectivityMonitor>,
        notifier: Arc<dyn SyncNotifier>,
    ) -> Self {
        Self {
            store,
            api,
            monitor,
            notifier,
        }
    }

    pub async fn list(
        &self,
        entity_type: EntityType,
        filter: RecordFilter,
    ) -> Result<ReadOutcome<Vec<CachedRecord>>> {
        if self.monitor.is_effectively_online().await {
            match self.api.fetch_list(entity_type).await {
                Ok(bodies) => {
                    let records = bodies
                        .into_iter()
                        .filter_map(|body| server_record(entity_type, body))
                        .collect::<Vec<_>>();
                    self.write_through_list(entity_type, &records).await;
                    return Ok(ReadOutcome::server(apply_filter(records, &filter)));
                }
                Err(err) => {
                    tracing::debug!(
                        target: "offline::facade",
                        %entity_type,
                        error = %err,
                        "list fell back to cache"
                    );
                }
            }
        }
        let records = self.store.list(entity_type, filter).await?;
        Ok(ReadOutcome::cached(records))
    }

    pub async fn get(
        &self,
        entity_type: EntityType,
        id: &EntityId,
    ) -> Result<ReadOutcome<Option<CachedRecord>>> {
        if self.monitor.is_effectively_online().await {
            match self.api.fetch_one(entity_type, id).await {
                Ok(body) => {
                    let record = server_record(entity_type, body);
                    if let Some(record) = &record {
                        self.write_through(record).await;
                    }
                    return Ok(ReadOutcome::server(record));
                }
                Err(ApiFailure::Permanent { status: 404, .. }) => {
                    // The server is authoritative: drop any stale copy.
                    let _ = self.store.remove(entity_type, id).await;
                    return Ok(ReadOutcome::server(None));
                }
                Err(err) => {
                    tracing::debug!(
                        target: "offline::facade",
                        %entity_type,
                        %id,
                        error = %err,
                        "get fell back to cache"
                    );
                }
            }
        }
        let record = self.store.get(entity_type, id).await?;
        Ok(ReadOutcome::cached(record))
    }

    pub async fn create(&self, entity_type: EntityType, payload: Value) -> Result<WriteOutcome> {
        let payload = EntityPayload::new(payload).map_err(AppError::Validation)?;

        if self.monitor.is_effectively_online().await {
            match self.api.create(entity_type, payload.as_json()).await {
                Ok(body) => return self.confirm_write(entity_type, body).await,
                Err(ApiFailure::Permanent { status, message }) => {
                    return Ok(WriteOutcome::Rejected { status, message });
                }
                Err(ApiFailure::Transient { message }) => {
                    tracing::debug!(
                        target: "offline::facade",
                        %entity_type,
                        error = %message,
                        "create queued after network failure"
                    );
                }
            }
        }
        self.queue_create(entity_type, payload).await
    }

    pub async fn update(
        &self,
        entity_type: EntityType,
        id: &EntityId,
        payload: Value,
    ) -> Result<WriteOutcome> {
        let payload = EntityPayload::new(payload).map_err(AppError::Validation)?;

        if self.monitor.is_effectively_online().await && !id.is_temporary() {
            match self.api.update(entity_type, id, payload.as_json()).await {
                Ok(body) => return self.confirm_write(entity_type, body).await,
                Err(ApiFailure::Permanent { status, message }) => {
                    return Ok(WriteOutcome::Rejected { status, message });
                }
                Err(ApiFailure::Transient { message }) => {
                    tracing::debug!(
                        target: "offline::facade",
                        %entity_type,
                        %id,
                        error = %message,
                        "update queued after network failure"
                    );
                }
            }
        }
        self.queue_update(entity_type, id, payload).await
    }

    pub async fn delete(&self, entity_type: EntityType, id: &EntityId) -> Result<WriteOutcome> {
        // A record that only ever existed locally needs no network call:
        // drop it and every queued mutation for it.
        if id.is_temporary() {
            self.store.purge_entity(entity_type, id).await?;
            return Ok(WriteOutcome::Confirmed(None));
        }

        if self.monitor.is_effectively_online().await {
            match self.api.delete(entity_type, id).await {
                Ok(()) => {
                    if let Err(err) = self.store.remove(entity_type, id).await {
                        tracing::warn!(
                            target: "offline::facade",
                            error = %err,
                            "cache removal failed after server delete"
                        );
                    }
                    return Ok(WriteOutcome::Confirmed(None));
                }
                Err(ApiFailure::Permanent { status, message }) => {
                    return Ok(WriteOutcome::Rejected { status, message });
                }
                Err(ApiFailure::Transient { message }) => {
                    tracing::debug!(
                        target: "offline::facade",
                        %entity_type,
                        %id,
                        error = %message,
                        "delete queued after network failure"
                    );
                }
            }
        }

        self.store.remove(entity_type, id).await?;
        self.store
            .enqueue_mutation(QueueEntryDraft::new(
                entity_type,
                id.clone(),
                MutationKind::Delete,
                EntityPayload::new(serde_json::json!({})).map_err(AppError::Validation)?,
            ))
            .await?;
        self.note_pending().await;
        Ok(WriteOutcome::QueuedDelete)
    }

    /// Offline create with a stable temporary id: an identical payload
    /// already queued for this entity type reuses the existing entry,
    /// so double-submits cannot produce two records.
    async fn queue_create(
        &self,
        entity_type: EntityType,
        payload: EntityPayload,
    ) -> Result<WriteOutcome> {
        let pending = self.store.pending_mutations().await?;
        for entry in &pending {
            if entry.entity_type == entity_type
                && entry.kind == MutationKind::Create
                && entry.payload == payload
            {
                if let Some(record) = self.store.get(entity_type, &entry.entity_id).await? {
                    return Ok(WriteOutcome::Queued(record));
                }
            }
        }

        let temp_id = EntityId::temporary();
        let record = CachedRecord::proposed(entity_type, temp_id.clone(), payload.clone());
        self.store.put(record.clone()).await?;
        self.store
            .enqueue_mutation(QueueEntryDraft::new(
                entity_type,
                temp_id,
                MutationKind::Create,
                payload,
            ))
            .await?;
        self.note_pending().await;
        Ok(WriteOutcome::Queued(record))
    }

    /// Offline update. While the entity's create is still unconfirmed,
    /// the update merges into the pending create's payload; a separate
    /// queue entry would race the create on the wire.
    async fn queue_update(
        &self,
        entity_type: EntityType,
        id: &EntityId,
        payload: EntityPayload,
    ) -> Result<WriteOutcome> {
        let entries = self.store.mutations_for_entity(entity_type, id).await?;
        let pending_create = entries.iter().find(|e| e.kind == MutationKind::Create);

        let merged = if let Some(create) = pending_create {
            let merged = merge_objects(create.payload.as_json(), payload.as_json());
            self.store
                .update_mutation_payload(create.id, merged.clone())
                .await?;
            EntityPayload::new(merged).map_err(AppError::Validation)?
        } else {
            self.store
                .enqueue_mutation(QueueEntryDraft::new(
                    entity_type,
                    id.clone(),
                    MutationKind::Update,
                    payload.clone(),
                ))
                .await?;
            payload
        };

        let record = CachedRecord::proposed(entity_type, id.clone(), merged);
        self.store.put(record.clone()).await?;
        self.note_pending().await;
        Ok(WriteOutcome::Queued(record))
    }

    async fn confirm_write(&self, entity_type: EntityType, body: Value) -> Result<WriteOutcome> {
        let id = server_id_of(&body)?;
        let payload = EntityPayload::new(body).map_err(AppError::Validation)?;
        let record = CachedRecord::from_server(entity_type, id, payload);
        self.write_through(&record).await;
        Ok(WriteOutcome::Confirmed(Some(record)))
    }

    /// Cache population after a successful network call. A storage
    /// failure here degrades to network-only: the server result still
    /// goes back to the caller.
    async fn write_through(&self, record: &CachedRecord) {
        if let Err(err) = self.store.put(record.clone()).await {
            tracing::warn!(
                target: "offline::facade",
                entity_type = %record.entity_type,
                entity_id = %record.entity_id,
                error = %err,
                "write-through failed, offline cache degraded"
            );
        }
    }

    async fn write_through_list(&self, entity_type: EntityType, records: &[CachedRecord]) {
        if let Err(err) = self
            .store
            .apply_server_state(entity_type, records.to_vec())
            .await
        {
            tracing::warn!(
                target: "offline::facade",
                %entity_type,
                error = %err,
                "list write-through failed, offline cache degraded"
            );
        }
    }

    async fn note_pending(&self) {
        if let Ok(entries) = self.store.pending_mutations().await {
            self.notifier.pending_mutations(entries.len() as u32);
        }
    }
}

/// Local equivalent of the store's filter, for server-backed lists.
fn apply_filter(records: Vec<CachedRecord>, filter: &RecordFilter) -> Vec<CachedRecord> {
    let offset = filter.offset.unwrap_or(0) as usize;
    let limit = filter.limit.map(|l| l as usize).unwrap_or(usize::MAX);
    records
        .into_iter()
        .filter(|record| {
            filter
                .sync_status
                .map(|status| record.sync_status == status)
                .unwrap_or(true)
        })
        .skip(offset)
        .take(limit)
        .collect()
}

fn server_record(entity_type: EntityType, body: Value) -> Option<CachedRecord> {
    let id = server_id_of(&body).ok()?;
    let payload = EntityPayload::new(body).ok()?;
    Some(CachedRecord::from_server(entity_type, id, payload))
}

/// Shallow object merge; update fields win over the pending create's.
fn merge_objects(base: &Value, update: &Value) -> Value {
    match (base, update) {
        (Value::Object(base), Value::Object(update)) => {
            let mut merged = base.clone();
            for (key, value) in update {
                merged.insert(key.clone(), value.clone());
            }
            Value::Object(merged)
        }
        _ => update.clone(),
    }
}
