use crate::application::ports::{ApiFailure, LocalStore, RemoteApi, SyncNotifier};
use crate::domain::entities::{
    CachedRecord, QueueEntry, QueueEntryDraft, RecordFilter, SyncReport,
};
use crate::domain::value_objects::{
    EntityId, EntityPayload, EntityType, MetadataKey, MutationKind, SyncStatus,
};
use crate::infrastructure::store::metrics::{self, AttemptOutcome};
use crate::shared::config::SyncConfig;
use crate::shared::error::{AppError, Result};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Syncing,
}

/// Result of the startup reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub pending_records: u32,
    pub queued_mutations: u32,
    pub requeued: u32,
}

/// Orchestrates queue draining and cache refresh. Exactly one drain
/// runs at a time; concurrent sync requests attach to the in-flight
/// run and receive its report.
///
/// Conflict policy is last-writer-wins at full-entity granularity with
/// the server as arbiter: a server-side rejection (stale version, 409)
/// is a permanent failure surfaced for user re-entry, never auto-merged.
/// Multi-device concurrent editing needs a real strategy here before it
/// can ship.
pub struct SyncEngine {
    store: Arc<dyn LocalStore>,
    api: Arc<dyn RemoteApi>,
    notifier: Arc<dyn SyncNotifier>,
    config: SyncConfig,
    state: Arc<RwLock<EngineState>>,
    report_tx: watch::Sender<Option<SyncReport>>,
}

impl SyncEngine {
    pub fn new(
        store: Arc<dyn LocalStore>,
        api: Arc<dyn RemoteApi>,
        notifier: Arc<dyn SyncNotifier>,
        config: SyncConfig,
    ) -> Self {
        let (report_tx, _) = watch::channel(None);
        Self {
            store,
            api,
            notifier,
            config,
            state: Arc::new(RwLock::new(EngineState::Idle)),
            report_tx,
        }
    }

    pub async fn state(&self) -> EngineState {
        *self.state.read().await
    }

    /// Report of the most recently completed cycle, if any.
    pub fn last_report(&self) -> Option<SyncReport> {
        *self.report_tx.borrow()
    }

    /// Run one sync cycle, or attach to the cycle already in flight.
    pub async fn sync(&self) -> Result<SyncReport> {
        {
            let mut state = self.state.write().await;
            if *state == EngineState::Syncing {
                let mut rx = self.report_tx.subscribe();
                drop(state);
                loop {
                    rx.changed()
                        .await
                        .map_err(|_| AppError::Internal("sync run vanished".to_string()))?;
                    let report = *rx.borrow();
                    if let Some(report) = report {
                        return Ok(report);
                    }
                }
            }
            *state = EngineState::Syncing;
        }
        self.report_tx.send_replace(None);

        let result = self.run_cycle().await;

        *self.state.write().await = EngineState::Idle;
        match result {
            Ok(report) => {
                self.report_tx.send_replace(Some(report));
                self.notifier.sync_completed(&report);
                if report.remaining > 0 {
                    self.notifier.pending_mutations(report.remaining);
                }
                Ok(report)
            }
            Err(err) => {
                self.notifier.sync_failed(&err.to_string());
                // Wake attached waiters; they get the empty report.
                self.report_tx.send_replace(Some(SyncReport::default()));
                Err(err)
            }
        }
    }

    /// Periodic sync loop, for hosts that want timer-driven draining in
    /// addition to connectivity-recovery triggers.
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(engine.config.sync_interval));
            interval.tick().await;
            loop {
                interval.tick().await;
                if let Err(err) = engine.sync().await {
                    tracing::error!(target: "offline::sync", error = %err, "scheduled sync failed");
                }
            }
        })
    }

    /// Trigger a sync on every debounced connectivity recovery.
    pub fn watch_connectivity(self: &Arc<Self>, mut rx: watch::Receiver<bool>) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let online = *rx.borrow_and_update();
                if online {
                    tracing::info!(target: "offline::sync", "connectivity recovered, draining queue");
                    if let Err(err) = engine.sync().await {
                        tracing::error!(target: "offline::sync", error = %err, "recovery sync failed");
                    }
                } else {
                    engine.notifier.working_offline();
                }
            }
        })
    }

    async fn run_cycle(&self) -> Result<SyncReport> {
        let started_at = Utc::now();
        let entries = self.store.pending_mutations().await?;
        tracing::debug!(target: "offline::sync", pending = entries.len(), "sync cycle starting");

        let mut succeeded = 0u32;
        let mut failed = 0u32;
        // Entities blocked behind a failure this cycle; unrelated
        // entities keep draining.
        let mut blocked: HashSet<(EntityType, String)> = HashSet::new();
        // Temporary ids rewritten by creates earlier in this cycle.
        let mut remap: HashMap<(EntityType, String), EntityId> = HashMap::new();

        for entry in entries {
            let key = (entry.entity_type, entry.entity_id.to_string());
            if blocked.contains(&key) {
                continue;
            }
            if !entry.is_due(started_at, self.config.retry_base) {
                continue;
            }
            let effective_id = remap
                .get(&key)
                .cloned()
                .unwrap_or_else(|| entry.entity_id.clone());

            match self.replay_entry(&entry, &effective_id).await {
                Ok(rewritten) => {
                    succeeded += 1;
                    metrics::record_outcome(AttemptOutcome::Success);
                    if let Some(server_id) = rewritten {
                        remap.insert(key, server_id);
                    }
                }
                Err(ApiFailure::Transient { message }) => {
                    metrics::record_outcome(AttemptOutcome::Failure);
                    let updated = self.store.record_attempt(entry.id, Some(&message)).await?;
                    if updated.retry_count >= self.config.max_attempts {
                        tracing::warn!(
                            target: "offline::sync",
                            queue_id = %entry.id,
                            retries = updated.retry_count,
                            "retry budget exhausted"
                        );
                        self.store.mark_mutation_failed(entry.id, &message).await?;
                        self.store
                            .set_sync_status(entry.entity_type, &effective_id, SyncStatus::Failed, None)
                            .await?;
                        failed += 1;
                    }
                    blocked.insert(key);
                }
                Err(ApiFailure::Permanent { status, message }) => {
                    metrics::record_outcome(AttemptOutcome::Failure);
                    self.store.record_attempt(entry.id, Some(&message)).await?;
                    self.store.mark_mutation_failed(entry.id, &message).await?;
                    self.store
                        .set_sync_status(entry.entity_type, &effective_id, SyncStatus::Failed, None)
                        .await?;
                    tracing::warn!(
                        target: "offline::sync",
                        queue_id = %entry.id,
                        status,
                        error = %message,
                        "mutation permanently rejected"
                    );
                    failed += 1;
                    blocked.insert(key);
                }
            }
        }

        self.refresh_stale(started_at).await?;

        let remaining = self.store.pending_mutations().await?.len() as u32;
        self.store
            .set_metadata(
                &MetadataKey::last_sync_attempt(),
                json!(started_at.timestamp()),
            )
            .await?;
        if failed == 0 {
            self.store
                .set_metadata(
                    &MetadataKey::last_successful_sync(),
                    json!(Utc::now().timestamp()),
                )
                .await?;
        }

        Ok(SyncReport::new(succeeded, failed, remaining))
    }

    /// Replay one queue entry. Returns the server-assigned id when a
    /// create rewrote a temporary one.
    async fn replay_entry(
        &self,
        entry: &QueueEntry,
        effective_id: &EntityId,
    ) -> std::result::Result<Option<EntityId>, ApiFailure> {
        match entry.kind {
            MutationKind::Create => {
                let body = self
                    .api
                    .create(entry.entity_type, entry.payload.as_json())
                    .await?;
                let server_id = server_id_of(&body)
                    .map_err(|e| ApiFailure::permanent(422, e.to_string()))?;
                let rewritten = if *effective_id != server_id {
                    self.apply_store(
                        self.store
                            .rewrite_entity_id(entry.entity_type, effective_id, &server_id),
                    )
                    .await?;
                    Some(server_id.clone())
                } else {
                    None
                };
                self.finish_applied(entry, body, server_id).await?;
                Ok(rewritten)
            }
            MutationKind::Update => {
                let body = self
                    .api
                    .update(entry.entity_type, effective_id, entry.payload.as_json())
                    .await?;
                let server_id = server_id_of(&body).unwrap_or_else(|_| effective_id.clone());
                self.finish_applied(entry, body, server_id).await?;
                Ok(None)
            }
            MutationKind::Delete => {
                self.api.delete(entry.entity_type, effective_id).await?;
                self.apply_store(self.store.remove(entry.entity_type, effective_id))
                    .await?;
                self.apply_store(self.store.remove_mutation(entry.id))
                    .await?;
                Ok(None)
            }
        }
    }

    async fn finish_applied(
        &self,
        entry: &QueueEntry,
        body: Value,
        server_id: EntityId,
    ) -> std::result::Result<(), ApiFailure> {
        let payload = EntityPayload::new(body)
            .map_err(|e| ApiFailure::permanent(422, format!("Malformed server entity: {e}")))?;
        self.apply_store(self.store.remove_mutation(entry.id))
            .await?;

        // The record only becomes synced once nothing else is queued
        // for it; a later update keeps it pending.
        let outstanding = self
            .apply_store(self.store.mutations_for_entity(entry.entity_type, &server_id))
            .await?;
        let mut record = CachedRecord::from_server(entry.entity_type, server_id, payload);
        if !outstanding.is_empty() {
            record.sync_status = SyncStatus::Pending;
        }
        self.apply_store(self.store.put(record)).await?;
        Ok(())
    }

    /// Storage failures during replay degrade the cycle rather than the
    /// process; the entry stays queued and is retried next cycle.
    async fn apply_store<T>(
        &self,
        op: impl std::future::Future<Output = Result<T>>,
    ) -> std::result::Result<T, ApiFailure> {
        op.await
            .map_err(|e| ApiFailure::transient(format!("local store: {e}")))
    }

    /// Bulk refresh of entity types whose last refresh is older than
    /// the freshness threshold, to catch server-side changes the client
    /// did not originate.
    async fn refresh_stale(&self, now: DateTime<Utc>) -> Result<()> {
        let threshold = chrono::Duration::seconds(self.config.freshness_threshold as i64);
        for entity_type in EntityType::ALL {
            let key = MetadataKey::last_refresh(entity_type);
            let last = self
                .store
                .get_metadata(&key)
                .await?
                .and_then(|v| v.as_i64())
                .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0));
            if let Some(last) = last {
                if now - last < threshold {
                    continue;
                }
            }

            match self.api.fetch_list(entity_type).await {
                Ok(bodies) => {
                    let mut records = Vec::with_capacity(bodies.len());
                    for body in bodies {
                        match server_record(entity_type, body) {
                            Ok(record) => records.push(record),
                            Err(err) => tracing::warn!(
                                target: "offline::sync",
                                %entity_type,
                                error = %err,
                                "skipping malformed server entity"
                            ),
                        }
                    }
                    self.store.apply_server_state(entity_type, records).await?;
                    self.store.set_metadata(&key, json!(now.timestamp())).await?;
                }
                Err(err) => {
                    tracing::debug!(
                        target: "offline::sync",
                        %entity_type,
                        error = %err,
                        "refresh skipped"
                    );
                }
            }
        }
        Ok(())
    }

    /// Startup pass re-deriving queue/status consistency: any pending
    /// record that lost its queue entries is re-enqueued from its
    /// cached payload.
    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        let entries = self.store.pending_mutations().await?;

        let mut report = ReconcileReport {
            queued_mutations: entries.len() as u32,
            ..ReconcileReport::default()
        };

        for entity_type in EntityType::ALL {
            let pending = self
                .store
                .list(entity_type, RecordFilter::with_status(SyncStatus::Pending))
                .await?;
            for record in pending {
                report.pending_records += 1;
                // Failed entries count as outstanding too: re-enqueuing
                // over them would race the user's retry-or-discard call.
                let outstanding = self
                    .store
                    .mutations_for_entity(entity_type, &record.entity_id)
                    .await?;
                if !outstanding.is_empty() {
                    continue;
                }
                let kind = if record.entity_id.is_temporary() {
                    MutationKind::Create
                } else {
                    MutationKind::Update
                };
                self.store
                    .enqueue_mutation(QueueEntryDraft::new(
                        entity_type,
                        record.entity_id.clone(),
                        kind,
                        record.data.clone(),
                    ))
                    .await?;
                report.requeued += 1;
            }
        }

        if report.requeued > 0 {
            tracing::info!(
                target: "offline::sync",
                requeued = report.requeued,
                "reconciliation re-queued orphaned pending records"
            );
        }
        Ok(report)
    }
}

/// Extract the stable server-assigned id from an entity body.
pub(crate) fn server_id_of(body: &Value) -> Result<EntityId> {
    let raw = body
        .get("id")
        .ok_or_else(|| AppError::Validation("Server entity has no id field".to_string()))?;
    let id = match raw {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => {
            return Err(AppError::Validation(
                "Server entity id is neither string nor number".to_string(),
            ))
        }
    };
    EntityId::new(id).map_err(AppError::Validation)
}

fn server_record(entity_type: EntityType, body: Value) -> Result<CachedRecord> {
    let id = server_id_of(&body)?;
    let payload = EntityPayload::new(body).map_err(AppError::Validation)?;
    Ok(CachedRecord::from_server(entity_type, id, payload))
}
