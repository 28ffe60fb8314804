#![allow(dead_code)]

pub mod mocks;

use commune_offline::infrastructure::store::SqliteLocalStore;
use commune_offline::shared::config::{ConnectivityConfig, SyncConfig};
use commune_offline::{
    ConnectivityMonitor, EntityId, EntityPayload, EntityType, LocalStore, MutationKind,
    OfflineFacade, QueueEntryDraft, RemoteApi, SyncEngine, SyncNotifier, TracingNotifier,
};
use self::mocks::MockRemoteApi;
use serde_json::json;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use std::sync::Arc;

pub struct OfflineTestContext {
    pub store: Arc<dyn LocalStore>,
    pub api: Arc<MockRemoteApi>,
    pub monitor: Arc<ConnectivityMonitor>,
    pub engine: Arc<SyncEngine>,
    pub facade: Arc<OfflineFacade>,
    pub pool: Pool<Sqlite>,
}

pub async fn setup_context() -> OfflineTestContext {
    setup_context_with(test_sync_config()).await
}

pub async fn setup_context_with(sync_config: SyncConfig) -> OfflineTestContext {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");

    let store: Arc<dyn LocalStore> = Arc::new(SqliteLocalStore::new(pool.clone()));
    let api = MockRemoteApi::new();
    let api_port: Arc<dyn RemoteApi> = api.clone();
    let notifier: Arc<dyn SyncNotifier> = Arc::new(TracingNotifier);

    let monitor = Arc::new(ConnectivityMonitor::new(
        api_port.clone(),
        &test_connectivity_config(),
    ));
    let engine = Arc::new(SyncEngine::new(
        store.clone(),
        api_port.clone(),
        notifier.clone(),
        sync_config,
    ));
    let facade = Arc::new(OfflineFacade::new(
        store.clone(),
        api_port,
        monitor.clone(),
        notifier,
    ));

    OfflineTestContext {
        store,
        api,
        monitor,
        engine,
        facade,
        pool,
    }
}

impl OfflineTestContext {
    /// Flip the mock to reachable and refresh the monitor's belief.
    pub async fn go_online(&self) {
        self.api.set_reachable(true);
        self.monitor.check_now().await;
    }

    pub async fn go_offline(&self) {
        self.api.set_reachable(false);
        self.monitor.check_now().await;
    }
}

pub fn test_sync_config() -> SyncConfig {
    SyncConfig {
        auto_sync: false,
        sync_interval: 300,
        max_attempts: 5,
        // Zero backoff keeps every queued entry due; the backoff curve
        // itself is covered by unit tests on QueueEntry.
        retry_base: 0,
        freshness_threshold: 3600,
    }
}

pub fn test_connectivity_config() -> ConnectivityConfig {
    ConnectivityConfig {
        api_base_url: "http://localhost:0".to_string(),
        probe_interval: 5,
        debounce_ms: 0,
        request_timeout: 1,
    }
}

pub fn survey_payload(title: &str) -> serde_json::Value {
    json!({
        "title": title,
        "status": "open",
    })
}

pub fn feedback_draft(id: &str, body: &str) -> QueueEntryDraft {
    QueueEntryDraft::new(
        EntityType::Feedback,
        EntityId::new(id.into()).expect("entity id"),
        MutationKind::Update,
        EntityPayload::new(json!({"body": body})).expect("payload"),
    )
}
