pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;

pub use application::ports::{ApiFailure, LocalStore, RemoteApi, SyncNotifier, TracingNotifier};
pub use application::services::{
    ConnectivityMonitor, EngineState, OfflineFacade, ReadOutcome, SyncEngine, WriteOutcome,
};
pub use domain::entities::{
    CacheStatusSnapshot, CachedRecord, ConnectivityState, QueueEntry, QueueEntryDraft,
    RecordFilter, SyncReport,
};
pub use domain::value_objects::{
    EntityId, EntityPayload, EntityType, MetadataKey, MutationKind, QueueId, SyncStatus,
};
pub use shared::config::OfflineConfig;
pub use shared::error::{AppError, Result};

use infrastructure::api::RestRemoteApi;
use infrastructure::database::ConnectionPool;
use infrastructure::store::SqliteLocalStore;
use serde_json::json;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

const SCHEMA_VERSION: u32 = 2;

/// Explicitly constructed composition root. The host application owns
/// one of these and hands the facade down to UI code; nothing in the
/// crate is reachable through module-level singletons.
pub struct OfflineRuntime {
    config: OfflineConfig,
    pool: ConnectionPool,
    store: Arc<dyn LocalStore>,
    monitor: Arc<ConnectivityMonitor>,
    engine: Arc<SyncEngine>,
    facade: Arc<OfflineFacade>,
}

impl OfflineRuntime {
    pub async fn new(config: OfflineConfig) -> anyhow::Result<Self> {
        Self::with_notifier(config, Arc::new(TracingNotifier)).await
    }

    pub async fn with_notifier(
        config: OfflineConfig,
        notifier: Arc<dyn SyncNotifier>,
    ) -> anyhow::Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid offline config: {e}"))?;

        if let Some(dir) = database_parent_dir(&config.database.url) {
            std::fs::create_dir_all(dir)?;
        }

        let pool = ConnectionPool::new(&config.database).await?;
        pool.migrate().await?;

        let store: Arc<dyn LocalStore> = Arc::new(SqliteLocalStore::new(pool.get_pool().clone()));
        store
            .set_metadata(&MetadataKey::schema_version(), json!(SCHEMA_VERSION))
            .await?;

        let api: Arc<dyn RemoteApi> = Arc::new(RestRemoteApi::new(&config.connectivity)?);
        let monitor = Arc::new(ConnectivityMonitor::new(api.clone(), &config.connectivity));
        let engine = Arc::new(SyncEngine::new(
            store.clone(),
            api.clone(),
            notifier.clone(),
            config.sync.clone(),
        ));
        let facade = Arc::new(OfflineFacade::new(
            store.clone(),
            api,
            monitor.clone(),
            notifier,
        ));

        info!(target: "offline::runtime", "offline runtime initialized");

        Ok(Self {
            config,
            pool,
            store,
            monitor,
            engine,
            facade,
        })
    }

    /// Reconcile queue/status invariants and spawn the background
    /// tasks: the reachability probe loop, the connectivity-recovery
    /// trigger, and (when configured) the periodic sync loop.
    pub async fn start(&self) -> Result<Vec<JoinHandle<()>>> {
        self.engine.reconcile().await?;

        let mut handles = vec![
            self.monitor.start(),
            self.engine.watch_connectivity(self.monitor.subscribe()),
        ];
        if self.config.sync.auto_sync {
            handles.push(self.engine.start());
        }
        Ok(handles)
    }

    pub fn facade(&self) -> Arc<OfflineFacade> {
        self.facade.clone()
    }

    pub fn engine(&self) -> Arc<SyncEngine> {
        self.engine.clone()
    }

    pub fn monitor(&self) -> Arc<ConnectivityMonitor> {
        self.monitor.clone()
    }

    pub fn store(&self) -> Arc<dyn LocalStore> {
        self.store.clone()
    }

    pub fn config(&self) -> &OfflineConfig {
        &self.config
    }

    pub async fn shutdown(&self) {
        self.pool.close().await;
    }
}

fn database_parent_dir(url: &str) -> Option<std::path::PathBuf> {
    let path = url.strip_prefix("sqlite:")?;
    if path.starts_with(':') {
        return None;
    }
    let path = path.split('?').next().unwrap_or(path);
    std::path::Path::new(path)
        .parent()
        .map(|p| p.to_path_buf())
        .filter(|p| !p.as_os_str().is_empty())
}

/// Tracing setup for binaries and examples; tests install their own.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}
