use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfflineConfig {
    pub database: DatabaseConfig,
    pub sync: SyncConfig,
    pub connectivity: ConnectivityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub auto_sync: bool,
    /// Seconds between periodic sync cycles when auto_sync is on.
    pub sync_interval: u64,
    pub max_attempts: u32,
    /// Base retry delay in seconds; doubles per attempt.
    pub retry_base: u64,
    /// Seconds before a cached entity type is considered stale.
    pub freshness_threshold: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectivityConfig {
    pub api_base_url: String,
    /// Seconds between reachability probes.
    pub probe_interval: u64,
    /// Milliseconds a transition must hold before it is published.
    pub debounce_ms: u64,
    pub request_timeout: u64,
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: default_database_url(),
                max_connections: 5,
                connection_timeout: 30,
            },
            sync: SyncConfig {
                auto_sync: true,
                sync_interval: 300,
                max_attempts: 5,
                retry_base: 2,
                freshness_threshold: 600,
            },
            connectivity: ConnectivityConfig {
                api_base_url: "http://localhost:3000/api".to_string(),
                probe_interval: 5,
                debounce_ms: 2000,
                request_timeout: 10,
            },
        }
    }
}

impl OfflineConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("COMMUNE_DATABASE_URL") {
            if !v.trim().is_empty() {
                cfg.database.url = v;
            }
        }
        if let Ok(v) = std::env::var("COMMUNE_API_BASE_URL") {
            if !v.trim().is_empty() {
                cfg.connectivity.api_base_url = v;
            }
        }
        if let Ok(v) = std::env::var("COMMUNE_AUTO_SYNC") {
            cfg.sync.auto_sync = parse_bool(&v, cfg.sync.auto_sync);
        }
        if let Ok(v) = std::env::var("COMMUNE_SYNC_INTERVAL") {
            if let Some(value) = parse_u64(&v) {
                cfg.sync.sync_interval = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("COMMUNE_SYNC_MAX_ATTEMPTS") {
            if let Some(value) = parse_u64(&v) {
                cfg.sync.max_attempts = (value as u32).max(1);
            }
        }
        if let Ok(v) = std::env::var("COMMUNE_PROBE_INTERVAL") {
            if let Some(value) = parse_u64(&v) {
                cfg.connectivity.probe_interval = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("COMMUNE_DEBOUNCE_MS") {
            if let Some(value) = parse_u64(&v) {
                cfg.connectivity.debounce_ms = value;
            }
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }
        if self.connectivity.api_base_url.trim().is_empty() {
            return Err("Connectivity api_base_url must not be empty".to_string());
        }
        if self.sync.max_attempts == 0 {
            return Err("Sync max_attempts must be greater than 0".to_string());
        }
        if self.sync.retry_base == 0 {
            return Err("Sync retry_base must be greater than 0".to_string());
        }
        if self.connectivity.probe_interval == 0 {
            return Err("Connectivity probe_interval must be greater than 0".to_string());
        }
        Ok(())
    }
}

fn default_database_url() -> String {
    let dir = dirs::data_dir()
        .map(|d| d.join("commune"))
        .unwrap_or_else(|| std::path::PathBuf::from("./data"));
    format!("sqlite:{}/offline.db?mode=rwc", dir.display())
}

fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}
