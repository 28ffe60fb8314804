use crate::application::ports::RemoteApi;
use crate::domain::entities::ConnectivityState;
use crate::shared::config::ConnectivityConfig;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;

#[derive(Debug, Default)]
struct DebounceState {
    /// When the derived value first went offline, if not yet published.
    offline_since: Option<Instant>,
    /// When the last online transition was published.
    last_rise: Option<Instant>,
}

/// Tracks the raw host online flag and a periodically probed
/// reachability state, and publishes the debounced derived belief
/// (`online && reachable`) through a watch channel. Consumers subscribe
/// to transitions rather than polling.
pub struct ConnectivityMonitor {
    api: Arc<dyn RemoteApi>,
    state: Arc<RwLock<ConnectivityState>>,
    published: watch::Sender<bool>,
    debounce_state: RwLock<DebounceState>,
    probe_interval: Duration,
    debounce: Duration,
}

impl ConnectivityMonitor {
    pub fn new(api: Arc<dyn RemoteApi>, config: &ConnectivityConfig) -> Self {
        let (published, _) = watch::channel(false);
        Self {
            api,
            state: Arc::new(RwLock::new(ConnectivityState::default())),
            published,
            debounce_state: RwLock::new(DebounceState::default()),
            probe_interval: Duration::from_secs(config.probe_interval),
            debounce: Duration::from_millis(config.debounce_ms),
        }
    }

    /// Debounced transitions of the derived online belief.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.published.subscribe()
    }

    pub async fn current_state(&self) -> ConnectivityState {
        *self.state.read().await
    }

    /// The immediate, undebounced belief. The facade branches on this;
    /// the debounced channel exists only to gate sync triggering.
    pub async fn is_effectively_online(&self) -> bool {
        self.state.read().await.is_effectively_online()
    }

    /// Host-fed raw online/offline signal (edge-triggered environment
    /// events). The probe loop alone converges when no host signal
    /// exists, just more slowly.
    pub async fn set_online(&self, online: bool) {
        {
            let mut state = self.state.write().await;
            if state.online == online {
                return;
            }
            state.online = online;
            // The raw flag says nothing about the API host; an online
            // interface still has to prove reachability.
            if online {
                tracing::info!(target: "offline::connectivity", "host reports online");
            } else {
                tracing::info!(target: "offline::connectivity", "host reports offline");
            }
        }
        if online {
            self.check_now().await;
        } else {
            self.publish_derived().await;
        }
    }

    /// Run one reachability probe and republish the derived state.
    pub async fn check_now(&self) -> bool {
        let reachable = self.api.probe().await;
        {
            let mut state = self.state.write().await;
            state.reachable = reachable;
            state.last_checked_at = Some(Utc::now());
        }
        self.publish_derived().await;
        reachable
    }

    /// Spawn the periodic probe loop.
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(monitor.probe_interval);
            loop {
                interval.tick().await;
                monitor.check_now().await;
            }
        })
    }

    async fn publish_derived(&self) {
        let derived = self.state.read().await.is_effectively_online();
        let current = *self.published.borrow();
        let now = Instant::now();
        let mut debounce = self.debounce_state.write().await;

        if derived == current {
            debounce.offline_since = None;
            return;
        }

        if derived {
            // A flap that recovered inside the window publishes nothing.
            debounce.offline_since = None;
            if let Some(last) = debounce.last_rise {
                if now.duration_since(last) < self.debounce {
                    return;
                }
            }
            debounce.last_rise = Some(now);
            self.published.send_replace(true);
            tracing::info!(target: "offline::connectivity", "effectively online");
        } else {
            // Withhold the offline transition until it has held for the
            // debounce window; the next probe tick publishes it.
            match debounce.offline_since {
                None => debounce.offline_since = Some(now),
                Some(since) if now.duration_since(since) >= self.debounce => {
                    debounce.offline_since = None;
                    self.published.send_replace(false);
                    tracing::warn!(target: "offline::connectivity", "effectively offline");
                }
                Some(_) => {}
            }
        }
    }
}
