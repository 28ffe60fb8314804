use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current belief about connectivity. `online` is the raw host signal;
/// `reachable` is the last probe result against the API itself.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectivityState {
    pub online: bool,
    pub reachable: bool,
    pub last_checked_at: Option<DateTime<Utc>>,
}

impl ConnectivityState {
    pub fn is_effectively_online(&self) -> bool {
        self.online && self.reachable
    }
}

impl Default for ConnectivityState {
    fn default() -> Self {
        Self {
            online: true,
            reachable: false,
            last_checked_at: None,
        }
    }
}
