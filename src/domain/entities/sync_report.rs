use serde::{Deserialize, Serialize};

/// Summary of one sync cycle, surfaced to callers and notifiers.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncReport {
    pub succeeded: u32,
    pub failed: u32,
    pub remaining: u32,
}

impl SyncReport {
    pub fn new(succeeded: u32, failed: u32, remaining: u32) -> Self {
        Self {
            succeeded,
            failed,
            remaining,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.remaining == 0
    }
}
