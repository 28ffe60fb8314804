use serde::{Deserialize, Serialize};
use std::fmt;

/// Row id of a mutation queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueueId(i64);

impl QueueId {
    pub fn new(value: i64) -> Result<Self, String> {
        if value <= 0 {
            return Err("Queue id must be positive".to_string());
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
