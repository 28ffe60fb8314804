use crate::domain::value_objects::{EntityId, EntityPayload, EntityType, MutationKind, QueueId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueEntryStatus {
    Pending,
    Failed,
}

impl QueueEntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueEntryStatus::Pending => "pending",
            QueueEntryStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "pending" => Ok(QueueEntryStatus::Pending),
            "failed" => Ok(QueueEntryStatus::Failed),
            other => Err(format!("Unknown queue entry status: {other}")),
        }
    }
}

/// One durable pending mutation. Entries for the same entity replay in
/// creation order; failed entries stay visible until the user acts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueueEntry {
    pub id: QueueId,
    pub entity_type: EntityType,
    pub entity_id: EntityId,
    pub kind: MutationKind,
    pub payload: EntityPayload,
    pub status: QueueEntryStatus,
    pub retry_count: u32,
    pub last_attempt: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl QueueEntry {
    /// Whether the entry's backoff delay has elapsed and it may be
    /// attempted again. A never-attempted entry is always due.
    pub fn is_due(&self, now: DateTime<Utc>, retry_base_secs: u64) -> bool {
        match self.last_attempt {
            None => true,
            Some(last) => {
                let exponent = self.retry_count.saturating_sub(1).min(16);
                let delay = retry_base_secs.saturating_mul(1u64 << exponent);
                now >= last + chrono::Duration::seconds(delay as i64)
            }
        }
    }
}
