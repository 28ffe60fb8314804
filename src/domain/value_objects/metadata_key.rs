use crate::domain::value_objects::EntityType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Key into the sync metadata table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetadataKey(String);

impl MetadataKey {
    pub fn new(value: String) -> Result<Self, String> {
        if value.trim().is_empty() {
            return Err("Metadata key cannot be empty".to_string());
        }
        Ok(Self(value))
    }

    pub fn last_sync_attempt() -> Self {
        Self("last_sync_attempt".to_string())
    }

    pub fn last_successful_sync() -> Self {
        Self("last_successful_sync".to_string())
    }

    pub fn last_refresh(entity_type: EntityType) -> Self {
        Self(format!("last_refresh:{entity_type}"))
    }

    pub fn schema_version() -> Self {
        Self("schema_version".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MetadataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
