use crate::domain::value_objects::{EntityId, EntityType};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

/// Outcome classification for remote calls. Transient failures are
/// retried by the sync engine per its backoff policy; permanent ones
/// are surfaced to the user with the server's message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiFailure {
    /// Timeout, connection refused, 5xx.
    Transient { message: String },
    /// 4xx validation, conflict, not-found.
    Permanent { status: u16, message: String },
}

impl ApiFailure {
    pub fn transient(message: impl Into<String>) -> Self {
        ApiFailure::Transient {
            message: message.into(),
        }
    }

    pub fn permanent(status: u16, message: impl Into<String>) -> Self {
        ApiFailure::Permanent {
            status,
            message: message.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, ApiFailure::Transient { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            ApiFailure::Transient { message } => message,
            ApiFailure::Permanent { message, .. } => message,
        }
    }
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiFailure::Transient { message } => write!(f, "transient: {message}"),
            ApiFailure::Permanent { status, message } => {
                write!(f, "permanent ({status}): {message}")
            }
        }
    }
}

impl std::error::Error for ApiFailure {}

/// The remote REST API, reduced to what the sync layer depends on:
/// HTTP-class success/failure, full entity bodies in responses, and a
/// stable server-assigned id field.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Cheap reachability check; never errors, just answers.
    async fn probe(&self) -> bool;

    async fn fetch_one(
        &self,
        entity_type: EntityType,
        id: &EntityId,
    ) -> Result<Value, ApiFailure>;

    async fn fetch_list(&self, entity_type: EntityType) -> Result<Vec<Value>, ApiFailure>;

    /// Returns the created entity in full, including the server id.
    async fn create(&self, entity_type: EntityType, payload: &Value) -> Result<Value, ApiFailure>;

    async fn update(
        &self,
        entity_type: EntityType,
        id: &EntityId,
        payload: &Value,
    ) -> Result<Value, ApiFailure>;

    async fn delete(&self, entity_type: EntityType, id: &EntityId) -> Result<(), ApiFailure>;
}
