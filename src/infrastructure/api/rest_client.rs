use crate::application::ports::{ApiFailure, RemoteApi};
use crate::domain::value_objects::{EntityId, EntityType};
use crate::shared::config::ConnectivityConfig;
use crate::shared::error::AppError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Response envelope shared by every endpoint of the remote API.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    result: Option<Value>,
}

/// reqwest-backed `RemoteApi`. Failure classification is by HTTP
/// class: transport errors and 5xx are transient, 4xx is permanent
/// with the server's message.
pub struct RestRemoteApi {
    client: reqwest::Client,
    base_url: String,
}

impl RestRemoteApi {
    pub fn new(config: &ConnectivityConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()
            .map_err(|e| AppError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn collection_url(&self, entity_type: EntityType) -> String {
        format!("{}/{}", self.base_url, entity_type.collection())
    }

    fn entity_url(&self, entity_type: EntityType, id: &EntityId) -> String {
        format!("{}/{}/{}", self.base_url, entity_type.collection(), id)
    }

    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<Value, ApiFailure> {
        let response = request.send().await.map_err(classify_transport)?;
        let status = response.status();

        if status.is_success() {
            let envelope: Envelope = response
                .json()
                .await
                .map_err(|e| ApiFailure::transient(format!("Malformed response body: {e}")))?;
            return Ok(envelope.result.unwrap_or(Value::Null));
        }

        let message = response
            .json::<Envelope>()
            .await
            .ok()
            .and_then(|envelope| envelope.message)
            .unwrap_or_else(|| format!("HTTP {status}"));

        if status.is_server_error() {
            Err(ApiFailure::transient(message))
        } else {
            Err(ApiFailure::permanent(status.as_u16(), message))
        }
    }
}

fn classify_transport(err: reqwest::Error) -> ApiFailure {
    // Everything at the transport layer (timeouts, refused connections,
    // DNS) is retryable by definition.
    ApiFailure::transient(err.to_string())
}

#[async_trait]
impl RemoteApi for RestRemoteApi {
    async fn probe(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    async fn fetch_one(
        &self,
        entity_type: EntityType,
        id: &EntityId,
    ) -> Result<Value, ApiFailure> {
        self.execute(self.client.get(self.entity_url(entity_type, id)))
            .await
    }

    async fn fetch_list(&self, entity_type: EntityType) -> Result<Vec<Value>, ApiFailure> {
        let result = self
            .execute(self.client.get(self.collection_url(entity_type)))
            .await?;
        match result {
            Value::Array(items) => Ok(items),
            Value::Null => Ok(Vec::new()),
            other => Err(ApiFailure::transient(format!(
                "Expected a list body, got {other}"
            ))),
        }
    }

    async fn create(&self, entity_type: EntityType, payload: &Value) -> Result<Value, ApiFailure> {
        self.execute(
            self.client
                .post(self.collection_url(entity_type))
                .json(payload),
        )
        .await
    }

    async fn update(
        &self,
        entity_type: EntityType,
        id: &EntityId,
        payload: &Value,
    ) -> Result<Value, ApiFailure> {
        self.execute(
            self.client
                .put(self.entity_url(entity_type, id))
                .json(payload),
        )
        .await
    }

    async fn delete(&self, entity_type: EntityType, id: &EntityId) -> Result<(), ApiFailure> {
        self.execute(self.client.delete(self.entity_url(entity_type, id)))
            .await?;
        Ok(())
    }
}
