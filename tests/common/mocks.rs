#![allow(dead_code)]

use async_trait::async_trait;
use commune_offline::{ApiFailure, EntityId, EntityType, RemoteApi};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Probe,
    FetchOne,
    FetchList,
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone)]
pub struct CallRecord {
    pub op: Op,
    pub entity_type: Option<EntityType>,
    pub entity_id: Option<String>,
    pub payload: Option<Value>,
}

/// Scripted remote API. Responses queue per operation; when a queue is
/// empty the mock echoes the request back with a generated server id,
/// which keeps happy-path tests short.
pub struct MockRemoteApi {
    reachable: AtomicBool,
    id_counter: AtomicU64,
    delay: RwLock<Option<Duration>>,
    calls: RwLock<Vec<CallRecord>>,
    create_responses: RwLock<VecDeque<Result<Value, ApiFailure>>>,
    update_responses: RwLock<VecDeque<Result<Value, ApiFailure>>>,
    delete_responses: RwLock<VecDeque<Result<(), ApiFailure>>>,
    fetch_one_responses: RwLock<VecDeque<Result<Value, ApiFailure>>>,
    fetch_list_responses: RwLock<VecDeque<Result<Vec<Value>, ApiFailure>>>,
}

impl MockRemoteApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            reachable: AtomicBool::new(false),
            id_counter: AtomicU64::new(0),
            delay: RwLock::new(None),
            calls: RwLock::new(Vec::new()),
            create_responses: RwLock::new(VecDeque::new()),
            update_responses: RwLock::new(VecDeque::new()),
            delete_responses: RwLock::new(VecDeque::new()),
            fetch_one_responses: RwLock::new(VecDeque::new()),
            fetch_list_responses: RwLock::new(VecDeque::new()),
        })
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    pub async fn script_create(&self, response: Result<Value, ApiFailure>) {
        self.create_responses.write().await.push_back(response);
    }

    pub async fn script_update(&self, response: Result<Value, ApiFailure>) {
        self.update_responses.write().await.push_back(response);
    }

    pub async fn script_delete(&self, response: Result<(), ApiFailure>) {
        self.delete_responses.write().await.push_back(response);
    }

    pub async fn script_fetch_one(&self, response: Result<Value, ApiFailure>) {
        self.fetch_one_responses.write().await.push_back(response);
    }

    pub async fn script_fetch_list(&self, response: Result<Vec<Value>, ApiFailure>) {
        self.fetch_list_responses.write().await.push_back(response);
    }

    pub async fn calls(&self) -> Vec<CallRecord> {
        self.calls.read().await.clone()
    }

    pub async fn calls_of(&self, op: Op) -> Vec<CallRecord> {
        self.calls
            .read()
            .await
            .iter()
            .filter(|call| call.op == op)
            .cloned()
            .collect()
    }

    async fn record(
        &self,
        op: Op,
        entity_type: Option<EntityType>,
        entity_id: Option<&EntityId>,
        payload: Option<&Value>,
    ) {
        if let Some(delay) = *self.delay.read().await {
            tokio::time::sleep(delay).await;
        }
        self.calls.write().await.push(CallRecord {
            op,
            entity_type,
            entity_id: entity_id.map(|id| id.to_string()),
            payload: payload.cloned(),
        });
    }

    fn next_server_id(&self) -> String {
        let n = self.id_counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("srv-auto-{n}")
    }

    fn echo_with_id(&self, payload: &Value, id: Option<&EntityId>) -> Value {
        let mut body = payload.clone();
        if let Value::Object(map) = &mut body {
            let id = id
                .map(|id| id.to_string())
                .unwrap_or_else(|| self.next_server_id());
            map.insert("id".to_string(), json!(id));
        }
        body
    }
}

#[async_trait]
impl RemoteApi for MockRemoteApi {
    async fn probe(&self) -> bool {
        self.record(Op::Probe, None, None, None).await;
        self.reachable.load(Ordering::SeqCst)
    }

    async fn fetch_one(
        &self,
        entity_type: EntityType,
        id: &EntityId,
    ) -> Result<Value, ApiFailure> {
        self.record(Op::FetchOne, Some(entity_type), Some(id), None)
            .await;
        match self.fetch_one_responses.write().await.pop_front() {
            Some(response) => response,
            None => Ok(json!({"id": id.to_string()})),
        }
    }

    async fn fetch_list(&self, entity_type: EntityType) -> Result<Vec<Value>, ApiFailure> {
        self.record(Op::FetchList, Some(entity_type), None, None)
            .await;
        match self.fetch_list_responses.write().await.pop_front() {
            Some(response) => response,
            None => Ok(Vec::new()),
        }
    }

    async fn create(&self, entity_type: EntityType, payload: &Value) -> Result<Value, ApiFailure> {
        self.record(Op::Create, Some(entity_type), None, Some(payload))
            .await;
        match self.create_responses.write().await.pop_front() {
            Some(response) => response,
            None => Ok(self.echo_with_id(payload, None)),
        }
    }

    async fn update(
        &self,
        entity_type: EntityType,
        id: &EntityId,
        payload: &Value,
    ) -> Result<Value, ApiFailure> {
        self.record(Op::Update, Some(entity_type), Some(id), Some(payload))
            .await;
        match self.update_responses.write().await.pop_front() {
            Some(response) => response,
            None => Ok(self.echo_with_id(payload, Some(id))),
        }
    }

    async fn delete(&self, entity_type: EntityType, id: &EntityId) -> Result<(), ApiFailure> {
        self.record(Op::Delete, Some(entity_type), Some(id), None)
            .await;
        match self.delete_responses.write().await.pop_front() {
            Some(response) => response,
            None => Ok(()),
        }
    }
}
