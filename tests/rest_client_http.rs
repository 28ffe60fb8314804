use commune_offline::infrastructure::api::RestRemoteApi;
use commune_offline::shared::config::ConnectivityConfig;
use commune_offline::{ApiFailure, EntityId, EntityType, RemoteApi};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> RestRemoteApi {
    RestRemoteApi::new(&ConnectivityConfig {
        api_base_url: server.uri(),
        probe_interval: 5,
        debounce_ms: 2000,
        request_timeout: 2,
    })
    .expect("client")
}

#[tokio::test]
async fn create_posts_payload_and_unwraps_envelope() {
    let server = MockServer::start().await;
    let payload = json!({"title": "Park survey"});
    Mock::given(method("POST"))
        .and(path("/surveys"))
        .and(body_json(&payload))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "message": "Survey created",
            "result": {"id": "srv-42", "title": "Park survey"},
        })))
        .mount(&server)
        .await;

    let api = client_for(&server);
    let body = api.create(EntityType::Survey, &payload).await.unwrap();
    assert_eq!(body["id"], json!("srv-42"));
}

#[tokio::test]
async fn fetch_list_returns_result_array() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feedback"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "OK",
            "result": [{"id": "fb-1"}, {"id": "fb-2"}],
        })))
        .mount(&server)
        .await;

    let api = client_for(&server);
    let items = api.fetch_list(EntityType::Feedback).await.unwrap();
    assert_eq!(items.len(), 2);
}

#[tokio::test]
async fn server_errors_classify_as_transient() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/surveys"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "message": "Service unavailable",
        })))
        .mount(&server)
        .await;

    let api = client_for(&server);
    let err = api.fetch_list(EntityType::Survey).await.unwrap_err();
    assert!(err.is_transient());
    assert_eq!(err.message(), "Service unavailable");
}

#[tokio::test]
async fn client_errors_classify_as_permanent_with_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/surveys/srv-1"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "Version conflict",
        })))
        .mount(&server)
        .await;

    let api = client_for(&server);
    let err = api
        .update(
            EntityType::Survey,
            &EntityId::new("srv-1".into()).unwrap(),
            &json!({"title": "New"}),
        )
        .await
        .unwrap_err();

    assert_eq!(err, ApiFailure::permanent(409, "Version conflict"));
}

#[tokio::test]
async fn missing_envelope_message_falls_back_to_status_line() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/comments/cm-1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let api = client_for(&server);
    let err = api
        .delete(
            EntityType::Comment,
            &EntityId::new("cm-1".into()).unwrap(),
        )
        .await
        .unwrap_err();

    match err {
        ApiFailure::Permanent { status, message } => {
            assert_eq!(status, 404);
            assert!(message.contains("404"));
        }
        other => panic!("expected permanent failure, got {other:?}"),
    }
}

#[tokio::test]
async fn probe_reflects_health_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let api = client_for(&server);
    assert!(api.probe().await);
}

#[tokio::test]
async fn probe_is_false_when_nothing_listens() {
    let api = RestRemoteApi::new(&ConnectivityConfig {
        api_base_url: "http://127.0.0.1:9".to_string(),
        probe_interval: 5,
        debounce_ms: 2000,
        request_timeout: 1,
    })
    .expect("client");

    assert!(!api.probe().await);
}

#[tokio::test]
async fn connection_errors_classify_as_transient() {
    let api = RestRemoteApi::new(&ConnectivityConfig {
        api_base_url: "http://127.0.0.1:9".to_string(),
        probe_interval: 5,
        debounce_ms: 2000,
        request_timeout: 1,
    })
    .expect("client");

    let err = api.fetch_list(EntityType::Survey).await.unwrap_err();
    assert!(err.is_transient());
}
