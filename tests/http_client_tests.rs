use serde_json::json;
use std::sync::Arc;
use taskprobe::client::{TaskApi, TaskApiClient, TaskApiConfig};
use taskprobe::config::HarnessConfig;
use taskprobe::error::HarnessError;
use taskprobe::models::{CrawlRequest, ScrapeRequest, StatusKind, TaskEndpoint, TaskPayload};
use taskprobe::poller::CompletionPoller;
use taskprobe::scenario::{catalog, ScenarioContext};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "test-api-key";

fn client_for(server: &MockServer) -> TaskApiClient {
    TaskApiClient::new(TaskApiConfig {
        base_url: server.uri(),
        timeout_ms: 5_000,
        bearer_token: Some(API_KEY.to_string()),
    })
    .unwrap()
}

fn crawl_payload() -> TaskPayload {
    CrawlRequest::new("https://httpbin.org/html", 1, 10).into()
}

#[tokio::test]
async fn test_create_sends_bearer_and_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/crawl"))
        .and(header("authorization", "Bearer test-api-key"))
        .and(body_partial_json(json!({
            "url": "https://httpbin.org/html",
            "crawler_options": {"strategy": "bfs"}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "c-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let handle = client_for(&server)
        .create_task(TaskEndpoint::Crawl, &crawl_payload())
        .await
        .unwrap();

    assert_eq!(handle.id, "c-1");
    assert_eq!(handle.endpoint, TaskEndpoint::Crawl);
}

#[tokio::test]
async fn test_create_accepts_202() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/scrape"))
        .respond_with(
            ResponseTemplate::new(202).set_body_json(json!({"id": "s-9", "status": "queued"})),
        )
        .mount(&server)
        .await;

    let payload: TaskPayload = ScrapeRequest::new("https://httpbin.org/html").into();
    let handle = client_for(&server)
        .create_task(TaskEndpoint::Scrape, &payload)
        .await
        .unwrap();
    assert_eq!(handle.id, "s-9");
}

#[tokio::test]
async fn test_create_rejections_carry_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/crawl"))
        .respond_with(ResponseTemplate::new(422).set_body_string("url: invalid format"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .create_task(TaskEndpoint::Crawl, &crawl_payload())
        .await
        .unwrap_err();

    match err {
        HarnessError::Creation { status, message } => {
            assert_eq!(status, 422);
            assert!(message.contains("invalid format"));
        }
        other => panic!("expected creation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_create_with_200_is_not_a_submission() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/crawl"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "c-1"})))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .create_task(TaskEndpoint::Crawl, &crawl_payload())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(200));
}

#[tokio::test]
async fn test_create_unauthorized_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/crawl"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "invalid api key"})),
        )
        .mount(&server)
        .await;

    let err = client_for(&server)
        .create_task(TaskEndpoint::Crawl, &crawl_payload())
        .await
        .unwrap_err();
    assert!(err.is_auth_failure());
    assert!(!err.is_recoverable());
}

#[tokio::test]
async fn test_create_without_id_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/crawl"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"status": "queued"})))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .create_task(TaskEndpoint::Crawl, &crawl_payload())
        .await
        .unwrap_err();
    assert!(matches!(err, HarnessError::InvalidResponse { .. }));
}

#[tokio::test]
async fn test_get_status_parses_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/crawl/c-1"))
        .and(header("authorization", "Bearer test-api-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "c-1",
            "status": "running",
            "completed_tasks": 4,
            "total_tasks": 10
        })))
        .mount(&server)
        .await;

    let snapshot = client_for(&server)
        .get_status(TaskEndpoint::Crawl, "c-1")
        .await
        .unwrap();

    assert_eq!(snapshot.status, StatusKind::Running);
    assert_eq!(snapshot.completed_sub_units, 4);
    assert_eq!(snapshot.total_sub_units, 10);
    assert_eq!(snapshot.field("/id"), Some(&json!("c-1")));
}

#[tokio::test]
async fn test_get_status_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/crawl/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/crawl/odd"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "paused"})))
        .mount(&server)
        .await;

    let client = client_for(&server);

    let missing = client.get_status(TaskEndpoint::Crawl, "gone").await.unwrap_err();
    assert!(matches!(missing, HarnessError::Api { status: 404, .. }));
    assert!(missing.is_recoverable());

    let unknown = client.get_status(TaskEndpoint::Crawl, "odd").await.unwrap_err();
    assert!(matches!(unknown, HarnessError::UnknownStatus(ref s) if s == "paused"));
}

#[tokio::test]
async fn test_cancel_only_204_is_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/crawl/c-1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1/crawl/c-2"))
        .respond_with(ResponseTemplate::new(409).set_body_string("already completed"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.cancel_task(TaskEndpoint::Crawl, "c-1").await.unwrap());
    assert!(!client.cancel_task(TaskEndpoint::Crawl, "c-2").await.unwrap());
}

#[tokio::test]
async fn test_health_check() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .mount(&server)
        .await;

    assert!(client_for(&server).health_check().await);

    let unhealthy = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&unhealthy)
        .await;
    assert!(!client_for(&unhealthy).health_check().await);
}

#[tokio::test]
async fn test_unreachable_service_is_transport_error() {
    let client = TaskApiClient::new(TaskApiConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        timeout_ms: 1_000,
        bearer_token: None,
    })
    .unwrap();

    assert!(!client.health_check().await);
    let err = client
        .create_task(TaskEndpoint::Crawl, &crawl_payload())
        .await
        .unwrap_err();
    assert!(matches!(err, HarnessError::Http(_)));
}

#[tokio::test]
async fn test_error_handling_scenario_against_service() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/scrape"))
        .and(header("authorization", "Bearer invalid-key"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "unauthorized"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/scrape"))
        .and(header("authorization", "Bearer test-api-key"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({"error": "invalid url"})),
        )
        .mount(&server)
        .await;

    let mut config = HarnessConfig::default();
    config.api.base_url = server.uri();
    config.api.api_key = API_KEY.to_string();
    let ctx = ScenarioContext {
        client: Arc::new(TaskApiClient::from_config(&config.api).unwrap()),
        poller: CompletionPoller::new(config.poller_config()),
        config: Arc::new(config),
    };

    let verdict = catalog::error_handling(ctx).await.unwrap();
    assert!(verdict.passed, "{}", verdict.detail);
}

#[tokio::test]
async fn test_error_handling_scenario_flags_accepted_invalid_input() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/scrape"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "s-1"})))
        .mount(&server)
        .await;

    let mut config = HarnessConfig::default();
    config.api.base_url = server.uri();
    let ctx = ScenarioContext {
        client: Arc::new(TaskApiClient::from_config(&config.api).unwrap()),
        poller: CompletionPoller::new(config.poller_config()),
        config: Arc::new(config),
    };

    let verdict = catalog::error_handling(ctx).await.unwrap();
    assert!(!verdict.passed);
    assert!(verdict.detail.contains("invalid url"));
}
