//! Retry executor behavior against a mock upstream.

use desk_api_rust::config::PoolConfig;
use desk_api_rust::{DeskClient, ErrorKind, RetryPolicy};
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, policy: RetryPolicy) -> DeskClient {
    DeskClient::builder()
        .base_url(server.uri())
        .static_token("test-token")
        .retry_policy(policy)
        .disable_cache()
        .build()
        .expect("client should build")
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy::new(4, Duration::from_millis(10), Duration::from_millis(100))
}

#[tokio::test]
async fn server_errors_are_retried_until_the_final_attempt_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tickets"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(3)
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tickets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, fast_policy());
    let value = client.get("/tickets", None).await.expect("final attempt succeeds");
    assert_eq!(value["ok"], true);
}

#[tokio::test]
async fn not_found_is_never_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tickets/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, fast_policy());
    let error = client.get("/tickets/missing", None).await.unwrap_err();
    assert_eq!(error.kind(), Some(ErrorKind::NotFound));
}

#[tokio::test]
async fn invalid_input_is_never_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tickets"))
        .respond_with(
            ResponseTemplate::new(422)
                .set_body_json(serde_json::json!({"errors": [{"field": "status"}]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, fast_policy());
    let error = client.get("/tickets", None).await.unwrap_err();
    assert_eq!(error.kind(), Some(ErrorKind::InvalidInput));
    assert!(error.api().unwrap().details.get("validation").is_some());
}

#[tokio::test]
async fn rate_limit_waits_at_least_the_declared_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tickets"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "1"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tickets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let policy = RetryPolicy::new(4, Duration::from_millis(10), Duration::from_secs(5));
    let client = client(&server, policy);

    let started = Instant::now();
    client.get("/tickets", None).await.expect("second attempt succeeds");
    assert!(
        started.elapsed() >= Duration::from_secs(1),
        "executor must honor Retry-After before the next attempt"
    );
}

#[tokio::test]
async fn exhausted_rate_limit_surfaces_with_the_parsed_wait() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tickets"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
        .expect(4)
        .mount(&server)
        .await;

    let client = client(&server, fast_policy());
    let error = client.get("/tickets", None).await.unwrap_err();
    assert_eq!(error.kind(), Some(ErrorKind::RateLimit));
    let api = error.api().unwrap();
    assert_eq!(api.retry_after, Some(0));
    assert_eq!(api.suggestion(), Some("reduce request frequency"));
}

#[tokio::test]
async fn exhausted_server_errors_note_the_spent_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tickets"))
        .respond_with(ResponseTemplate::new(503))
        .expect(4)
        .mount(&server)
        .await;

    let client = client(&server, fast_policy());
    let error = client.get("/tickets", None).await.unwrap_err();
    assert_eq!(error.kind(), Some(ErrorKind::UpstreamError));
    let api = error.api().unwrap();
    assert_eq!(api.details.get("attempts"), Some(&serde_json::json!(4)));
    assert_eq!(api.verb, "GET");
    assert_eq!(api.path, "/tickets");
    assert!(!api.trace_id.is_empty());
}

#[tokio::test]
async fn per_attempt_timeouts_are_retried_then_normalized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({}))
                .set_delay(Duration::from_millis(500)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let pool = PoolConfig {
        request_timeout: Duration::from_millis(100),
        ..PoolConfig::default()
    };
    let client = DeskClient::builder()
        .base_url(server.uri())
        .static_token("test-token")
        .pool_config(pool)
        .retry_policy(RetryPolicy::new(
            2,
            Duration::from_millis(10),
            Duration::from_millis(50),
        ))
        .disable_cache()
        .build()
        .unwrap();

    let error = client.get("/slow", None).await.unwrap_err();
    assert_eq!(error.kind(), Some(ErrorKind::UpstreamError));
    let api = error.api().unwrap();
    assert_eq!(api.details.get("attempts"), Some(&serde_json::json!(2)));
}
