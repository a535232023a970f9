//! Read caching: hits, TTLs, and the mutating-verb bypass.

use desk_api_rust::{CacheOptions, DeskClient, RetryPolicy};
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> DeskClient {
    DeskClient::builder()
        .base_url(server.uri())
        .static_token("test-token")
        .retry_policy(RetryPolicy::new(
            2,
            Duration::from_millis(10),
            Duration::from_millis(50),
        ))
        .build()
        .expect("client should build")
}

#[tokio::test]
async fn identical_reads_within_ttl_hit_the_cache_without_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tickets"))
        .and(query_param("status", "open"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 3})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let params: HashMap<String, String> = [("status".to_string(), "open".to_string())].into();

    let first = client.get("/tickets", Some(&params)).await.unwrap();
    let second = client.get("/tickets", Some(&params)).await.unwrap();
    assert_eq!(first, second);

    let stats = client.cache_stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
}

#[tokio::test]
async fn different_parameters_are_distinct_cache_entries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tickets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(2)
        .mount(&server)
        .await;

    let client = client(&server);
    let open: HashMap<String, String> = [("status".to_string(), "open".to_string())].into();
    let closed: HashMap<String, String> = [("status".to_string(), "closed".to_string())].into();

    client.get("/tickets", Some(&open)).await.unwrap();
    client.get("/tickets", Some(&closed)).await.unwrap();
}

#[tokio::test]
async fn mutating_verbs_never_touch_the_cache() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tickets"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "T-1"})))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/tickets/T-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "T-1"})))
        .expect(2)
        .mount(&server)
        .await;

    let client = client(&server);
    let body = json!({"subject": "printer on fire"});

    client.post("/tickets", &body).await.unwrap();
    client.post("/tickets", &body).await.unwrap();
    client.patch("/tickets/T-1", &body).await.unwrap();
    client.patch("/tickets/T-1", &body).await.unwrap();

    let stats = client.cache_stats();
    assert_eq!(stats.hits, 0);
    assert_eq!(stats.misses, 0);
    assert_eq!(stats.sets, 0);
}

#[tokio::test]
async fn expired_entries_are_fetched_again() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tickets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(2)
        .mount(&server)
        .await;

    let client = client(&server);
    let options = CacheOptions::ttl(Duration::from_millis(40));

    client
        .get_with_options("/tickets", None, options)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(80)).await;
    client
        .get_with_options("/tickets", None, options)
        .await
        .unwrap();
}

#[tokio::test]
async fn bypass_skips_both_read_and_write() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tickets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(2)
        .mount(&server)
        .await;

    let client = client(&server);
    client
        .get_with_options("/tickets", None, CacheOptions::no_cache())
        .await
        .unwrap();
    client
        .get_with_options("/tickets", None, CacheOptions::no_cache())
        .await
        .unwrap();
    assert_eq!(client.cache_stats().sets, 0);
}

#[tokio::test]
async fn binary_downloads_are_never_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tickets/T-1/attachments/a1"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PDFDATA".to_vec()))
        .expect(2)
        .mount(&server)
        .await;

    let client = client(&server);
    let first = client.download("/tickets/T-1/attachments/a1", None).await.unwrap();
    let second = client.download("/tickets/T-1/attachments/a1", None).await.unwrap();
    assert_eq!(first.as_ref(), b"PDFDATA");
    assert_eq!(first, second);
    assert_eq!(client.cache_stats().sets, 0);
}
