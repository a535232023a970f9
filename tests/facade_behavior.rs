//! Facade conveniences: id folding, no-content success, probes, pool ops.

use desk_api_rust::{DeskClient, Error, RetryPolicy};
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{header_exists, method, path};
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
        .disable_cache()
        .build()
        .expect("client should build")
}

#[tokio::test]
async fn post_folds_the_resource_id_header_into_the_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tickets"))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("resource-id", "T-1001")
                .set_body_json(json!({"subject": "vpn down"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let created = client(&server)
        .post("/tickets", &json!({"subject": "vpn down"}))
        .await
        .unwrap();
    assert_eq!(created["id"], "T-1001");
    assert_eq!(created["subject"], "vpn down");
}

#[tokio::test]
async fn post_does_not_overwrite_an_id_already_in_the_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tickets"))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("resource-id", "T-9999")
                .set_body_json(json!({"id": "T-1"})),
        )
        .mount(&server)
        .await;

    let created = client(&server).post("/tickets", &json!({})).await.unwrap();
    assert_eq!(created["id"], "T-1");
}

#[tokio::test]
async fn post_with_an_empty_body_still_returns_the_created_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tickets"))
        .respond_with(ResponseTemplate::new(201).insert_header("resource-id", "T-7"))
        .mount(&server)
        .await;

    let created = client(&server).post("/tickets", &json!({})).await.unwrap();
    assert_eq!(created, json!({"id": "T-7"}));
}

#[tokio::test]
async fn put_and_patch_treat_no_content_as_success() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/tickets/T-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/tickets/T-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    assert_eq!(client.put("/tickets/T-1", &json!({})).await.unwrap(), Value::Null);
    assert_eq!(client.patch("/tickets/T-1", &json!({})).await.unwrap(), Value::Null);
}

#[tokio::test]
async fn every_outbound_call_carries_a_trace_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tickets"))
        .and(header_exists("x-desk-request-id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).get("/tickets", None).await.unwrap();
}

#[tokio::test]
async fn get_page_parses_the_pagination_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tickets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_embedded": { "tickets": [{"id": "T-1"}, {"id": "T-2"}] },
            "_links": { "next": { "href": "/tickets?page=1" } },
            "page": { "size": 2, "totalElements": 4, "totalPages": 2, "number": 0 }
        })))
        .mount(&server)
        .await;

    let page = client(&server).get_page("/tickets", None).await.unwrap();
    assert_eq!(page.items("tickets").len(), 2);
    assert!(page.has_next());
    assert_eq!(page.page.unwrap().total_pages, 2);
}

#[tokio::test]
async fn test_connection_reports_reachability_without_erring() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/version"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"version": "3.2"})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/version"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client(&server);
    assert!(client.test_connection().await);
    assert!(!client.test_connection().await);
}

#[tokio::test]
async fn pool_operations_pass_through_and_shutdown_is_terminal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tickets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let client = client(&server);
    client.get("/tickets", None).await.unwrap();

    let stats = client.pool_stats();
    assert_eq!(stats.plain.active, 0);

    client.clear_idle_connections().unwrap();
    client.get("/tickets", None).await.expect("pool usable after clear");

    client.close_pool().await;
    client.close_pool().await; // idempotent
    assert!(matches!(
        client.get("/tickets", None).await,
        Err(Error::PoolClosed)
    ));
    assert!(matches!(client.clear_idle_connections(), Err(Error::PoolClosed)));
}
