//! Basic usage example (developer-friendly facade)
//!
//! Demonstrates reading, creating and updating helpdesk resources through
//! the resilient client.
//!
//! Credentials are configured via environment variables:
//! - DESK_BASE_URL for the upstream API root
//! - DESK_API_TOKEN for a static bearer token
//!
//! Usage:
//!   DESK_BASE_URL=https://desk.example.com/api/v1 DESK_API_TOKEN=... \
//!     cargo run --example basic_usage

use desk_api_rust::DeskClient;
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let client = DeskClient::from_env()?;

    if !client.test_connection().await {
        eprintln!("Upstream is not reachable; check DESK_BASE_URL and credentials.");
        return Ok(());
    }

    // Cached read: a second identical call within the TTL issues no network
    // traffic at all.
    let page = client.get_page("/tickets", None).await?;
    if let Some((key, items)) = page.first_collection() {
        println!("{} {}: {} on this page", items.len(), key, items.len());
    }

    let created = client
        .post(
            "/tickets",
            &json!({
                "subject": "Printer out of toner",
                "priority": "low",
            }),
        )
        .await?;
    println!("created ticket {}", created["id"]);

    client
        .patch(
            &format!("/tickets/{}", created["id"].as_str().unwrap_or_default()),
            &json!({"status": "in_progress"}),
        )
        .await?;

    println!("cache: {:?}", client.cache_stats());
    println!("pool: {:?}", client.pool_stats());

    client.close_pool().await;
    Ok(())
}
