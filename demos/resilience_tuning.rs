//! Resilience tuning example.
//!
//! Shows how to override the retry policy, pool sizing and cache behavior,
//! and how pool lifecycle operations behave at runtime.
//!
//! Usage:
//!   DESK_BASE_URL=... DESK_CLIENT_ID=... DESK_CLIENT_SECRET=... \
//!     cargo run --example resilience_tuning

use desk_api_rust::config::PoolConfig;
use desk_api_rust::{CacheOptions, DeskClient, FailureSignal, RetryPolicy};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    // Tighter retries than the default: 3 attempts, 250ms base, 10s cap,
    // and a predicate that additionally treats 502 from a flaky gateway as
    // non-retryable.
    let policy = RetryPolicy::new(3, Duration::from_millis(250), Duration::from_secs(10))
        .with_predicate(|signal| match signal {
            FailureSignal::Status(502) => false,
            other => RetryPolicy::default_predicate(other),
        });

    let pool = PoolConfig {
        max_connections: 8,
        ..PoolConfig::from_env()
    };

    let client = DeskClient::builder()
        .retry_policy(policy)
        .pool_config(pool)
        .build()?;

    // Bypass the cache for a freshness-critical read.
    let open = client
        .get_with_options("/tickets", None, CacheOptions::no_cache())
        .await?;
    println!("fresh read: {open}");

    // Recover from stuck idle sockets without restarting the process.
    client.clear_idle_connections()?;
    println!("pool after clear: {:?}", client.pool_stats());

    client.close_pool().await;
    Ok(())
}
