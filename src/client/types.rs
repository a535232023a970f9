//! Small shared types for the client call path.

use reqwest::header::HeaderMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Correlation header attached to every outbound request.
pub const TRACE_HEADER: &str = "x-desk-request-id";

/// Response header carrying a created resource's identifier.
pub const RESOURCE_ID_HEADER: &str = "resource-id";

/// Per-call tracing metadata. Created at dispatch, consumed by logging on
/// completion; never persisted.
#[derive(Debug, Clone)]
pub(crate) struct RequestTrace {
    pub id: String,
    pub started_at: Instant,
}

impl RequestTrace {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            started_at: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u128 {
        self.started_at.elapsed().as_millis()
    }
}

/// Per-call caching knobs for read requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheOptions {
    /// Skip the cache entirely for this call.
    pub bypass: bool,
    /// Override the path-based default TTL.
    pub ttl: Option<Duration>,
}

impl CacheOptions {
    pub fn no_cache() -> Self {
        Self {
            bypass: true,
            ttl: None,
        }
    }

    pub fn ttl(ttl: Duration) -> Self {
        Self {
            bypass: false,
            ttl: Some(ttl),
        }
    }
}

/// Best-effort parsing of `Retry-After`; only the common seconds form is
/// supported.
pub(crate) fn retry_after_secs(headers: &HeaderMap) -> Option<u64> {
    headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
}
