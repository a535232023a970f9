//! API client facade: typed verbs composing cache, retry, auth and transport.

use crate::auth::TokenAuthenticator;
use crate::cache::{CacheKey, CacheStats, ReadCache};
use crate::client::builder::DeskClientBuilder;
use crate::client::policy::RetryPolicy;
use crate::client::types::CacheOptions;
use crate::config::DeskConfig;
use crate::transport::{PoolStats, TransportPool};
use crate::types::PageEnvelope;
use crate::{ApiError, Error, ErrorKind, Result};
use bytes::Bytes;
use once_cell::sync::Lazy;
use reqwest::Method;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Known-stable, cheap resource probed by [`DeskClient::test_connection`].
const PROBE_PATH: &str = "/version";

/// TTL for rarely-changing reference resources.
const REFERENCE_TTL: Duration = Duration::from_secs(600);

/// TTL for everything else readable.
const DEFAULT_READ_TTL: Duration = Duration::from_secs(30);

/// Path prefixes of resources that change rarely enough for the long TTL.
static REFERENCE_PREFIXES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "/version",
        "/operators",
        "/operator-groups",
        "/categories",
        "/subcategories",
        "/priorities",
        "/statuses",
        "/ticket-types",
    ]
});

pub(crate) fn default_ttl_for(path: &str) -> Duration {
    let normalized = format!("/{}", path.trim_start_matches('/'));
    if REFERENCE_PREFIXES
        .iter()
        .any(|prefix| normalized.starts_with(prefix))
    {
        REFERENCE_TTL
    } else {
        DEFAULT_READ_TTL
    }
}

/// Client for the upstream helpdesk REST API.
///
/// All verbs go through the same path: cache check (reads only) ->
/// retry executor -> token authenticator -> pooled transport, with failures
/// normalized into [`ApiError`](crate::ApiError). Construct via
/// [`DeskClient::builder`] or [`DeskClient::from_env`].
pub struct DeskClient {
    pub(crate) config: Arc<DeskConfig>,
    pub(crate) transport: Arc<TransportPool>,
    pub(crate) auth: Arc<TokenAuthenticator>,
    pub(crate) cache: Arc<ReadCache>,
    pub(crate) policy: RetryPolicy,
}

impl DeskClient {
    pub fn builder() -> DeskClientBuilder {
        DeskClientBuilder::new()
    }

    /// Build a client entirely from environment variables.
    pub fn from_env() -> Result<Self> {
        DeskClientBuilder::new().build()
    }

    /// A handle over the same pool, token and cache with a different retry
    /// policy, for calls that need tighter or looser retry behavior.
    pub fn with_retry_policy(&self, policy: RetryPolicy) -> Self {
        Self {
            config: Arc::clone(&self.config),
            transport: Arc::clone(&self.transport),
            auth: Arc::clone(&self.auth),
            cache: Arc::clone(&self.cache),
            policy,
        }
    }

    /// Read a resource, serving repeated identical reads from cache.
    pub async fn get(
        &self,
        path: &str,
        params: Option<&HashMap<String, String>>,
    ) -> Result<Value> {
        self.get_with_options(path, params, CacheOptions::default())
            .await
    }

    /// Read with explicit cache behavior (bypass or TTL override).
    ///
    /// A live cache hit returns without any network activity: no auth, no
    /// retry, no trace.
    pub async fn get_with_options(
        &self,
        path: &str,
        params: Option<&HashMap<String, String>>,
        options: CacheOptions,
    ) -> Result<Value> {
        let use_cache = !options.bypass && self.cache.is_enabled();
        let key = CacheKey::for_request("GET", path, params);

        if use_cache {
            if let Some(hit) = self.cache.get(&key).await {
                debug!(path = path, "read served from cache");
                return Ok(hit);
            }
        }

        let success = self
            .execute_with_retry(Method::GET, path, params, None, false)
            .await?;
        let value = success.payload.into_json();

        if use_cache {
            let ttl = options.ttl.unwrap_or_else(|| default_ttl_for(path));
            self.cache.set(&key, &value, Some(ttl)).await;
        }
        Ok(value)
    }

    /// Read a paginated collection into the upstream envelope shape.
    pub async fn get_page(
        &self,
        path: &str,
        params: Option<&HashMap<String, String>>,
    ) -> Result<PageEnvelope> {
        let value = self.get(path, params).await?;
        PageEnvelope::from_value(&value).ok_or_else(|| {
            Error::Api(ApiError::new(
                ErrorKind::UpstreamError,
                format!("response from {path} is not a collection envelope"),
            ))
        })
    }

    /// Create a resource. Never cached.
    ///
    /// When the upstream omits the new id from the body but declares it in
    /// the `Resource-ID` header, the id is folded into the returned payload.
    pub async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        let success = self
            .execute_with_retry(Method::POST, path, None, Some(body), false)
            .await?;
        let resource_id = success.resource_id.clone();
        let mut value = success.payload.into_json();
        if let Some(id) = resource_id {
            if value.is_null() {
                value = serde_json::json!({ "id": id });
            } else if let Value::Object(map) = &mut value {
                map.entry("id").or_insert_with(|| Value::String(id));
            }
        }
        Ok(value)
    }

    /// Replace a resource. Never cached; a no-content response is a valid
    /// success returning `Value::Null`.
    pub async fn put(&self, path: &str, body: &Value) -> Result<Value> {
        let success = self
            .execute_with_retry(Method::PUT, path, None, Some(body), false)
            .await?;
        Ok(success.payload.into_json())
    }

    /// Partially update a resource. Same contract as [`DeskClient::put`].
    pub async fn patch(&self, path: &str, body: &Value) -> Result<Value> {
        let success = self
            .execute_with_retry(Method::PATCH, path, None, Some(body), false)
            .await?;
        Ok(success.payload.into_json())
    }

    /// Fetch a binary payload (attachment content). Same auth and retry
    /// path as other verbs; never cached.
    pub async fn download(
        &self,
        path: &str,
        params: Option<&HashMap<String, String>>,
    ) -> Result<Bytes> {
        let success = self
            .execute_with_retry(Method::GET, path, params, None, true)
            .await?;
        Ok(success.payload.into_bytes())
    }

    /// Cheap reachability probe. Never errs: any failure is logged and
    /// reported as `false`.
    pub async fn test_connection(&self) -> bool {
        match self
            .get_with_options(PROBE_PATH, None, CacheOptions::no_cache())
            .await
        {
            Ok(_) => true,
            Err(error) => {
                warn!(error = %error, "connection test failed");
                false
            }
        }
    }

    /// Per-scheme transport pool statistics.
    pub fn pool_stats(&self) -> PoolStats {
        self.transport.stats()
    }

    /// Drop all pooled sockets and rebuild the transport in place.
    pub fn clear_idle_connections(&self) -> Result<()> {
        self.transport.clear_idle()
    }

    /// Shut the pool down for good. Idempotent; the client is unusable
    /// afterwards.
    pub async fn close_pool(&self) {
        self.transport.shutdown().await;
    }

    /// Read-cache hit/miss counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
