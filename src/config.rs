//! Client configuration: base URL, credential mode, pool tuning knobs.
//!
//! Read once at construction. Environment variables are the default source;
//! everything is overridable through [`DeskClientBuilder`](crate::DeskClientBuilder).

use crate::{Error, Result};
use std::env;
use std::time::Duration;
use url::Url;

/// Environment variable names, new and legacy.
pub const ENV_BASE_URL: &str = "DESK_BASE_URL";
pub const ENV_API_TOKEN: &str = "DESK_API_TOKEN";
pub const ENV_CLIENT_ID: &str = "DESK_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "DESK_CLIENT_SECRET";
pub const ENV_CLIENT_ID_LEGACY: &str = "HELPDESK_APP_ID";
pub const ENV_CLIENT_SECRET_LEGACY: &str = "HELPDESK_APP_SECRET";

/// Exactly one credential mode is active per client.
///
/// A static token wins when both modes are supplied.
#[derive(Debug, Clone)]
pub enum Credential {
    /// Opaque externally supplied bearer token, valid for a long fixed window.
    StaticToken(String),
    /// Client id/secret pair exchanged for a short-lived access token.
    ClientCredentials {
        client_id: String,
        client_secret: String,
    },
}

impl Credential {
    /// Resolve a credential from optional parts, applying the static-token
    /// precedence rule.
    pub fn resolve(
        static_token: Option<String>,
        client_id: Option<String>,
        client_secret: Option<String>,
    ) -> Result<Self> {
        if let Some(token) = static_token.filter(|t| !t.is_empty()) {
            return Ok(Credential::StaticToken(token));
        }
        match (
            client_id.filter(|v| !v.is_empty()),
            client_secret.filter(|v| !v.is_empty()),
        ) {
            (Some(client_id), Some(client_secret)) => Ok(Credential::ClientCredentials {
                client_id,
                client_secret,
            }),
            (None, Some(_)) => Err(Error::configuration(format!(
                "client id is not configured; set {ENV_CLIENT_ID} (legacy: {ENV_CLIENT_ID_LEGACY})"
            ))),
            (Some(_), None) => Err(Error::configuration(format!(
                "client secret is not configured; set {ENV_CLIENT_SECRET} (legacy: {ENV_CLIENT_SECRET_LEGACY})"
            ))),
            (None, None) => Err(Error::configuration(format!(
                "no credentials configured; set {ENV_API_TOKEN}, or {ENV_CLIENT_ID} and {ENV_CLIENT_SECRET} \
                 (legacy: {ENV_CLIENT_ID_LEGACY}/{ENV_CLIENT_SECRET_LEGACY})"
            ))),
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::resolve(
            env::var(ENV_API_TOKEN).ok(),
            env::var(ENV_CLIENT_ID)
                .or_else(|_| env::var(ENV_CLIENT_ID_LEGACY))
                .ok(),
            env::var(ENV_CLIENT_SECRET)
                .or_else(|_| env::var(ENV_CLIENT_SECRET_LEGACY))
                .ok(),
        )
    }
}

/// Tuning knobs for the pooled transport.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Upper bound on concurrent in-flight requests.
    pub max_connections: usize,
    /// Idle sockets retained per host for reuse.
    pub max_idle_per_host: usize,
    /// How long an idle socket is kept before being culled.
    pub idle_timeout: Duration,
    /// TCP keep-alive probe interval.
    pub keep_alive_interval: Duration,
    /// Per-attempt socket timeout; exceeding it is a retryable failure.
    pub request_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 32,
            max_idle_per_host: 8,
            idle_timeout: Duration::from_secs(90),
            keep_alive_interval: Duration::from_secs(30),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl PoolConfig {
    /// Defaults with env overrides, following the usual deployment knobs.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            max_connections: env_usize("DESK_POOL_MAX_CONNECTIONS", d.max_connections).max(1),
            max_idle_per_host: env_usize("DESK_POOL_MAX_IDLE_PER_HOST", d.max_idle_per_host),
            idle_timeout: Duration::from_secs(env_u64(
                "DESK_POOL_IDLE_TIMEOUT_SECS",
                d.idle_timeout.as_secs(),
            )),
            keep_alive_interval: d.keep_alive_interval,
            request_timeout: Duration::from_secs(
                env_u64("DESK_HTTP_TIMEOUT_SECS", d.request_timeout.as_secs()).max(1),
            ),
        }
    }
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(default)
}

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct DeskConfig {
    pub base_url: Url,
    pub credential: Credential,
    /// Path of the OAuth2 client-credentials token endpoint.
    pub token_path: String,
    pub pool: PoolConfig,
}

impl DeskConfig {
    pub const DEFAULT_TOKEN_PATH: &'static str = "/oauth2/token";

    pub fn new(base_url: &str, credential: Credential) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::configuration(format!("invalid base URL {base_url:?}: {e}")))?;
        Ok(Self {
            base_url,
            credential,
            token_path: Self::DEFAULT_TOKEN_PATH.to_string(),
            pool: PoolConfig::default(),
        })
    }

    pub fn from_env() -> Result<Self> {
        let base_url = env::var(ENV_BASE_URL)
            .map_err(|_| Error::configuration(format!("{ENV_BASE_URL} is not set")))?;
        let mut config = Self::new(&base_url, Credential::from_env()?)?;
        config.pool = PoolConfig::from_env();
        Ok(config)
    }

    /// Join a request path onto the base URL, keeping any base path prefix.
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined)
            .map_err(|e| Error::configuration(format!("invalid request path {path:?}: {e}")))
    }
}
