//! Builder for creating clients with custom configuration.
//!
//! Keep this surface area small and predictable: everything not set
//! explicitly falls back to the environment (see [`crate::config`]).

use crate::auth::TokenAuthenticator;
use crate::cache::{CacheConfig, CacheStore, MemoryStore, ReadCache};
use crate::client::core::DeskClient;
use crate::client::policy::RetryPolicy;
use crate::config::{Credential, DeskConfig, PoolConfig, ENV_BASE_URL};
use crate::transport::TransportPool;
use crate::{Error, Result};
use std::sync::Arc;

pub struct DeskClientBuilder {
    base_url: Option<String>,
    static_token: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    token_path: Option<String>,
    pool: Option<PoolConfig>,
    retry: RetryPolicy,
    cache_config: CacheConfig,
    store: Option<Box<dyn CacheStore>>,
}

impl DeskClientBuilder {
    pub fn new() -> Self {
        Self {
            base_url: None,
            static_token: None,
            client_id: None,
            client_secret: None,
            token_path: None,
            pool: None,
            retry: RetryPolicy::default(),
            cache_config: CacheConfig::default(),
            store: None,
        }
    }

    /// Override the upstream base URL (also used by tests against a mock
    /// server).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Use a static bearer token. Wins over client credentials when both
    /// are configured.
    pub fn static_token(mut self, token: impl Into<String>) -> Self {
        self.static_token = Some(token.into());
        self
    }

    /// Use OAuth2 client-credentials.
    pub fn client_credentials(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.client_id = Some(client_id.into());
        self.client_secret = Some(client_secret.into());
        self
    }

    /// Override the token endpoint path.
    pub fn token_path(mut self, path: impl Into<String>) -> Self {
        self.token_path = Some(path.into());
        self
    }

    pub fn pool_config(mut self, pool: PoolConfig) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    pub fn cache_config(mut self, config: CacheConfig) -> Self {
        self.cache_config = config;
        self
    }

    /// Inject the cache store. Defaults to an in-memory store.
    pub fn cache_store(mut self, store: Box<dyn CacheStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn disable_cache(mut self) -> Self {
        self.cache_config.enabled = false;
        self
    }

    /// Build the client. Configuration is read once, here.
    pub fn build(self) -> Result<DeskClient> {
        let credential = if self.static_token.is_some()
            || self.client_id.is_some()
            || self.client_secret.is_some()
        {
            Credential::resolve(self.static_token, self.client_id, self.client_secret)?
        } else {
            Credential::from_env()?
        };

        let base_url = match self.base_url {
            Some(base_url) => base_url,
            None => std::env::var(ENV_BASE_URL)
                .map_err(|_| Error::configuration(format!("{ENV_BASE_URL} is not set")))?,
        };

        let mut config = DeskConfig::new(&base_url, credential)?;
        if let Some(token_path) = self.token_path {
            config.token_path = token_path;
        }
        config.pool = self.pool.unwrap_or_else(PoolConfig::from_env);

        let config = Arc::new(config);
        let transport = Arc::new(TransportPool::new(config.pool.clone())?);
        let auth = Arc::new(TokenAuthenticator::new(Arc::clone(&config)));
        let store = self
            .store
            .unwrap_or_else(|| Box::new(MemoryStore::default()));
        let cache = Arc::new(ReadCache::new(self.cache_config, store));

        Ok(DeskClient {
            config,
            transport,
            auth,
            cache,
            policy: self.retry,
        })
    }
}

impl Default for DeskClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
