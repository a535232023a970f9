//! Token authenticator: credential adoption, token caching, refresh.
//!
//! Owns the only mutable shared state in the crate, the cached
//! [`AccessToken`]. The token moves through `Unauthenticated -> Authenticating
//! -> Authenticated`, and falls back to `Unauthenticated` when a 401 triggers
//! [`TokenAuthenticator::invalidate`]. Concurrent callers racing through a
//! refresh may each perform one exchange; the duplicate work is accepted
//! overhead and the last writer wins with an equally valid token.

use crate::config::{Credential, DeskConfig};
use crate::error::AttemptError;
use crate::transport::{Scheme, TransportPool};
use crate::types::TokenResponse;
use crate::{ApiError, Error, ErrorKind};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::debug;

/// Tokens are refreshed this long before their declared expiry so in-flight
/// requests never race an expiring token.
const EXPIRY_SAFETY_MARGIN: Duration = Duration::from_secs(60);

/// Fixed lifetime assigned to an externally supplied static token.
const STATIC_TOKEN_LIFETIME: Duration = Duration::from_secs(365 * 24 * 60 * 60);

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    fn is_fresh(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Resolves credentials into a usable bearer token and keeps it fresh.
pub struct TokenAuthenticator {
    config: Arc<DeskConfig>,
    token: RwLock<Option<AccessToken>>,
}

impl TokenAuthenticator {
    pub(crate) fn new(config: Arc<DeskConfig>) -> Self {
        Self {
            config,
            token: RwLock::new(None),
        }
    }

    /// Return a currently valid bearer token, refreshing if needed.
    ///
    /// The fast path returns without suspension. The exchange itself is never
    /// retried here; the retry executor wrapping the whole call governs that.
    pub(crate) async fn ensure_token(
        &self,
        pool: &TransportPool,
    ) -> std::result::Result<String, AttemptError> {
        if let Some(token) = self.token.read().unwrap().as_ref() {
            if token.is_fresh() {
                return Ok(token.value.clone());
            }
        }

        match &self.config.credential {
            Credential::StaticToken(value) => {
                let token = AccessToken {
                    value: value.clone(),
                    expires_at: Instant::now() + STATIC_TOKEN_LIFETIME,
                };
                let value = token.value.clone();
                *self.token.write().unwrap() = Some(token);
                Ok(value)
            }
            Credential::ClientCredentials {
                client_id,
                client_secret,
            } => self.exchange(pool, client_id, client_secret).await,
        }
    }

    /// OAuth2 client-credentials exchange against the configured token path.
    async fn exchange(
        &self,
        pool: &TransportPool,
        client_id: &str,
        client_secret: &str,
    ) -> std::result::Result<String, AttemptError> {
        let url = self
            .config
            .endpoint(&self.config.token_path)
            .map_err(AttemptError::Fatal)?;
        let lease = pool
            .lease(Scheme::of(&url))
            .await
            .map_err(AttemptError::Fatal)?;

        let response = lease
            .client()
            .post(url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client_id),
                ("client_secret", client_secret),
            ])
            .send()
            .await
            .map_err(AttemptError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_secs = crate::client::types::retry_after_secs(response.headers());
            let body = response.text().await.unwrap_or_default();
            return Err(AttemptError::Status {
                status: status.as_u16(),
                body,
                retry_after_secs,
            });
        }

        let parsed: TokenResponse = response.json().await.map_err(|e| {
            AttemptError::Fatal(Error::Api(ApiError::new(
                ErrorKind::UpstreamError,
                format!("malformed token response: {e}"),
            )))
        })?;
        lease.complete();

        let lifetime = Duration::from_secs(
            parsed
                .expires_in
                .saturating_sub(EXPIRY_SAFETY_MARGIN.as_secs())
                .max(1),
        );
        debug!(expires_in = parsed.expires_in, "access token refreshed");
        let value = parsed.access_token.clone();
        *self.token.write().unwrap() = Some(AccessToken {
            value: parsed.access_token,
            expires_at: Instant::now() + lifetime,
        });
        Ok(value)
    }

    /// Forget the cached token so the next call re-authenticates.
    ///
    /// Called exclusively from terminal-failure normalization upon a 401.
    pub(crate) fn invalidate(&self) {
        *self.token.write().unwrap() = None;
        debug!("access token invalidated");
    }

    #[cfg(test)]
    pub(crate) fn has_token(&self) -> bool {
        self.token.read().unwrap().is_some()
    }
}
