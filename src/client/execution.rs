//! Request execution: single-attempt dispatch and the retry loop around it.

use crate::client::policy::Decision;
use crate::client::types::{retry_after_secs, RequestTrace, RESOURCE_ID_HEADER, TRACE_HEADER};
use crate::error::AttemptError;
use crate::transport::Scheme;
use crate::{ApiError, Error, ErrorKind, Result};
use bytes::Bytes;
use reqwest::header::ACCEPT;
use reqwest::Method;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{info, warn};

use super::core::DeskClient;

/// Successful response body, already drained from the wire.
pub(crate) enum Payload {
    Json(Value),
    Binary(Bytes),
    /// 204 or an empty body: a valid success with no payload.
    Empty,
}

impl Payload {
    pub(crate) fn into_json(self) -> Value {
        match self {
            Payload::Json(value) => value,
            Payload::Binary(_) | Payload::Empty => Value::Null,
        }
    }

    pub(crate) fn into_bytes(self) -> Bytes {
        match self {
            Payload::Binary(bytes) => bytes,
            Payload::Json(value) => Bytes::from(value.to_string()),
            Payload::Empty => Bytes::new(),
        }
    }
}

pub(crate) struct AttemptSuccess {
    pub status: u16,
    pub payload: Payload,
    pub resource_id: Option<String>,
}

impl DeskClient {
    /// Run one logical call through the retry executor.
    ///
    /// Retries are strictly sequential and respect the computed delay. The
    /// terminal failure is normalized exactly once, then logged with the
    /// call's trace id and elapsed duration.
    pub(crate) async fn execute_with_retry(
        &self,
        method: Method,
        path: &str,
        params: Option<&HashMap<String, String>>,
        body: Option<&Value>,
        binary: bool,
    ) -> Result<AttemptSuccess> {
        let trace = RequestTrace::new();
        let verb = method.as_str().to_string();
        let mut attempt: u32 = 0;

        loop {
            match self
                .execute_once(&method, path, params, body, &trace, binary)
                .await
            {
                Ok(success) => {
                    info!(
                        trace_id = %trace.id,
                        verb = %verb,
                        path = path,
                        http_status = success.status,
                        attempts = attempt + 1,
                        duration_ms = trace.elapsed_ms() as u64,
                        "helpdesk request completed"
                    );
                    return Ok(success);
                }
                Err(error) => match self.policy.decide(&error, attempt) {
                    Decision::Retry { delay } => {
                        warn!(
                            trace_id = %trace.id,
                            verb = %verb,
                            path = path,
                            attempt = attempt + 1,
                            delay_ms = delay.as_millis() as u64,
                            "attempt failed, backing off"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    Decision::Fail => {
                        let attempts = attempt + 1;
                        let normalized =
                            self.normalize_failure(error, &trace, &verb, path, attempts);
                        warn!(
                            trace_id = %trace.id,
                            verb = %verb,
                            path = path,
                            attempts = attempts,
                            duration_ms = trace.elapsed_ms() as u64,
                            error = %normalized,
                            "helpdesk request failed"
                        );
                        return Err(normalized);
                    }
                },
            }
        }
    }

    /// One attempt: ensure a token, lease transport capacity, dispatch,
    /// drain the response. No retry logic here.
    async fn execute_once(
        &self,
        method: &Method,
        path: &str,
        params: Option<&HashMap<String, String>>,
        body: Option<&Value>,
        trace: &RequestTrace,
        binary: bool,
    ) -> std::result::Result<AttemptSuccess, AttemptError> {
        let token = self.auth.ensure_token(&self.transport).await?;
        let url = self.config.endpoint(path).map_err(AttemptError::Fatal)?;
        let lease = self
            .transport
            .lease(Scheme::of(&url))
            .await
            .map_err(AttemptError::Fatal)?;

        let accept = if binary {
            "application/octet-stream"
        } else {
            "application/json"
        };
        let mut request = lease
            .client()
            .request(method.clone(), url)
            .bearer_auth(&token)
            .header(TRACE_HEADER, &trace.id)
            .header(ACCEPT, accept);
        if let Some(params) = params {
            request = request.query(params);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(AttemptError::from_reqwest)?;
        let status = response.status();

        if !status.is_success() {
            let retry_after_secs = retry_after_secs(response.headers());
            let body = response.text().await.unwrap_or_default();
            return Err(AttemptError::Status {
                status: status.as_u16(),
                body,
                retry_after_secs,
            });
        }

        let resource_id = response
            .headers()
            .get(RESOURCE_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let payload = if binary {
            Payload::Binary(response.bytes().await.map_err(AttemptError::from_reqwest)?)
        } else {
            let text = response.text().await.map_err(AttemptError::from_reqwest)?;
            if text.trim().is_empty() {
                Payload::Empty
            } else {
                let value = serde_json::from_str(&text).map_err(|e| {
                    AttemptError::Fatal(Error::Api(ApiError::new(
                        ErrorKind::UpstreamError,
                        format!("malformed response body: {e}"),
                    )))
                })?;
                Payload::Json(value)
            }
        };

        lease.complete();
        Ok(AttemptSuccess {
            status: status.as_u16(),
            payload,
            resource_id,
        })
    }
}
