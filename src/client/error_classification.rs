//! Error normalizer: total mapping from transport outcomes to [`ApiError`].
//!
//! Runs exactly once per terminal failure, after the retry budget is spent,
//! never per attempt. The one side effect lives here: a 401 invalidates the
//! cached access token so the next call re-authenticates.

use crate::client::types::RequestTrace;
use crate::error::AttemptError;
use crate::{ApiError, Error, ErrorKind};
use serde_json::Value;

use super::core::DeskClient;

/// Upstream bodies are folded into error details at most this long.
const BODY_EXCERPT_LIMIT: usize = 512;

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.len() <= BODY_EXCERPT_LIMIT {
        trimmed.to_string()
    } else {
        let mut cut = BODY_EXCERPT_LIMIT;
        while !trimmed.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}...", &trimmed[..cut])
    }
}

/// Pull upstream validation detail out of a 422 body, when present.
fn validation_detail(body: &str) -> Option<Value> {
    let json: Value = serde_json::from_str(body).ok()?;
    json.get("errors")
        .or_else(|| json.get("message"))
        .cloned()
        .filter(|v| !v.is_null())
}

/// Map a non-success status to a normalized error, without call-site context.
pub(crate) fn classify_status(
    status: u16,
    body: &str,
    retry_after_secs: Option<u64>,
    attempts: u32,
) -> ApiError {
    let kind = ErrorKind::from_status(status);
    let error = match kind {
        ErrorKind::Unauthorized if status == 401 => {
            ApiError::new(kind, "upstream rejected the credentials (HTTP 401)")
        }
        ErrorKind::Unauthorized => {
            ApiError::new(kind, "access to the resource is forbidden (HTTP 403)")
        }
        ErrorKind::NotFound => ApiError::new(kind, "resource not found (HTTP 404)"),
        ErrorKind::RateLimit => {
            let mut error = ApiError::new(kind, "upstream rate limit hit (HTTP 429)");
            if let Some(secs) = retry_after_secs {
                error = error.with_retry_after(secs);
            }
            error
        }
        ErrorKind::InvalidInput if status == 422 => {
            let mut error = ApiError::new(kind, "upstream rejected the payload (HTTP 422)");
            if let Some(detail) = validation_detail(body) {
                error = error.with_detail("validation", detail);
            } else if !body.trim().is_empty() {
                error = error.with_detail("body", Value::String(excerpt(body)));
            }
            error
        }
        ErrorKind::InvalidInput => ApiError::new(kind, format!("upstream rejected the request (HTTP {status})"))
            .with_detail("body", Value::String(excerpt(body))),
        ErrorKind::UpstreamError => {
            let mut error = ApiError::new(kind, format!("upstream error (HTTP {status})"))
                .with_detail("attempts", Value::from(attempts));
            if !body.trim().is_empty() {
                error = error.with_detail("body", Value::String(excerpt(body)));
            }
            error
        }
    };
    error.with_detail("status", Value::from(status))
}

impl DeskClient {
    /// Normalize a terminal attempt failure into the crate error surface.
    pub(crate) fn normalize_failure(
        &self,
        error: AttemptError,
        trace: &RequestTrace,
        verb: &str,
        path: &str,
        attempts: u32,
    ) -> Error {
        if error.status() == Some(401) {
            self.auth.invalidate();
        }

        let api_error = match error {
            AttemptError::Fatal(Error::Api(inner)) if inner.trace_id.is_empty() => inner,
            AttemptError::Fatal(other) => return other,
            AttemptError::Timeout { message } => ApiError::new(
                ErrorKind::UpstreamError,
                format!("request timed out after {attempts} attempt(s)"),
            )
            .with_detail("attempts", Value::from(attempts))
            .with_detail("source", Value::String(message)),
            AttemptError::Network { message } => ApiError::new(
                ErrorKind::UpstreamError,
                format!("no response from upstream after {attempts} attempt(s)"),
            )
            .with_detail("attempts", Value::from(attempts))
            .with_detail("source", Value::String(message)),
            AttemptError::Status {
                status,
                body,
                retry_after_secs,
            } => classify_status(status, &body, retry_after_secs, attempts),
        };

        Error::Api(api_error.with_call_site(trace.id.clone(), verb, path))
    }
}
