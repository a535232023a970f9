use serde_json::{Map, Value};
use thiserror::Error;

/// The five stable failure classes surfaced to callers.
///
/// Every transport outcome maps to exactly one kind; raw `reqwest` errors
/// never cross the crate boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 401 (credentials rejected, token invalidated) or 403 (forbidden).
    Unauthorized,
    /// 404: the addressed resource does not exist.
    NotFound,
    /// 429: upstream asked us to slow down.
    RateLimit,
    /// 422 or any other 4xx: the request itself is wrong.
    InvalidInput,
    /// Timeouts, 5xx, and every other transport failure.
    UpstreamError,
}

impl ErrorKind {
    /// Total mapping from an HTTP status to a failure class.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => ErrorKind::Unauthorized,
            404 => ErrorKind::NotFound,
            429 => ErrorKind::RateLimit,
            400..=499 => ErrorKind::InvalidInput,
            _ => ErrorKind::UpstreamError,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unauthorized => "UNAUTHORIZED",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::RateLimit => "RATE_LIMIT",
            ErrorKind::InvalidInput => "INVALID_INPUT",
            ErrorKind::UpstreamError => "UPSTREAM_ERROR",
        }
    }

    /// Machine-usable hint for an embedding agent deciding whether to retry,
    /// reformulate, or give up.
    pub fn suggestion(&self) -> &'static str {
        match self {
            ErrorKind::Unauthorized => "verify credentials",
            ErrorKind::NotFound => "check the resource identifier",
            ErrorKind::RateLimit => "reduce request frequency",
            ErrorKind::InvalidInput => "correct the request payload",
            ErrorKind::UpstreamError => "try again later",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The only failure shape surfaced for transport outcomes.
///
/// Carries the originating request's trace id, target path and verb so
/// failures stay correlatable with the structured log stream.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
    /// Seconds the upstream asked us to wait, for `RateLimit` failures.
    pub retry_after: Option<u64>,
    /// Structured detail; always contains a `suggestion` entry.
    pub details: Map<String, Value>,
    pub trace_id: String,
    pub path: String,
    pub verb: String,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let mut details = Map::new();
        details.insert("suggestion".into(), Value::String(kind.suggestion().into()));
        Self {
            kind,
            message: message.into(),
            retry_after: None,
            details,
            trace_id: String::new(),
            path: String::new(),
            verb: String::new(),
        }
    }

    pub fn with_retry_after(mut self, secs: u64) -> Self {
        self.retry_after = Some(secs);
        self.details
            .insert("retry_after_secs".into(), Value::from(secs));
        self
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: Value) -> Self {
        self.details.insert(key.into(), value);
        self
    }

    pub(crate) fn with_call_site(
        mut self,
        trace_id: impl Into<String>,
        verb: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        self.trace_id = trace_id.into();
        self.verb = verb.into();
        self.path = path.into();
        self
    }

    pub fn suggestion(&self) -> Option<&str> {
        self.details.get("suggestion").and_then(|v| v.as_str())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {}: {} [trace {}]",
            self.kind, self.verb, self.path, self.message, self.trace_id
        )
    }
}

/// Unified error type for the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A normalized upstream failure (see [`ApiError`]).
    #[error("{0}")]
    Api(ApiError),

    /// Pre-network misconfiguration: missing credentials, bad base URL.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// The connection pool was shut down; the client is no longer usable.
    #[error("connection pool is closed")]
    PoolClosed,
}

impl Error {
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// The failure class, when this is a normalized upstream failure.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Error::Api(e) => Some(e.kind),
            _ => None,
        }
    }

    pub fn api(&self) -> Option<&ApiError> {
        match self {
            Error::Api(e) => Some(e),
            _ => None,
        }
    }
}

/// Transport-level outcome of a single attempt, before normalization.
///
/// The retry policy reads this tagged shape; [`ApiError`] is produced exactly
/// once, at terminal failure.
#[derive(Debug)]
pub(crate) enum AttemptError {
    /// The per-attempt socket timeout elapsed.
    Timeout { message: String },
    /// No response at all: connect, DNS, TLS, or mid-stream reset.
    Network { message: String },
    /// Upstream replied with a non-success status.
    Status {
        status: u16,
        body: String,
        retry_after_secs: Option<u64>,
    },
    /// Non-transport failure; never retried.
    Fatal(Error),
}

impl AttemptError {
    pub(crate) fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AttemptError::Timeout {
                message: e.to_string(),
            }
        } else {
            AttemptError::Network {
                message: e.to_string(),
            }
        }
    }

    pub(crate) fn status(&self) -> Option<u16> {
        match self {
            AttemptError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
