//! Retry decision engine.
//!
//! Wraps one outbound operation with bounded retry, exponential backoff plus
//! jitter, and rate-limit-aware waits. Deliberately pure: no transport types
//! and no I/O, so backoff and predicate behavior are testable in isolation.

use crate::error::AttemptError;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// Wait applied to a rate-limit response that carries no `Retry-After`.
const RATE_LIMIT_DEFAULT_WAIT: Duration = Duration::from_secs(60);

/// What a custom retry predicate gets to see about a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureSignal {
    /// The per-attempt socket timeout elapsed.
    Timeout,
    /// No response was received at all.
    Network,
    /// Upstream replied with this non-success status.
    Status(u16),
}

type Predicate = Arc<dyn Fn(&FailureSignal) -> bool + Send + Sync>;

/// How to proceed after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decision {
    Retry { delay: Duration },
    Fail,
}

/// Immutable per-client retry policy.
#[derive(Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    predicate: Option<Predicate>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(60),
            predicate: None,
        }
    }
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .field("custom_predicate", &self.predicate.is_some())
            .finish()
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
            predicate: None,
        }
    }

    /// Replace the default transient-failure predicate.
    pub fn with_predicate(
        mut self,
        predicate: impl Fn(&FailureSignal) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    /// Default predicate: retry iff nothing was received, the attempt timed
    /// out client-side, the status is a 5xx, or the status is exactly 429.
    pub fn default_predicate(signal: &FailureSignal) -> bool {
        match signal {
            FailureSignal::Timeout | FailureSignal::Network => true,
            FailureSignal::Status(status) => *status == 429 || (500..=599).contains(status),
        }
    }

    /// Decide what to do after a failed attempt. `attempt` is 0-based.
    pub(crate) fn decide(&self, error: &AttemptError, attempt: u32) -> Decision {
        if attempt + 1 >= self.max_attempts {
            return Decision::Fail;
        }

        let signal = match error {
            AttemptError::Fatal(_) => return Decision::Fail,
            AttemptError::Timeout { .. } => FailureSignal::Timeout,
            AttemptError::Network { .. } => FailureSignal::Network,
            AttemptError::Status { status, .. } => FailureSignal::Status(*status),
        };
        let retryable = match &self.predicate {
            Some(p) => p(&signal),
            None => Self::default_predicate(&signal),
        };
        if !retryable {
            return Decision::Fail;
        }

        let delay = if let AttemptError::Status {
            status: 429,
            retry_after_secs,
            ..
        } = error
        {
            self.rate_limit_delay(*retry_after_secs)
        } else {
            self.backoff_delay(attempt)
        };
        Decision::Retry { delay }
    }

    /// Upstream-declared wait, defaulting when absent, capped at `max_delay`.
    pub(crate) fn rate_limit_delay(&self, retry_after_secs: Option<u64>) -> Duration {
        retry_after_secs
            .map(Duration::from_secs)
            .unwrap_or(RATE_LIMIT_DEFAULT_WAIT)
            .min(self.max_delay)
    }

    /// `base * 2^attempt`, plus jitter of up to 10%, capped at `max_delay`.
    pub(crate) fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay.as_millis() as u64;
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let exponential = base.saturating_mul(factor);
        let jitter_ceiling = exponential / 10;
        let jitter = if jitter_ceiling > 0 {
            rand::thread_rng().gen_range(0..=jitter_ceiling)
        } else {
            0
        };
        Duration::from_millis(exponential.saturating_add(jitter))
            .min(self.max_delay)
    }
}
