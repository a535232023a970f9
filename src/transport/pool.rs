//! Connection pool manager.
//!
//! Owns the bounded, reusable transport. Socket pooling itself is delegated to
//! `reqwest` (idle retention, idle timeout, TCP keep-alive); this layer adds
//! the concurrency bound, per-scheme observability, forced idle clearing and
//! graceful shutdown. No retry or backoff logic lives here.

use crate::config::PoolConfig;
use crate::{Error, Result};
use arc_swap::ArcSwapOption;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use url::Url;

/// Short pause after dropping the pool so in-flight teardown can settle.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(200);

/// Transport scheme a request travels over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Plain,
    Encrypted,
}

impl Scheme {
    pub(crate) fn of(url: &Url) -> Self {
        if url.scheme() == "https" {
            Scheme::Encrypted
        } else {
            Scheme::Plain
        }
    }
}

/// Point-in-time view of one scheme's pool.
///
/// `active` and `pending` are exact; `idle` is a best-effort gauge since
/// `reqwest` does not expose its pool internals. Completed leases park a
/// connection in the idle set (up to `max_idle_per_host`), reuse drains it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchemeStats {
    pub active: usize,
    pub idle: usize,
    pub pending: usize,
}

/// Per-scheme pool statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub plain: SchemeStats,
    pub encrypted: SchemeStats,
}

#[derive(Default)]
struct SchemeCounters {
    active: AtomicUsize,
    idle: AtomicUsize,
    pending: AtomicUsize,
}

impl SchemeCounters {
    fn snapshot(&self) -> SchemeStats {
        SchemeStats {
            active: self.active.load(Ordering::Relaxed),
            idle: self.idle.load(Ordering::Relaxed),
            pending: self.pending.load(Ordering::Relaxed),
        }
    }
}

/// Bounded set of reusable transport connections.
///
/// Created at client construction, cleared or shut down explicitly. After
/// [`clear_idle`](TransportPool::clear_idle) the pool is reconstructed with
/// identical configuration and remains usable; after
/// [`shutdown`](TransportPool::shutdown) it is permanently closed.
pub struct TransportPool {
    config: PoolConfig,
    client: ArcSwapOption<reqwest::Client>,
    limiter: Arc<Semaphore>,
    plain: Arc<SchemeCounters>,
    encrypted: Arc<SchemeCounters>,
    closed: AtomicBool,
}

impl TransportPool {
    pub fn new(config: PoolConfig) -> Result<Self> {
        let client = Self::build_client(&config)?;
        Ok(Self {
            limiter: Arc::new(Semaphore::new(config.max_connections)),
            config,
            client: ArcSwapOption::from_pointee(client),
            plain: Arc::new(SchemeCounters::default()),
            encrypted: Arc::new(SchemeCounters::default()),
            closed: AtomicBool::new(false),
        })
    }

    fn build_client(config: &PoolConfig) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(config.request_timeout)
            .pool_max_idle_per_host(config.max_idle_per_host)
            .pool_idle_timeout(Some(config.idle_timeout))
            .tcp_keepalive(Some(config.keep_alive_interval))
            .build()
            .map_err(|e| Error::configuration(format!("failed to build HTTP client: {e}")))
    }

    fn counters(&self, scheme: Scheme) -> &Arc<SchemeCounters> {
        match scheme {
            Scheme::Plain => &self.plain,
            Scheme::Encrypted => &self.encrypted,
        }
    }

    /// Check out transport capacity for one request.
    ///
    /// Waits while the pool is saturated; the wait is visible as `pending`.
    pub(crate) async fn lease(&self, scheme: Scheme) -> Result<PoolLease> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::PoolClosed);
        }
        let counters = Arc::clone(self.counters(scheme));

        counters.pending.fetch_add(1, Ordering::Relaxed);
        let permit = self.limiter.clone().acquire_owned().await;
        counters.pending.fetch_sub(1, Ordering::Relaxed);
        let permit = permit.map_err(|_| Error::PoolClosed)?;

        let client = self.client.load_full().ok_or(Error::PoolClosed)?;

        // A reused connection comes out of the idle set.
        let _ = counters
            .idle
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| v.checked_sub(1));
        counters.active.fetch_add(1, Ordering::Relaxed);

        Ok(PoolLease {
            client,
            counters,
            max_idle: self.config.max_idle_per_host,
            _permit: permit,
        })
    }

    /// Per-scheme view of active, idle and pending work.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            plain: self.plain.snapshot(),
            encrypted: self.encrypted.snapshot(),
        }
    }

    /// Forcibly drop all pooled sockets and reconstruct a fresh transport
    /// with identical configuration.
    ///
    /// In-flight leases keep a handle to the old transport and finish on it;
    /// a connection reset there surfaces as a retryable failure rather than
    /// silent loss.
    pub fn clear_idle(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::PoolClosed);
        }
        let fresh = Self::build_client(&self.config)?;
        self.client.store(Some(Arc::new(fresh)));
        self.plain.idle.store(0, Ordering::Relaxed);
        self.encrypted.idle.store(0, Ordering::Relaxed);
        tracing::debug!("transport pool rebuilt, idle sockets dropped");
        Ok(())
    }

    /// Destroy all sockets and leave the pool unusable. Idempotent.
    pub async fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.client.store(None);
        tokio::time::sleep(SHUTDOWN_GRACE).await;
        self.limiter.close();
        self.plain.idle.store(0, Ordering::Relaxed);
        self.encrypted.idle.store(0, Ordering::Relaxed);
        tracing::debug!("transport pool shut down");
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// RAII checkout of transport capacity for a single request.
pub(crate) struct PoolLease {
    client: Arc<reqwest::Client>,
    counters: Arc<SchemeCounters>,
    max_idle: usize,
    _permit: OwnedSemaphorePermit,
}

impl PoolLease {
    pub(crate) fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Mark the request finished cleanly: its connection is parked for reuse.
    pub(crate) fn complete(self) {
        let max_idle = self.max_idle;
        let _ = self
            .counters
            .idle
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| {
                (v < max_idle).then_some(v + 1)
            });
        // Drop decrements `active`.
    }
}

impl Drop for PoolLease {
    fn drop(&mut self) {
        self.counters.active.fetch_sub(1, Ordering::Relaxed);
    }
}
