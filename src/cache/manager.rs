//! Read cache orchestration: TTL selection and hit/miss accounting.

use super::key::CacheKey;
use super::store::CacheStore;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub default_ttl: Duration,
    pub enabled: bool,
    /// Entries larger than this are not stored.
    pub max_entry_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(60),
            enabled: true,
            max_entry_size: 4 * 1024 * 1024,
        }
    }
}

/// Point-in-time cache counters.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Default)]
struct AtomicStats {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
}

/// TTL orchestration over the injected store.
///
/// Store failures are treated as misses: a malfunctioning cache degrades to
/// extra upstream reads, it never fails a call.
pub struct ReadCache {
    config: CacheConfig,
    store: Box<dyn CacheStore>,
    stats: AtomicStats,
}

impl ReadCache {
    pub fn new(config: CacheConfig, store: Box<dyn CacheStore>) -> Self {
        Self {
            config,
            store,
            stats: AtomicStats::default(),
        }
    }

    pub async fn get(&self, key: &CacheKey) -> Option<Value> {
        if !self.config.enabled {
            return None;
        }
        match self.store.get(key).await {
            Some(data) => match serde_json::from_slice(&data) {
                Ok(value) => {
                    self.stats.hits.fetch_add(1, Ordering::Relaxed);
                    Some(value)
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "dropping undecodable cache entry");
                    self.store.delete(key).await;
                    self.stats.misses.fetch_add(1, Ordering::Relaxed);
                    None
                }
            },
            None => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub async fn set(&self, key: &CacheKey, value: &Value, ttl: Option<Duration>) {
        if !self.config.enabled {
            return;
        }
        let data = match serde_json::to_vec(value) {
            Ok(data) => data,
            Err(e) => {
                warn!(key = %key, error = %e, "failed to encode cache entry");
                return;
            }
        };
        if data.len() > self.config.max_entry_size {
            return;
        }
        self.store
            .set(key, &data, ttl.unwrap_or(self.config.default_ttl))
            .await;
        self.stats.sets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.stats.hits.load(Ordering::Relaxed),
            misses: self.stats.misses.load(Ordering::Relaxed),
            sets: self.stats.sets.load(Ordering::Relaxed),
        }
    }

    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use serde_json::json;

    fn cache() -> ReadCache {
        ReadCache::new(CacheConfig::default(), Box::new(MemoryStore::default()))
    }

    #[tokio::test]
    async fn round_trips_and_counts_hits_and_misses() {
        let cache = cache();
        let key = CacheKey::for_request("GET", "/tickets", None);

        assert!(cache.get(&key).await.is_none());
        cache.set(&key, &json!({"id": "T1"}), None).await;
        assert_eq!(cache.get(&key).await.unwrap(), json!({"id": "T1"}));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.sets, 1);
        assert!(stats.hit_ratio() > 0.49 && stats.hit_ratio() < 0.51);
    }

    #[tokio::test]
    async fn disabled_cache_never_stores() {
        let cache = ReadCache::new(
            CacheConfig {
                enabled: false,
                ..Default::default()
            },
            Box::new(MemoryStore::default()),
        );
        let key = CacheKey::for_request("GET", "/tickets", None);
        cache.set(&key, &json!(1), None).await;
        assert!(cache.get(&key).await.is_none());
        assert_eq!(cache.stats().sets, 0);
    }
}
