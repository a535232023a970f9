//! Injected cache store implementations.

use super::key::CacheKey;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// The injected key/value store contract.
///
/// Eviction policy beyond TTL expiry is the store's concern; the crate only
/// requires `get`/`set` semantics with per-entry TTL.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Option<Vec<u8>>;
    async fn set(&self, key: &CacheKey, value: &[u8], ttl: Duration);
    async fn delete(&self, key: &CacheKey) -> bool;
    async fn clear(&self);
    async fn len(&self) -> usize;
    fn name(&self) -> &'static str;
}

struct StoredEntry {
    data: Vec<u8>,
    inserted_at: Instant,
    ttl: Duration,
    last_used: Instant,
}

impl StoredEntry {
    fn new(data: Vec<u8>, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            data,
            inserted_at: now,
            ttl,
            last_used: now,
        }
    }

    fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() > self.ttl
    }
}

/// In-memory store with TTL expiry and least-recently-used eviction.
pub struct MemoryStore {
    entries: RwLock<HashMap<String, StoredEntry>>,
    max_entries: usize,
}

impl MemoryStore {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries: max_entries.max(1),
        }
    }

    fn evict_if_needed(&self, entries: &mut HashMap<String, StoredEntry>) {
        entries.retain(|_, e| !e.is_expired());
        while entries.len() >= self.max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(k) => {
                    entries.remove(&k);
                }
                None => break,
            }
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &CacheKey) -> Option<Vec<u8>> {
        let mut entries = self.entries.write().unwrap();
        if let Some(entry) = entries.get_mut(&key.hash) {
            if entry.is_expired() {
                entries.remove(&key.hash);
                return None;
            }
            entry.last_used = Instant::now();
            return Some(entry.data.clone());
        }
        None
    }

    async fn set(&self, key: &CacheKey, value: &[u8], ttl: Duration) {
        let mut entries = self.entries.write().unwrap();
        self.evict_if_needed(&mut entries);
        entries.insert(key.hash.clone(), StoredEntry::new(value.to_vec(), ttl));
    }

    async fn delete(&self, key: &CacheKey) -> bool {
        self.entries.write().unwrap().remove(&key.hash).is_some()
    }

    async fn clear(&self) {
        self.entries.write().unwrap().clear();
    }

    async fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap()
            .values()
            .filter(|e| !e.is_expired())
            .count()
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// No-op store: every read is a miss, writes are discarded.
pub struct NullStore;

#[async_trait]
impl CacheStore for NullStore {
    async fn get(&self, _: &CacheKey) -> Option<Vec<u8>> {
        None
    }
    async fn set(&self, _: &CacheKey, _: &[u8], _: Duration) {}
    async fn delete(&self, _: &CacheKey) -> bool {
        false
    }
    async fn clear(&self) {}
    async fn len(&self) -> usize {
        0
    }
    fn name(&self) -> &'static str {
        "null"
    }
}
