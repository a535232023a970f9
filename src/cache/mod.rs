//! 读缓存模块：对幂等读请求的响应做带 TTL 的缓存。
//!
//! # Read Caching
//!
//! Successful read responses are cached keyed by (verb, path, parameter-set)
//! so repeated identical reads return without any network activity. Mutating
//! verbs never touch this module. The storage itself is an injected
//! collaborator behind [`CacheStore`]; only TTL orchestration and hit/miss
//! accounting live here.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`ReadCache`] | TTL orchestration and statistics over an injected store |
//! | [`CacheStore`] | Trait for the injected key/value store |
//! | [`MemoryStore`] | In-memory store with TTL expiry and LRU eviction |
//! | [`NullStore`] | No-op store for disabling caching |
//! | [`CacheKey`] | Key derivation from the request shape |

mod key;
mod manager;
mod store;

pub use key::CacheKey;
pub use manager::{CacheConfig, CacheStats, ReadCache};
pub use store::{CacheStore, MemoryStore, NullStore};
