//! Transport layer: pooled, reusable HTTP connections.

mod pool;

pub use pool::{PoolStats, Scheme, SchemeStats, TransportPool};
pub(crate) use pool::PoolLease;
