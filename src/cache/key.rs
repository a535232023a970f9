//! Cache key derivation from the request shape.

use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};

/// Key for one cached read: a digest over (verb, path, parameter-set).
///
/// The verb and path ride along in clear for observability; equality and
/// store addressing use only the digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub hash: String,
    pub verb: String,
    pub path: String,
}

impl CacheKey {
    /// Derive the key for a request. Parameter ordering is irrelevant:
    /// params are canonicalized through a sorted map before hashing.
    pub fn for_request(verb: &str, path: &str, params: Option<&HashMap<String, String>>) -> Self {
        let canonical_params: BTreeMap<&str, &str> = params
            .map(|p| p.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect())
            .unwrap_or_default();
        let canonical = format!(
            "{} {} {}",
            verb,
            path,
            serde_json::to_string(&canonical_params).unwrap_or_default()
        );

        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        let hash = hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();

        Self {
            hash,
            verb: verb.to_string(),
            path: path.to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.hash
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.hash)
    }
}
