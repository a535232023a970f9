//! Wire types for the upstream helpdesk API.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// OAuth2 client-credentials token exchange response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Declared lifetime in seconds.
    pub expires_in: u64,
}

/// A single hypermedia link.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageLink {
    pub href: String,
}

/// Navigation links of a collection page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageLinks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageLink>,
}

/// Paging metadata of a collection page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMeta {
    pub size: u32,
    #[serde(rename = "totalElements")]
    pub total_elements: u64,
    #[serde(rename = "totalPages")]
    pub total_pages: u32,
    pub number: u32,
}

/// The upstream pagination envelope.
///
/// Collections arrive embedded under a resource-specific key, e.g.
/// `{"_embedded": {"tickets": [...]}, "_links": {...}, "page": {...}}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageEnvelope {
    #[serde(rename = "_embedded", default)]
    pub embedded: HashMap<String, Vec<Value>>,
    #[serde(rename = "_links", default)]
    pub links: PageLinks,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<PageMeta>,
}

impl PageEnvelope {
    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }

    /// Items embedded under `key`, or an empty slice.
    pub fn items(&self, key: &str) -> &[Value] {
        self.embedded.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The first embedded collection, for callers that don't know the key.
    pub fn first_collection(&self) -> Option<(&str, &[Value])> {
        self.embedded
            .iter()
            .next()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn has_next(&self) -> bool {
        self.links.next.is_some()
    }
}
