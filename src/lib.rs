//! # desk-api-rust
//!
//! 帮助台平台 REST API 的弹性访问层:连接池、令牌生命周期、带退避的重试、
//! 统一错误分类与读缓存。
//!
//! Resilient access layer for a helpdesk REST API, built for AI-assistant
//! tool-calling runtimes. The client authenticates against the upstream
//! service, pools and reuses transport connections, retries transient
//! failures with exponential backoff plus jitter, waits out rate limits,
//! normalizes every failure into a stable five-kind taxonomy, and caches
//! idempotent reads.
//!
//! ## Key Features
//!
//! - **Typed verbs**: [`DeskClient`] exposes `get`/`post`/`put`/`patch`, a
//!   binary `download`, and a non-throwing `test_connection` probe
//! - **Token lifecycle**: static bearer tokens or OAuth2 client-credentials
//!   with cached, margin-refreshed access tokens via [`auth`]
//! - **Bounded retry**: exponential backoff, 10% jitter and
//!   rate-limit-aware waits via [`client::policy`]
//! - **Stable errors**: every failure surfaces as one of five
//!   [`ErrorKind`]s with machine-usable suggestions
//! - **Read caching**: pluggable store behind [`cache::CacheStore`], keyed
//!   by request shape
//! - **Pool lifecycle**: per-scheme stats, forced idle clearing and graceful
//!   shutdown via [`transport`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use desk_api_rust::DeskClient;
//!
//! #[tokio::main]
//! async fn main() -> desk_api_rust::Result<()> {
//!     let client = DeskClient::builder()
//!         .base_url("https://desk.example.com/api/v1")
//!         .static_token("your-api-token")
//!         .build()?;
//!
//!     let ticket = client.get("/tickets/T-1001", None).await?;
//!     println!("{ticket}");
//!
//!     client.close_pool().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Client facade, builder, retry policy and execution |
//! | [`auth`] | Credential resolution and access-token lifecycle |
//! | [`transport`] | Bounded connection pool with stats and lifecycle ops |
//! | [`cache`] | Read caching over an injected store |
//! | [`config`] | Configuration provider (environment or programmatic) |
//! | [`error`] | Normalized error taxonomy |
//! | [`types`] | Upstream wire types (pagination envelope, token response) |

pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use cache::{CacheStore, MemoryStore, NullStore};
pub use client::{CacheOptions, DeskClient, DeskClientBuilder, FailureSignal, RetryPolicy};
pub use config::{Credential, DeskConfig, PoolConfig};
pub use transport::{PoolStats, SchemeStats, TransportPool};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{ApiError, Error, ErrorKind};
