//! Edge cache building blocks.
//!
//! This crate provides:
//! - `EdgeStore` - Key-value store seam (`InMemoryStore`, `SpinKvStore` on Spin)
//! - `Freshness` - TTL classification of a cached entry
//! - `RouteCachePolicy` - Route-level `Cache-Control` configuration
//! - `CacheHeadersBuilder` - Cache and validator response headers
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use edge_cache::{generate_etag, CacheHeadersBuilder, CacheStatus, RouteCachePolicy};
//!
//! let cache_control = RouteCachePolicy::public(Duration::from_secs(300))
//!     .with_shared_ttl(Duration::from_secs(900))
//!     .cache_control_header();
//!
//! let headers = CacheHeadersBuilder::new()
//!     .etag(generate_etag(b"[]"))
//!     .status(CacheStatus::Hit)
//!     .build();
//! ```

mod freshness;
mod headers;
#[cfg(target_arch = "wasm32")]
mod kv;
mod policy;
mod store;

pub use freshness::*;
pub use headers::*;
#[cfg(target_arch = "wasm32")]
pub use kv::*;
pub use policy::*;
pub use store::*;
