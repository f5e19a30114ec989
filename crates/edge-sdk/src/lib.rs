//! Public SDK for the site's edge functions.
//!
//! This crate re-exports all platform functionality:
//!
//! ```ignore
//! use edge_sdk::prelude::*;
//!
//! let guard = OriginGuard::new("https://no-tone.com");
//! let limiter = FixedWindowLimiter::new(RateLimitConfig::default(), InMemoryWindowStore::new());
//! let logger = StructuredLogger::new(RequestId::generate()).with_workload("site-functions");
//! ```

pub use edge_cache;
pub use edge_core;
pub use edge_data;
pub use edge_executor;
pub use edge_observability;
pub use edge_security;
pub use edge_streaming;

/// Prelude for convenient imports.
pub mod prelude {
    pub use edge_cache::*;
    pub use edge_core::*;
    pub use edge_data::*;
    pub use edge_executor::*;
    pub use edge_observability::*;
    pub use edge_security::*;
    pub use edge_streaming::*;
}
