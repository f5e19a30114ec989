//! Request security for the site's edge functions.
//!
//! This crate provides:
//! - `OriginGuard` - Same-origin enforcement via `Origin` / `Sec-Fetch-Site`
//! - `RateLimiter` / `FixedWindowLimiter` - Per-client fixed-window limiting
//! - `client_id` - Client identity from proxy headers
//! - `SecurityHeaders` / `ContentSecurityPolicy` - Hardening headers and nonces
//!
//! # Example
//!
//! ```ignore
//! use edge_security::{FixedWindowLimiter, InMemoryWindowStore, OriginGuard, RateLimitConfig};
//!
//! let guard = OriginGuard::new("https://no-tone.com");
//! let limiter = FixedWindowLimiter::new(RateLimitConfig::default(), InMemoryWindowStore::new());
//!
//! let decision = guard.check(Some("https://evil.example"), None);
//! let state = limiter.check("1.2.3.4", now_ms);
//! ```

mod client;
mod headers;
mod origin;
mod rate_limit;

pub use client::*;
pub use headers::*;
pub use origin::*;
pub use rate_limit::*;
