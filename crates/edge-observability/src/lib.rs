//! Observability infrastructure for the site's edge functions.
//!
//! This crate provides:
//! - `StructuredLogger` - Structured logging with request context
//! - `LogBuilder` - Fluent structured fields

mod logging;

pub use logging::*;

// Re-export RequestId from edge-core for convenience
pub use edge_core::RequestId;
