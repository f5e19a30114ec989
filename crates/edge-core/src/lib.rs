//! Core abstractions for the site's edge functions.
//!
//! This crate provides the fundamental types and traits:
//! - `WorkloadManifest` / `RouteConfig` - Routes served by a component
//! - `RequestContext` - Typed request parameters
//! - `EdgeResponse` - Buffered handler response
//! - `Clock` - Injectable wall-clock time

mod config;
mod context;
mod lifecycle;
mod response;
mod workload;

pub use config::*;
pub use context::*;
pub use lifecycle::*;
pub use response::*;
pub use workload::*;

pub use http::StatusCode;
