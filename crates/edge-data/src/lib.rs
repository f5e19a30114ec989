//! Upstream data access for the site's edge functions.
//!
//! This crate provides:
//! - `Upstream` - Outbound HTTP capability (`SpinUpstream` on Spin)
//! - `UpstreamRequest` - Conditional `GET` builder
//! - `UpstreamResponse` - Buffered response with status helpers
//! - `ScriptedUpstream` - Replayable upstream (`testing` feature)

mod error;
mod request;
mod response;
#[cfg(target_arch = "wasm32")]
mod spin;
#[cfg(any(test, feature = "testing"))]
mod testing;
mod upstream;

pub use error::*;
pub use request::*;
pub use response::*;
#[cfg(target_arch = "wasm32")]
pub use spin::*;
#[cfg(any(test, feature = "testing"))]
pub use testing::*;
pub use upstream::*;
