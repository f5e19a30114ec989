//! Response body delivery.
//!
//! - `BodySink` - Writes a buffered body to the platform's outgoing stream

mod sink;

pub use sink::*;
