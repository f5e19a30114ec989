//! Background task execution.
//!
//! This crate provides:
//! - `BackgroundExecutor` - Fire-and-forget task submission
//! - `DeferredTasks` - Tasks run after the response is delivered (Spin)
//! - `TokioExecutor` - Detached tasks on a tokio runtime (host targets)

mod background;

pub use background::*;
