//! Platform-controlled response body sink.

use std::fmt::Display;

use edge_core::TimingContext;
use futures::{Sink, SinkExt};

/// Errors from writing a response body.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The body was already written.
    #[error("body already sent")]
    AlreadySent,

    /// The underlying sink rejected the write.
    #[error("stream error: {0}")]
    Stream(String),
}

/// State of the body sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SinkState {
    /// Nothing written yet.
    Initial,
    /// Body written.
    BodySent,
}

/// Writes a buffered body to the outgoing response exactly once.
///
/// Generic over any `Sink<Vec<u8>>`, including Spin's `OutgoingBody`.
/// [`BodySink::finish`] drops the underlying sink, which ends the response
/// body on Spin; work queued for after the response runs after that.
pub struct BodySink<S, E>
where
    S: Sink<Vec<u8>, Error = E> + Unpin,
    E: Display,
{
    inner: S,
    state: SinkState,
    timing: TimingContext,
    bytes_sent: usize,
}

impl<S, E> BodySink<S, E>
where
    S: Sink<Vec<u8>, Error = E> + Unpin,
    E: Display,
{
    /// Create a new body sink.
    pub fn new(sink: S, timing: TimingContext) -> Self {
        Self {
            inner: sink,
            state: SinkState::Initial,
            timing,
            bytes_sent: 0,
        }
    }

    /// Send the complete body. Empty bodies are not written.
    pub async fn send_body(&mut self, body: Vec<u8>) -> Result<(), SinkError> {
        if self.state != SinkState::Initial {
            return Err(SinkError::AlreadySent);
        }
        self.state = SinkState::BodySent;

        if body.is_empty() {
            return Ok(());
        }

        self.timing.mark("body_start");
        let len = body.len();
        self.inner
            .send(body)
            .await
            .map_err(|e| SinkError::Stream(e.to_string()))?;
        self.timing.mark("body_sent");
        self.bytes_sent = len;

        Ok(())
    }

    /// Bytes written so far.
    pub fn bytes_sent(&self) -> usize {
        self.bytes_sent
    }

    /// Get timing context reference.
    pub fn timing(&self) -> &TimingContext {
        &self.timing
    }

    /// End the body and release the underlying sink.
    pub fn finish(self) -> TimingContext {
        let Self {
            inner, mut timing, ..
        } = self;
        drop(inner);
        timing.mark("complete");
        timing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::mpsc;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_body_is_sent_once_then_stream_ends() {
        let (tx, rx) = mpsc::unbounded::<Vec<u8>>();
        let mut sink = BodySink::new(tx, TimingContext::new());

        sink.send_body(b"[]".to_vec()).await.unwrap();
        assert!(matches!(
            sink.send_body(b"x".to_vec()).await,
            Err(SinkError::AlreadySent)
        ));
        assert_eq!(sink.bytes_sent(), 2);

        let timing = sink.finish();
        assert!(timing.mark_offset("complete").is_some());

        let chunks: Vec<Vec<u8>> = rx.collect().await;
        assert_eq!(chunks, vec![b"[]".to_vec()]);
    }

    #[tokio::test]
    async fn test_empty_body_writes_nothing() {
        let (tx, rx) = mpsc::unbounded::<Vec<u8>>();
        let mut sink = BodySink::new(tx, TimingContext::new());
        sink.send_body(Vec::new()).await.unwrap();
        sink.finish();

        let chunks: Vec<Vec<u8>> = rx.collect().await;
        assert!(chunks.is_empty());
    }

    #[tokio::test]
    async fn test_closed_receiver_is_stream_error() {
        let (tx, rx) = mpsc::unbounded::<Vec<u8>>();
        drop(rx);
        let mut sink = BodySink::new(tx, TimingContext::new());
        assert!(matches!(
            sink.send_body(b"[]".to_vec()).await,
            Err(SinkError::Stream(_))
        ));
    }
}
