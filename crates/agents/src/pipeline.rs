//! Streaming pipeline — provider tokens in, `StreamEvent`s out.
//!
//! Adapts one provider token stream into the framed event sequence delivered
//! to exactly one caller. Guarantees:
//!
//! - Chunks are forwarded in generation order, never reordered or batched
//!   beyond what the provider already coalesced.
//! - Exactly one terminal event (`Complete` or `Error`) per stream; after a
//!   terminal event nothing further is emitted.
//! - Cancellation is cooperative: checked between increments. A cancelled
//!   stream stops consuming the provider, drops the provider connection, and
//!   terminates silently — never with a spurious `Complete`.
//!
//! The non-streaming mode (`collect`) buffers every chunk and resolves to
//! the final text with the same terminal guarantees.

use tokio::sync::{mpsc, watch};
use tracing::{debug, error};

use crate::orchestrator::ChatOutcome;
use crate::stream_event::StreamEvent;
use waypoint_core::agent::AgentKind;
use waypoint_core::error::{Error, GenerationError, ProviderError};
use waypoint_core::message::SessionId;
use waypoint_core::provider::TokenChunk;

/// Cancels an in-flight request. Dropping the handle without calling
/// `cancel()` leaves the request running to completion.
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// The cooperative cancellation signal a pipeline watches.
#[derive(Clone)]
pub struct CancelToken {
    rx: Option<watch::Receiver<bool>>,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// A token that can never fire. Used by callers without a cancel path —
    /// their requests end when the event receiver is dropped instead.
    pub fn never() -> Self {
        Self { rx: None }
    }
}

/// Create a linked cancel handle/token pair.
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx: Some(rx) })
}

/// The streaming pipeline. Stateless — each request gets its own run.
pub struct StreamPipeline;

impl StreamPipeline {
    /// Drive a provider token stream to termination, forwarding events into
    /// the returned channel.
    pub fn run(
        mut provider_rx: mpsc::Receiver<Result<TokenChunk, ProviderError>>,
        session_id: SessionId,
        agent: AgentKind,
        cancel: CancelToken,
    ) -> mpsc::Receiver<StreamEvent> {
        let (tx, rx) = mpsc::channel(64);

        tokio::spawn(async move {
            let (mut cancel_rx, mut cancel_alive) = match cancel.rx {
                Some(rx) => (rx, true),
                // Dummy closed channel; the branch below stays disabled.
                None => (watch::channel(false).1, false),
            };
            let mut full_text = String::new();

            loop {
                let item = tokio::select! {
                    changed = cancel_rx.changed(), if cancel_alive => {
                        match changed {
                            Ok(()) if *cancel_rx.borrow() => {
                                // Caller is gone: stop consuming, release the
                                // provider stream, no terminal event.
                                debug!(session = %session_id, "Stream cancelled by caller");
                                return;
                            }
                            Ok(()) => continue,
                            Err(_) => {
                                // Handle dropped without cancelling.
                                cancel_alive = false;
                                continue;
                            }
                        }
                    }
                    item = provider_rx.recv() => item,
                };

                match item {
                    Some(Ok(chunk)) => {
                        if chunk.done {
                            let _ = tx
                                .send(StreamEvent::Complete {
                                    message: std::mem::take(&mut full_text),
                                    session_id: session_id.clone(),
                                    agent,
                                })
                                .await;
                            return;
                        }
                        if let Some(content) = chunk.content {
                            if content.is_empty() {
                                continue;
                            }
                            full_text.push_str(&content);
                            if tx.send(StreamEvent::Chunk { content }).await.is_err() {
                                // Receiver dropped (client disconnect): stop
                                // consuming the generator.
                                debug!(session = %session_id, "Event receiver dropped, stopping stream");
                                return;
                            }
                        }
                    }
                    Some(Err(e)) => {
                        let err: Error = GenerationError::from(e).into();
                        error!(session = %session_id, error = %err, "Generation failed mid-stream");
                        let _ = tx.send(error_event(&err)).await;
                        return;
                    }
                    None => {
                        // Provider channel closed without a done chunk.
                        let err: Error = GenerationError::from(ProviderError::StreamInterrupted(
                            "provider stream closed unexpectedly".into(),
                        ))
                        .into();
                        error!(session = %session_id, error = %err, "Provider stream ended early");
                        let _ = tx.send(error_event(&err)).await;
                        return;
                    }
                }
            }
        });

        rx
    }
}

/// Build the user-facing error event for a failure.
///
/// The wire message is short and generic; the full error goes to the log,
/// never to the end user.
pub fn error_event(err: &Error) -> StreamEvent {
    let message = match err {
        Error::Retrieval(_) => "We couldn't look up the information needed for your question. Please try again.",
        Error::Cache(_) => "The service is still starting up. Please try again in a moment.",
        Error::Generation(_) => "We couldn't generate a response. Please try again.",
        Error::Cancelled => "The request was cancelled.",
        _ => "Something went wrong handling your request. Please try again.",
    };
    StreamEvent::Error {
        kind: err.kind().to_string(),
        message: message.to_string(),
    }
}

/// A terminal stream failure, as framed on the wire.
#[derive(Debug, Clone)]
pub struct StreamFailure {
    pub kind: String,
    pub message: String,
}

impl std::fmt::Display for StreamFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for StreamFailure {}

/// Non-streaming mode: buffer every chunk and return the final text.
///
/// The chunk concatenation invariant makes this exactly equivalent to
/// consuming the stream; the same single-terminal guarantee applies.
pub async fn collect(mut rx: mpsc::Receiver<StreamEvent>) -> Result<ChatOutcome, StreamFailure> {
    let mut buffered = String::new();

    while let Some(event) = rx.recv().await {
        match event {
            StreamEvent::Chunk { content } => buffered.push_str(&content),
            StreamEvent::Complete {
                message,
                session_id,
                agent,
            } => {
                debug_assert_eq!(buffered, message);
                return Ok(ChatOutcome {
                    message,
                    session_id,
                    agent,
                });
            }
            StreamEvent::Error { kind, message } => {
                return Err(StreamFailure { kind, message });
            }
        }
    }

    // Channel closed without a terminal event — only possible when the
    // producing side was cancelled.
    Err(StreamFailure {
        kind: "cancelled".into(),
        message: "The request was cancelled.".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str) -> Result<TokenChunk, ProviderError> {
        Ok(TokenChunk {
            content: Some(text.into()),
            done: false,
        })
    }

    fn done() -> Result<TokenChunk, ProviderError> {
        Ok(TokenChunk {
            content: None,
            done: true,
        })
    }

    async fn drain(mut rx: mpsc::Receiver<StreamEvent>) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        while let Some(e) = rx.recv().await {
            events.push(e);
        }
        events
    }

    #[tokio::test]
    async fn chunks_concatenate_to_complete_text() {
        let (tx, provider_rx) = mpsc::channel(8);
        for item in [chunk("Tokyo "), chunk("is "), chunk("lovely."), done()] {
            tx.send(item).await.unwrap();
        }
        drop(tx);

        let rx = StreamPipeline::run(
            provider_rx,
            SessionId::from("s1"),
            AgentKind::TravelSupport,
            CancelToken::never(),
        );
        let events = drain(rx).await;

        let concatenated: String = events
            .iter()
            .filter_map(|e| match e {
                StreamEvent::Chunk { content } => Some(content.as_str()),
                _ => None,
            })
            .collect();

        match events.last().unwrap() {
            StreamEvent::Complete {
                message,
                session_id,
                agent,
            } => {
                assert_eq!(message, &concatenated);
                assert_eq!(message, "Tokyo is lovely.");
                assert_eq!(session_id.to_string(), "s1");
                assert_eq!(*agent, AgentKind::TravelSupport);
            }
            other => panic!("expected Complete, got {other:?}"),
        }

        // Exactly one terminal event, and it is last.
        let terminals = events.iter().filter(|e| e.is_terminal()).count();
        assert_eq!(terminals, 1);
    }

    #[tokio::test]
    async fn provider_error_terminates_with_error_event() {
        let (tx, provider_rx) = mpsc::channel(8);
        tx.send(chunk("partial")).await.unwrap();
        tx.send(Err(ProviderError::StreamInterrupted("reset".into())))
            .await
            .unwrap();
        drop(tx);

        let rx = StreamPipeline::run(
            provider_rx,
            SessionId::from("s1"),
            AgentKind::Policy,
            CancelToken::never(),
        );
        let events = drain(rx).await;

        assert_eq!(events.len(), 2);
        match events.last().unwrap() {
            StreamEvent::Error { kind, .. } => assert_eq!(kind, "generation_error"),
            other => panic!("expected Error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn closed_provider_channel_is_an_error_not_a_hang() {
        let (tx, provider_rx) = mpsc::channel::<Result<TokenChunk, ProviderError>>(8);
        drop(tx);

        let rx = StreamPipeline::run(
            provider_rx,
            SessionId::from("s1"),
            AgentKind::Policy,
            CancelToken::never(),
        );
        let events = drain(rx).await;

        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], StreamEvent::Error { .. }));
    }

    #[tokio::test]
    async fn cancellation_emits_no_complete() {
        let (tx, provider_rx) = mpsc::channel(8);
        tx.send(chunk("one ")).await.unwrap();
        tx.send(chunk("two ")).await.unwrap();

        let (handle, token) = cancel_pair();
        let mut rx = StreamPipeline::run(
            provider_rx,
            SessionId::from("s1"),
            AgentKind::TravelSupport,
            token,
        );

        // Consume the two chunks that made it out.
        assert!(matches!(
            rx.recv().await,
            Some(StreamEvent::Chunk { .. })
        ));
        assert!(matches!(
            rx.recv().await,
            Some(StreamEvent::Chunk { .. })
        ));

        handle.cancel();

        // The stream terminates without any terminal event; the provider
        // side observes its channel closing.
        assert!(rx.recv().await.is_none());
        tokio::task::yield_now().await;
        assert!(tx.is_closed());
    }

    #[tokio::test]
    async fn collect_returns_final_text() {
        let (tx, provider_rx) = mpsc::channel(8);
        for item in [chunk("full "), chunk("answer"), done()] {
            tx.send(item).await.unwrap();
        }
        drop(tx);

        let rx = StreamPipeline::run(
            provider_rx,
            SessionId::from("s9"),
            AgentKind::BookingPayments,
            CancelToken::never(),
        );
        let outcome = collect(rx).await.unwrap();
        assert_eq!(outcome.message, "full answer");
        assert_eq!(outcome.agent, AgentKind::BookingPayments);
        assert_eq!(outcome.session_id.to_string(), "s9");
    }

    #[tokio::test]
    async fn collect_surfaces_stream_failure() {
        let (tx, provider_rx) = mpsc::channel(8);
        tx.send(Err(ProviderError::Timeout("too slow".into())))
            .await
            .unwrap();
        drop(tx);

        let rx = StreamPipeline::run(
            provider_rx,
            SessionId::from("s1"),
            AgentKind::Policy,
            CancelToken::never(),
        );
        let failure = collect(rx).await.unwrap_err();
        assert_eq!(failure.kind, "generation_error");
    }
}
