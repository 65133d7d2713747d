//! The per-request orchestrator.
//!
//! Drives one request through its state machine:
//!
//! ```text
//! Received → Routed → ContextAssembled → Generating → {Completed | Failed}
//! ```
//!
//! Steps are strictly sequential — no step starts before its predecessor's
//! result is available (the hybrid strategy's two sub-fetches, internal to
//! the ContextAssembled step, are the one sanctioned concurrency). A failure
//! at any step moves the request straight to Failed and emits the
//! corresponding Error event. Routing failures alone are recovered inside
//! the router and never fail a request.
//!
//! Requests are independent: the orchestrator holds no per-request state,
//! and the only cross-request shared data are the read-only document cache
//! and the externally-synchronized context store behind the strategies.

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::executor::ExecutorSet;
use crate::pipeline::{collect, error_event, CancelToken, StreamFailure, StreamPipeline};
use crate::router::QueryRouter;
use crate::session::resolve_session;
use crate::stream_event::StreamEvent;
use waypoint_core::agent::AgentKind;
use waypoint_core::message::{Message, SessionId};

/// One incoming chat request.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// The user's message.
    pub message: String,

    /// Existing session id (omit to mint a new one).
    pub session_id: Option<String>,

    /// Prior conversation history, oldest first. Read-only input.
    pub history: Vec<Message>,
}

/// The synchronous-mode result.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub message: String,
    pub session_id: SessionId,
    pub agent: AgentKind,
}

/// Routes, retrieves, and streams one request at a time, any number of
/// requests concurrently.
pub struct Orchestrator {
    router: QueryRouter,
    executors: ExecutorSet,
}

impl Orchestrator {
    pub fn new(router: QueryRouter, executors: ExecutorSet) -> Self {
        Self { router, executors }
    }

    /// Streaming mode: returns the event receiver for one request.
    ///
    /// The receiver always terminates deterministically — exactly one
    /// `Complete` or `Error` event, or silent closure when the request was
    /// cancelled before a terminal event was due.
    pub async fn chat_stream(
        &self,
        request: ChatRequest,
        cancel: CancelToken,
    ) -> (SessionId, mpsc::Receiver<StreamEvent>) {
        let session_id = resolve_session(request.session_id.as_deref());
        debug!(session = %session_id, "Request received");

        // ── Route ──────────────────────────────────────────────────────────
        let decision = self.router.route(&request.message, &request.history).await;
        debug!(session = %session_id, agent = %decision.agent, "Request routed");

        if cancel.is_cancelled() {
            return (session_id, closed_channel());
        }

        let executor = self.executors.executor(decision.agent);

        // ── Assemble context ───────────────────────────────────────────────
        let context = match executor
            .fetch_context(&request.message, &request.history)
            .await
        {
            Ok(context) => context,
            Err(e) => {
                info!(session = %session_id, error = %e, "Request failed at context assembly");
                return (session_id, single_event(error_event(&e)));
            }
        };
        debug!(
            session = %session_id,
            context_chars = context.text.len(),
            "Context assembled"
        );

        if cancel.is_cancelled() {
            return (session_id, closed_channel());
        }

        // ── Generate ───────────────────────────────────────────────────────
        let provider_rx = match executor
            .respond(&request.message, &request.history, &context)
            .await
        {
            Ok(rx) => rx,
            Err(e) => {
                info!(session = %session_id, error = %e, "Request failed starting generation");
                return (session_id, single_event(error_event(&e)));
            }
        };
        debug!(session = %session_id, "Generating");

        // ── Stream ─────────────────────────────────────────────────────────
        let rx = StreamPipeline::run(provider_rx, session_id.clone(), decision.agent, cancel);
        (session_id, rx)
    }

    /// Synchronous mode: buffer the stream and return the final text.
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatOutcome, StreamFailure> {
        let (_, rx) = self.chat_stream(request, CancelToken::never()).await;
        collect(rx).await
    }
}

/// A channel carrying exactly one already-terminal event.
fn single_event(event: StreamEvent) -> mpsc::Receiver<StreamEvent> {
    let (tx, rx) = mpsc::channel(1);
    // Capacity 1 and a fresh channel: the send cannot fail.
    let _ = tx.try_send(event);
    rx
}

/// A closed, empty channel — silent termination for cancelled requests.
fn closed_channel() -> mpsc::Receiver<StreamEvent> {
    let (_, rx) = mpsc::channel(1);
    rx
}
