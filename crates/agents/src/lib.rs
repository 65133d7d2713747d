//! The Waypoint agent layer — routing, execution, and streaming.
//!
//! A request flows through a strict sequence:
//!
//! 1. **Resolve session** — passthrough or mint a fresh id
//! 2. **Route** — the classifier assigns one of the three agent kinds
//! 3. **Assemble context** — the agent's retrieval strategy builds it
//! 4. **Generate** — the generator streams the answer
//! 5. **Stream** — ordered text increments, exactly one terminal event
//!
//! Failures at any step move the request straight to its terminal Error
//! event; routing failures alone are recovered locally via the configured
//! default agent.

pub mod executor;
pub mod orchestrator;
pub mod pipeline;
pub mod prompts;
pub mod router;
pub mod session;
pub mod stream_event;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use executor::{AgentExecutor, ExecutorSet};
pub use orchestrator::{ChatOutcome, ChatRequest, Orchestrator};
pub use pipeline::{cancel_pair, collect, CancelHandle, CancelToken, StreamPipeline};
pub use router::QueryRouter;
pub use session::resolve_session;
pub use stream_event::StreamEvent;
