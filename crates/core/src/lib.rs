//! # Waypoint Core
//!
//! Domain types, traits, and error definitions for the Waypoint query-routing
//! service. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every subsystem is defined as a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod agent;
pub mod context;
pub mod error;
pub mod message;
pub mod provider;
pub mod routing;
pub mod store;

// Re-export key types at crate root for ergonomics
pub use agent::AgentKind;
pub use context::{AssembledContext, ContextChunk};
pub use error::{
    CacheError, ClassificationError, Error, GenerationError, ProviderError, Result,
    RetrievalError,
};
pub use message::{Message, Role, SessionId};
pub use provider::{CompletionRequest, CompletionResponse, Provider, TokenChunk};
pub use routing::RoutingDecision;
pub use store::{ContextStore, RetrievalStrategy};
