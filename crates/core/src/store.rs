//! Consumed interfaces for context retrieval.
//!
//! `ContextStore` is the similarity-searchable store of embedded document
//! chunks that Waypoint consumes but does not own. `RetrievalStrategy` is the
//! one capability all three context-building strategies are polymorphic over.

use async_trait::async_trait;

use crate::agent::AgentKind;
use crate::context::{AssembledContext, ContextChunk};
use crate::error::{Error, RetrievalError};
use crate::message::Message;

/// A similarity-searchable store of embedded document chunks, partitioned by
/// agent scope.
///
/// Embedding generation itself is external; the store only exposes it.
#[async_trait]
pub trait ContextStore: Send + Sync {
    /// Embed a query text into the store's vector space.
    async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, RetrievalError>;

    /// Similarity search filtered to one agent scope.
    ///
    /// Returns up to `k` chunks. The store makes no ordering promise — the
    /// calling strategy sorts by score. An empty result from a healthy store
    /// is success, not an error.
    async fn search(
        &self,
        embedding: &[f32],
        scope: AgentKind,
        k: usize,
    ) -> std::result::Result<Vec<ContextChunk>, RetrievalError>;
}

/// One of the three interchangeable context-building strategies.
///
/// Contract: the returned context never exceeds the configured budget, and a
/// failed store call is never passed off as an empty success.
#[async_trait]
pub trait RetrievalStrategy: Send + Sync {
    /// A short name for logs ("rag", "cag", "hybrid").
    fn name(&self) -> &str;

    /// Build the generation context for a query.
    async fn fetch_context(
        &self,
        query: &str,
        history: &[Message],
        scope: AgentKind,
    ) -> Result<AssembledContext, Error>;
}
