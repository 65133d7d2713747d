//! Context value objects — what retrieval produces and generation consumes.

use crate::agent::AgentKind;
use serde::{Deserialize, Serialize};

/// A scored chunk of text returned by the context store.
///
/// Ordering by score is a strategy responsibility, not the store's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextChunk {
    /// The chunk text.
    pub text: String,

    /// Source document identifier (filename, URL, ingest id).
    pub source_id: String,

    /// Similarity score — higher means closer to the query.
    pub score: f32,

    /// Which agent scope this chunk belongs to.
    pub scope: AgentKind,
}

/// The assembled textual context for one generation call.
///
/// Contract: `text` never exceeds the configured budget, and when truncation
/// was required the most relevant material was preserved. Created per request
/// and discarded once the response completes.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledContext {
    /// Ordered concatenation of chunk texts and/or cached documents.
    pub text: String,

    /// How many source items made it in (fully or partially).
    pub chunks_included: usize,

    /// Whether anything was cut to satisfy the budget.
    pub truncated: bool,
}

impl AssembledContext {
    /// An empty but valid context — a successful search with no matches.
    pub fn empty() -> Self {
        Self {
            text: String::new(),
            chunks_included: 0,
            truncated: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_context_is_valid() {
        let ctx = AssembledContext::empty();
        assert!(ctx.is_empty());
        assert!(!ctx.truncated);
        assert_eq!(ctx.chunks_included, 0);
    }
}
