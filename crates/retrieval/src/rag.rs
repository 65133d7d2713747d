//! Pure retrieval strategy — per-query similarity search.
//!
//! Embeds the query, searches the context store within the agent scope, and
//! assembles the top-k chunks by descending score under the budget. Fully
//! dynamic: nothing is cached across calls.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::budget::fit_chunks;
use waypoint_core::agent::AgentKind;
use waypoint_core::context::AssembledContext;
use waypoint_core::error::{Error, RetrievalError};
use waypoint_core::message::Message;
use waypoint_core::store::{ContextStore, RetrievalStrategy};

/// The retrieval-augmented strategy backing the travel support agent (and
/// the dynamic half of the hybrid strategy).
pub struct PureRetrieval {
    store: Arc<dyn ContextStore>,
    top_k: usize,
    budget: usize,
    timeout: Duration,
}

impl PureRetrieval {
    pub fn new(
        store: Arc<dyn ContextStore>,
        top_k: usize,
        budget: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            top_k,
            budget,
            timeout,
        }
    }

    /// Fetch under a caller-supplied budget (used by the hybrid strategy,
    /// which splits one budget across two sources).
    pub async fn fetch_with_budget(
        &self,
        query: &str,
        scope: AgentKind,
        budget: usize,
    ) -> Result<AssembledContext, Error> {
        // A store failure propagates as RetrievalError — it is never passed
        // off as an empty-but-successful context.
        let lookup = async {
            let embedding = self.store.embed(query).await?;
            self.store.search(&embedding, scope, self.top_k).await
        };
        let mut chunks = tokio::time::timeout(self.timeout, lookup)
            .await
            .map_err(|_| {
                RetrievalError::StoreUnavailable(format!(
                    "store timed out after {}s",
                    self.timeout.as_secs()
                ))
            })??;

        // The store makes no ordering promise; rank here. Stable sort keeps
        // insertion order for score ties.
        chunks.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

        if chunks.is_empty() {
            // A genuinely empty result from a healthy store is valid.
            debug!(scope = %scope, "Search returned no chunks");
            return Ok(AssembledContext::empty());
        }

        let context = fit_chunks(&chunks, budget);
        info!(
            scope = %scope,
            retrieved = chunks.len(),
            included = context.chunks_included,
            truncated = context.truncated,
            "Retrieval context assembled"
        );
        Ok(context)
    }
}

#[async_trait]
impl RetrievalStrategy for PureRetrieval {
    fn name(&self) -> &str {
        "rag"
    }

    async fn fetch_context(
        &self,
        query: &str,
        _history: &[Message],
        scope: AgentKind,
    ) -> Result<AssembledContext, Error> {
        self.fetch_with_budget(query, scope, self.budget).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_core::context::ContextChunk;
    use waypoint_core::error::RetrievalError;

    /// A store that returns canned chunks, or fails when `unavailable`.
    struct ScriptedStore {
        chunks: Vec<ContextChunk>,
        unavailable: bool,
    }

    #[async_trait]
    impl ContextStore for ScriptedStore {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, RetrievalError> {
            if self.unavailable {
                return Err(RetrievalError::StoreUnavailable("connection refused".into()));
            }
            Ok(vec![1.0, 0.0])
        }

        async fn search(
            &self,
            _embedding: &[f32],
            scope: AgentKind,
            k: usize,
        ) -> Result<Vec<ContextChunk>, RetrievalError> {
            if self.unavailable {
                return Err(RetrievalError::StoreUnavailable("connection refused".into()));
            }
            let mut out: Vec<ContextChunk> = self
                .chunks
                .iter()
                .filter(|c| c.scope == scope)
                .cloned()
                .collect();
            out.truncate(k);
            Ok(out)
        }
    }

    fn chunk(text: &str, score: f32) -> ContextChunk {
        ContextChunk {
            text: text.into(),
            source_id: "kb".into(),
            score,
            scope: AgentKind::TravelSupport,
        }
    }

    #[tokio::test]
    async fn orders_chunks_by_descending_score() {
        // Store returns unordered results; the strategy must rank them.
        let strategy = PureRetrieval::new(
            Arc::new(ScriptedStore {
                chunks: vec![chunk("low", 0.2), chunk("high", 0.9), chunk("mid", 0.5)],
                unavailable: false,
            }),
            5,
            1000,
            Duration::from_secs(5),
        );

        let ctx = strategy
            .fetch_context("tips for Tokyo", &[], AgentKind::TravelSupport)
            .await
            .unwrap();

        let high = ctx.text.find("high").unwrap();
        let mid = ctx.text.find("mid").unwrap();
        let low = ctx.text.find("low").unwrap();
        assert!(high < mid && mid < low);
        assert_eq!(ctx.chunks_included, 3);
    }

    #[tokio::test]
    async fn store_failure_is_an_error_not_empty_success() {
        let strategy = PureRetrieval::new(
            Arc::new(ScriptedStore {
                chunks: vec![],
                unavailable: true,
            }),
            5,
            1000,
            Duration::from_secs(5),
        );

        let err = strategy
            .fetch_context("anything", &[], AgentKind::TravelSupport)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Retrieval(_)));
    }

    #[tokio::test]
    async fn empty_search_is_valid_empty_context() {
        let strategy = PureRetrieval::new(
            Arc::new(ScriptedStore {
                chunks: vec![],
                unavailable: false,
            }),
            5,
            1000,
            Duration::from_secs(5),
        );

        let ctx = strategy
            .fetch_context("anything", &[], AgentKind::TravelSupport)
            .await
            .unwrap();
        assert!(ctx.is_empty());
    }

    #[tokio::test]
    async fn truncation_drops_lowest_scored_first() {
        let strategy = PureRetrieval::new(
            Arc::new(ScriptedStore {
                chunks: vec![chunk(&"a".repeat(40), 0.9), chunk(&"b".repeat(40), 0.1)],
                unavailable: false,
            }),
            5,
            40,
            Duration::from_secs(5),
        );

        let ctx = strategy
            .fetch_context("q", &[], AgentKind::TravelSupport)
            .await
            .unwrap();
        assert!(ctx.truncated);
        assert!(ctx.text.contains('a'));
        assert!(!ctx.text.contains('b'));
    }
}
