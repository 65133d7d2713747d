//! Hybrid strategy — dynamic retrieval plus cached terms under one budget.
//!
//! The booking/payments agent needs both query-specific facts (pricing,
//! availability) and static boilerplate (refund and cancellation terms).
//! Dynamic context comes first and is never dropped in favor of the cached
//! portion: when the combined budget is exceeded, the cached tail is
//! truncated. The two sub-fetches are independent reads and run
//! concurrently.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::budget::{truncate_to, SEPARATOR};
use crate::cache::DocumentCache;
use crate::rag::PureRetrieval;
use waypoint_core::agent::AgentKind;
use waypoint_core::context::AssembledContext;
use waypoint_core::error::Error;
use waypoint_core::message::Message;
use waypoint_core::store::RetrievalStrategy;

/// The hybrid strategy backing the booking/payments agent.
pub struct HybridRetrieval {
    dynamic: PureRetrieval,
    cache: Arc<DocumentCache>,
    budget: usize,
}

impl HybridRetrieval {
    pub fn new(dynamic: PureRetrieval, cache: Arc<DocumentCache>, budget: usize) -> Self {
        Self {
            dynamic,
            cache,
            budget,
        }
    }
}

#[async_trait]
impl RetrievalStrategy for HybridRetrieval {
    fn name(&self) -> &str {
        "hybrid"
    }

    async fn fetch_context(
        &self,
        query: &str,
        _history: &[Message],
        scope: AgentKind,
    ) -> Result<AssembledContext, Error> {
        // Independent reads; a failure in either fails the request.
        let cache = self.cache.clone();
        let (dynamic, cached) = tokio::join!(
            self.dynamic.fetch_with_budget(query, scope, self.budget),
            async move { cache.booking_terms() },
        );
        let dynamic = dynamic?;
        let cached = cached?;

        let mut text = dynamic.text;
        let mut chunks_included = dynamic.chunks_included;
        let mut truncated = dynamic.truncated;

        if !cached.is_empty() {
            let sep = if text.is_empty() { "" } else { SEPARATOR };
            let remaining = self.budget.saturating_sub(text.len() + sep.len());

            if remaining > 0 {
                let kept = truncate_to(&cached, remaining);
                text.push_str(sep);
                text.push_str(kept);
                chunks_included += 1;
                if kept.len() < cached.len() {
                    truncated = true;
                }
            } else {
                // No room at all for the cached tail.
                truncated = true;
            }
        }

        info!(
            scope = %scope,
            total_chars = text.len(),
            truncated,
            "Hybrid context assembled"
        );

        Ok(AssembledContext {
            text,
            chunks_included,
            truncated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_config::CacheConfig;
    use waypoint_core::context::ContextChunk;
    use waypoint_core::error::RetrievalError;
    use waypoint_core::store::ContextStore;

    struct ScriptedStore {
        chunks: Vec<ContextChunk>,
        unavailable: bool,
    }

    #[async_trait]
    impl ContextStore for ScriptedStore {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, RetrievalError> {
            if self.unavailable {
                return Err(RetrievalError::StoreUnavailable("down".into()));
            }
            Ok(vec![1.0])
        }

        async fn search(
            &self,
            _embedding: &[f32],
            scope: AgentKind,
            _k: usize,
        ) -> Result<Vec<ContextChunk>, RetrievalError> {
            if self.unavailable {
                return Err(RetrievalError::StoreUnavailable("down".into()));
            }
            Ok(self
                .chunks
                .iter()
                .filter(|c| c.scope == scope)
                .cloned()
                .collect())
        }
    }

    fn booking_chunk(text: &str, score: f32) -> ContextChunk {
        ContextChunk {
            text: text.into(),
            source_id: "pricing".into(),
            score,
            scope: AgentKind::BookingPayments,
        }
    }

    fn loaded_cache(content: &str) -> Arc<DocumentCache> {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("terms.txt"), content).unwrap();
        let cache = Arc::new(DocumentCache::new());
        cache
            .load(
                &CacheConfig {
                    policy_dir: tmp.path().to_path_buf(),
                },
                10_000,
            )
            .unwrap();
        cache
    }

    fn hybrid(chunks: Vec<ContextChunk>, unavailable: bool, cache_text: &str, budget: usize) -> HybridRetrieval {
        let store = Arc::new(ScriptedStore {
            chunks,
            unavailable,
        });
        HybridRetrieval::new(
            PureRetrieval::new(store, 5, budget, std::time::Duration::from_secs(5)),
            loaded_cache(cache_text),
            budget,
        )
    }

    #[tokio::test]
    async fn dynamic_first_then_cached() {
        let strategy = hybrid(
            vec![booking_chunk("Flights to Paris start at $420.", 0.9)],
            false,
            "Refund terms: 48 hours notice required.",
            1000,
        );

        let ctx = strategy
            .fetch_context("How much is a flight to Paris?", &[], AgentKind::BookingPayments)
            .await
            .unwrap();

        let dynamic_pos = ctx.text.find("$420").unwrap();
        let cached_pos = ctx.text.find("Refund terms").unwrap();
        assert!(dynamic_pos < cached_pos);
        assert!(!ctx.truncated);
    }

    #[tokio::test]
    async fn cached_tail_truncated_before_dynamic() {
        let dynamic_text = "d".repeat(80);
        let strategy = hybrid(
            vec![booking_chunk(&dynamic_text, 0.9)],
            false,
            &format!("cancellation {}", "c".repeat(200)),
            120,
        );

        let ctx = strategy
            .fetch_context("price?", &[], AgentKind::BookingPayments)
            .await
            .unwrap();

        // Dynamic portion survives in full; the cached tail absorbed the cut.
        assert!(ctx.text.contains(&dynamic_text));
        assert!(ctx.text.len() <= 120);
        assert!(ctx.truncated);
    }

    #[tokio::test]
    async fn dynamic_alone_over_budget_leaves_no_room_for_cached() {
        let strategy = hybrid(
            vec![booking_chunk(&"d".repeat(500), 0.9)],
            false,
            "cancellation terms",
            100,
        );

        let ctx = strategy
            .fetch_context("price?", &[], AgentKind::BookingPayments)
            .await
            .unwrap();

        assert!(ctx.text.len() <= 100);
        assert!(!ctx.text.contains("cancellation"));
        assert!(ctx.truncated);
    }

    #[tokio::test]
    async fn store_outage_fails_the_whole_fetch() {
        let strategy = hybrid(vec![], true, "cancellation terms", 1000);
        let err = strategy
            .fetch_context("price?", &[], AgentKind::BookingPayments)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Retrieval(_)));
    }

    #[tokio::test]
    async fn empty_dynamic_still_serves_cached_terms() {
        let strategy = hybrid(vec![], false, "Booking terms apply.", 1000);
        let ctx = strategy
            .fetch_context("price?", &[], AgentKind::BookingPayments)
            .await
            .unwrap();
        assert!(ctx.text.contains("Booking terms apply."));
    }
}
