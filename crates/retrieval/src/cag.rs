//! Pure cache strategy — the static document set, no retrieval call.
//!
//! The policy agent's context is the pre-assembled cached document text,
//! identical for every query: the query influences only the generation step,
//! never the context. Deterministic, constant-time, and immune to context
//! store outages since it depends only on process-local state.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::cache::DocumentCache;
use waypoint_core::agent::AgentKind;
use waypoint_core::context::AssembledContext;
use waypoint_core::error::Error;
use waypoint_core::message::Message;
use waypoint_core::store::RetrievalStrategy;

/// The cache-augmented strategy backing the policy agent.
pub struct PureCache {
    cache: Arc<DocumentCache>,
}

impl PureCache {
    pub fn new(cache: Arc<DocumentCache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl RetrievalStrategy for PureCache {
    fn name(&self) -> &str {
        "cag"
    }

    async fn fetch_context(
        &self,
        _query: &str,
        _history: &[Message],
        scope: AgentKind,
    ) -> Result<AssembledContext, Error> {
        let text = self.cache.policy_context()?;
        let chunks_included = self.cache.document_count()?;

        debug!(scope = %scope, chars = text.len(), "Serving cached context");

        // Already within budget by construction at load time.
        Ok(AssembledContext {
            text,
            chunks_included,
            truncated: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_config::CacheConfig;
    use waypoint_core::error::CacheError;

    fn loaded_cache(docs: &[(&str, &str)]) -> Arc<DocumentCache> {
        let tmp = tempfile::tempdir().unwrap();
        for (name, content) in docs {
            std::fs::write(tmp.path().join(name), content).unwrap();
        }
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

    #[tokio::test]
    async fn identical_context_regardless_of_query() {
        let strategy = PureCache::new(loaded_cache(&[(
            "cancellation.txt",
            "Full refund up to 48 hours before departure.",
        )]));

        let a = strategy
            .fetch_context("What is your cancellation policy?", &[], AgentKind::Policy)
            .await
            .unwrap();
        let b = strategy
            .fetch_context("completely different question", &[], AgentKind::Policy)
            .await
            .unwrap();

        assert_eq!(a.text.as_bytes(), b.text.as_bytes());
        assert!(a.text.contains("48 hours"));
        assert!(!a.truncated);
    }

    #[tokio::test]
    async fn unloaded_cache_is_fatal() {
        let strategy = PureCache::new(Arc::new(DocumentCache::new()));
        let err = strategy
            .fetch_context("q", &[], AgentKind::Policy)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Cache(CacheError::NotLoaded)));
    }
}
