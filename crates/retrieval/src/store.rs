//! In-process vector store — the consumed `ContextStore` implementation.
//!
//! Holds embedded document chunks partitioned by agent scope and ranks them
//! by cosine similarity. Embedding generation is delegated to a provider;
//! this store never computes embeddings itself. Population belongs to the
//! ingestion pipeline — the store only exposes `insert` and a seed-file
//! loader for pre-embedded chunks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

use waypoint_core::agent::AgentKind;
use waypoint_core::context::ContextChunk;
use waypoint_core::error::{ProviderError, RetrievalError};
use waypoint_core::provider::EmbeddingRequest;
use waypoint_core::store::ContextStore;
use waypoint_core::Provider;

/// One embedded chunk as stored (and as serialized in seed files).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredChunk {
    pub text: String,
    pub source_id: String,
    pub scope: AgentKind,
    pub embedding: Vec<f32>,
}

/// An in-memory similarity-searchable chunk store.
pub struct VectorStore {
    embedder: Arc<dyn Provider>,
    embedding_model: String,
    chunks: RwLock<Vec<StoredChunk>>,
}

impl VectorStore {
    /// Create an empty store backed by the given embedding provider.
    pub fn new(embedder: Arc<dyn Provider>, embedding_model: impl Into<String>) -> Self {
        Self {
            embedder,
            embedding_model: embedding_model.into(),
            chunks: RwLock::new(Vec::new()),
        }
    }

    /// Insert a pre-embedded chunk. Insertion order is the tie-break order
    /// for equal similarity scores.
    pub fn insert(&self, chunk: StoredChunk) {
        self.chunks.write().expect("store lock poisoned").push(chunk);
    }

    /// Load pre-embedded chunks from a JSON seed file (array of StoredChunk).
    pub fn load_seed(&self, path: &Path) -> Result<usize, RetrievalError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            RetrievalError::StoreUnavailable(format!("seed file {}: {e}", path.display()))
        })?;
        let seeded: Vec<StoredChunk> = serde_json::from_str(&raw).map_err(|e| {
            RetrievalError::StoreUnavailable(format!("seed file {}: {e}", path.display()))
        })?;

        let count = seeded.len();
        let mut chunks = self.chunks.write().expect("store lock poisoned");
        chunks.extend(seeded);
        info!(count, path = %path.display(), "Loaded seed chunks into vector store");
        Ok(count)
    }

    /// Number of stored chunks across all scopes.
    pub fn len(&self) -> usize {
        self.chunks.read().expect("store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ContextStore for VectorStore {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        let response = self
            .embedder
            .embed(EmbeddingRequest {
                model: self.embedding_model.clone(),
                inputs: vec![text.to_string()],
            })
            .await
            .map_err(|e| match e {
                ProviderError::Network(msg) | ProviderError::Timeout(msg) => {
                    RetrievalError::StoreUnavailable(msg)
                }
                other => RetrievalError::EmbeddingFailed(other.to_string()),
            })?;

        response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| RetrievalError::EmbeddingFailed("empty embedding response".into()))
    }

    async fn search(
        &self,
        embedding: &[f32],
        scope: AgentKind,
        k: usize,
    ) -> Result<Vec<ContextChunk>, RetrievalError> {
        let chunks = self.chunks.read().expect("store lock poisoned");

        let mut scored: Vec<ContextChunk> = chunks
            .iter()
            .filter(|c| c.scope == scope)
            .map(|c| ContextChunk {
                text: c.text.clone(),
                source_id: c.source_id.clone(),
                score: cosine_similarity(&c.embedding, embedding),
                scope: c.scope,
            })
            .collect();

        // Stable sort: equal scores keep insertion order.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        debug!(scope = %scope, results = scored.len(), "Vector search complete");
        Ok(scored)
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 =
/// opposite. Returns 0.0 if either vector is zero-length or empty.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}
