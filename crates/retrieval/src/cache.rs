//! Static document cache — the cache-augmented half of the system.
//!
//! A fixed set of reference documents is read from disk exactly once at
//! process start into an immutable, scope-keyed table. Requests only ever
//! read a loaded snapshot; the snapshot is replaced atomically by an
//! explicit, operator-triggered `reload`. There is no lazy population and no
//! implicit invalidation during request handling.

use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

use crate::budget::{truncate_to, SEPARATOR};
use waypoint_config::CacheConfig;
use waypoint_core::error::{CacheError, Error};

/// Policy passages relevant to booking questions carry one of these terms.
const BOOKING_TERM_KEYWORDS: [&str; 5] =
    ["payment", "cancellation", "refund", "booking", "terms"];

/// One cached reference document.
#[derive(Debug, Clone)]
pub struct CachedDocument {
    pub source_id: String,
    pub text: String,
}

/// An immutable snapshot of everything the cache serves.
struct LoadedSet {
    policy_documents: Vec<CachedDocument>,
    /// Pre-assembled policy context, already within budget.
    policy_context: String,
    /// Booking-relevant policy passages, pre-assembled.
    booking_terms: String,
}

/// The process-wide cached document set.
///
/// Two-phase lifecycle: `load()` runs once at startup (idempotent if
/// repeated) and gates serving; `reload()` swaps in a fresh snapshot on
/// operator request.
pub struct DocumentCache {
    inner: RwLock<Option<Arc<LoadedSet>>>,
}

impl DocumentCache {
    /// Create an unloaded cache. Nothing can be served until `load` succeeds.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(None),
        }
    }

    /// One-time blocking initialization. Calling again after a successful
    /// load is a no-op.
    pub fn load(&self, config: &CacheConfig, budget: usize) -> Result<(), Error> {
        if self.is_loaded() {
            debug!("Document cache already loaded, skipping");
            return Ok(());
        }
        self.reload(config, budget)
    }

    /// Re-read the reference documents and atomically swap the snapshot.
    /// Explicit and operator-triggered — never called implicitly.
    pub fn reload(&self, config: &CacheConfig, budget: usize) -> Result<(), Error> {
        let documents = read_documents(&config.policy_dir)?;

        let policy_context = assemble(documents.iter().map(|d| d.text.as_str()), budget);

        let booking_terms = assemble(
            documents
                .iter()
                .map(|d| d.text.as_str())
                .filter(|text| is_booking_relevant(text)),
            budget,
        );

        info!(
            documents = documents.len(),
            policy_chars = policy_context.len(),
            booking_chars = booking_terms.len(),
            "Document cache loaded"
        );

        let set = Arc::new(LoadedSet {
            policy_documents: documents,
            policy_context,
            booking_terms,
        });

        *self.inner.write().expect("cache lock poisoned") = Some(set);
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.inner.read().expect("cache lock poisoned").is_some()
    }

    /// The full pre-assembled policy context. Byte-identical across calls
    /// within a snapshot's lifetime.
    pub fn policy_context(&self) -> Result<String, CacheError> {
        Ok(self.snapshot()?.policy_context.clone())
    }

    /// Booking-relevant policy passages for the hybrid strategy.
    pub fn booking_terms(&self) -> Result<String, CacheError> {
        Ok(self.snapshot()?.booking_terms.clone())
    }

    /// Number of documents in the loaded policy set.
    pub fn document_count(&self) -> Result<usize, CacheError> {
        Ok(self.snapshot()?.policy_documents.len())
    }

    fn snapshot(&self) -> Result<Arc<LoadedSet>, CacheError> {
        self.inner
            .read()
            .expect("cache lock poisoned")
            .clone()
            .ok_or(CacheError::NotLoaded)
    }
}

impl Default for DocumentCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Read all .txt documents from a directory, in filename order.
fn read_documents(dir: &Path) -> Result<Vec<CachedDocument>, Error> {
    if !dir.exists() {
        warn!(dir = %dir.display(), "Cache directory does not exist, loading empty set");
        return Ok(Vec::new());
    }

    let mut paths: Vec<_> = std::fs::read_dir(dir)
        .map_err(|e| Error::Config {
            message: format!("failed to read cache directory {}: {e}", dir.display()),
        })?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "txt"))
        .collect();

    // Filename order keeps the assembled context deterministic across loads.
    paths.sort();

    let mut documents = Vec::new();
    for path in paths {
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable document");
                continue;
            }
        };

        let source_id = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        documents.push(CachedDocument {
            source_id,
            text: strip_metadata_markers(&raw),
        });
    }

    Ok(documents)
}

/// Remove `#key: value` metadata marker lines left by the ingest tooling.
fn strip_metadata_markers(raw: &str) -> String {
    raw.lines()
        .filter(|line| !is_metadata_marker(line))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn is_metadata_marker(line: &str) -> bool {
    let Some(rest) = line.strip_prefix('#') else {
        return false;
    };
    match rest.split_once(':') {
        Some((key, _)) => {
            !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    }
}

fn is_booking_relevant(text: &str) -> bool {
    let lower = text.to_lowercase();
    BOOKING_TERM_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

fn assemble<'a>(texts: impl Iterator<Item = &'a str>, budget: usize) -> String {
    let joined = texts.collect::<Vec<_>>().join(SEPARATOR);
    truncate_to(&joined, budget).to_string()
}
