//! Context retrieval for Waypoint.
//!
//! Three interchangeable strategies build the textual context an agent
//! reasons over:
//!
//! - **Pure retrieval** (`rag`) — per-query similarity search against the
//!   context store. Fully dynamic, nothing cached across calls.
//! - **Pure cache** (`cag`) — the pre-loaded static document set. No network
//!   dependency after load; byte-identical output for a given scope.
//! - **Hybrid** (`hybrid`) — dynamic search plus cached terms under one
//!   budget, dynamic material always kept first.
//!
//! Plus the pieces they stand on: the character-budget assembler (`budget`),
//! the in-process vector store (`store`), and the static document cache
//! (`cache`).

pub mod budget;
pub mod cache;
pub mod cag;
pub mod hybrid;
pub mod rag;
pub mod store;

pub use cache::{CachedDocument, DocumentCache};
pub use cag::PureCache;
pub use hybrid::HybridRetrieval;
pub use rag::PureRetrieval;
pub use store::{StoredChunk, VectorStore};
