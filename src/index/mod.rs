//! Vector index: top-k cosine-similarity search over node embeddings.
//!
//! The graph core consumes this as a capability — it never recomputes
//! similarity during retrieval. Two backends ship:
//!
//! - [`ExactVectorIndex`] — linear-scan cosine, deterministic, the default
//! - [`HnswVectorIndex`] — approximate nearest-neighbor via `hnsw_rs`, for
//!   graphs too large to scan
//!
//! Indexes are scope-partitioned; a search never crosses tenants. Entries
//! are never removed on archival — retrieval oversamples and filters
//! against live node status instead.

pub mod exact;
pub mod hnsw;

use crate::error::IndexResult;
use crate::graph::NodeId;
use crate::scope::Scope;

pub use exact::ExactVectorIndex;
pub use hnsw::HnswVectorIndex;

/// One hit from a vector search.
#[derive(Debug, Clone)]
pub struct SeedHit {
    /// The matching node.
    pub node_id: NodeId,
    /// Similarity score (0.0 = unrelated, 1.0 = identical).
    pub similarity: f32,
}

/// Capability trait: scoped top-k similarity search over node embeddings.
pub trait VectorIndex: Send + Sync {
    /// Register (or refresh) a node's embedding.
    fn upsert(&self, scope: Scope, node_id: NodeId, embedding: &[f32]) -> IndexResult<()>;

    /// The `top_k` most similar nodes to the query, descending by similarity.
    fn search(&self, scope: Scope, query: &[f32], top_k: usize) -> IndexResult<Vec<SeedHit>>;

    /// Number of nodes indexed in the scope.
    fn indexed(&self, scope: Scope) -> usize;
}
