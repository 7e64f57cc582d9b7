//! Exact vector index: brute-force cosine scan.
//!
//! Deterministic and trivially idempotent under re-upserts, which makes it
//! the default backend — the supported graph sizes (thousands of nodes per
//! scope) scan in well under a millisecond.

use dashmap::DashMap;

use crate::error::{IndexError, IndexResult};
use crate::graph::NodeId;
use crate::scope::Scope;
use crate::similarity::{EmbeddingDim, cosine_similarity};

use super::{SeedHit, VectorIndex};

/// Linear-scan cosine-similarity index, partitioned by scope.
pub struct ExactVectorIndex {
    dim: EmbeddingDim,
    scopes: DashMap<Scope, DashMap<NodeId, Vec<f32>>>,
}

impl ExactVectorIndex {
    pub fn new(dim: EmbeddingDim) -> Self {
        Self {
            dim,
            scopes: DashMap::new(),
        }
    }

    fn check_dim(&self, len: usize) -> IndexResult<()> {
        if len != self.dim.0 {
            return Err(IndexError::DimensionMismatch {
                expected: self.dim.0,
                actual: len,
            });
        }
        Ok(())
    }
}

impl VectorIndex for ExactVectorIndex {
    fn upsert(&self, scope: Scope, node_id: NodeId, embedding: &[f32]) -> IndexResult<()> {
        self.check_dim(embedding.len())?;
        self.scopes
            .entry(scope)
            .or_default()
            .insert(node_id, embedding.to_vec());
        Ok(())
    }

    fn search(&self, scope: Scope, query: &[f32], top_k: usize) -> IndexResult<Vec<SeedHit>> {
        self.check_dim(query.len())?;
        let Some(vectors) = self.scopes.get(&scope) else {
            return Ok(Vec::new());
        };

        let mut hits: Vec<SeedHit> = vectors
            .iter()
            .map(|entry| SeedHit {
                node_id: *entry.key(),
                similarity: cosine_similarity(query, entry.value()),
            })
            .collect();
        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.node_id.cmp(&b.node_id))
        });
        hits.truncate(top_k);
        Ok(hits)
    }

    fn indexed(&self, scope: Scope) -> usize {
        self.scopes.get(&scope).map_or(0, |vectors| vectors.len())
    }
}

impl std::fmt::Debug for ExactVectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExactVectorIndex")
            .field("dim", &self.dim)
            .field("scopes", &self.scopes.len())
            .finish()
    }
}
