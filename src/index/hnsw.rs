//! Approximate vector index backed by HNSW.
//!
//! One HNSW graph per scope. `hnsw_rs` has no in-place update or delete, so
//! a re-upserted node gets a fresh internal ID; search oversamples and
//! deduplicates by node, keeping the best-scoring entry.

use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use anndists::dist::DistCosine;
use dashmap::DashMap;
use hnsw_rs::hnsw::Hnsw;

use crate::error::{IndexError, IndexResult};
use crate::graph::NodeId;
use crate::scope::Scope;
use crate::similarity::EmbeddingDim;

use super::{SeedHit, VectorIndex};

/// HNSW-backed cosine index, partitioned by scope.
pub struct HnswVectorIndex {
    dim: EmbeddingDim,
    max_elements: usize,
    scopes: DashMap<Scope, ScopeIndex>,
}

struct ScopeIndex {
    hnsw: RwLock<Hnsw<'static, f32, DistCosine>>,
    /// Mapping from HNSW internal IDs to node IDs.
    id_to_node: DashMap<usize, NodeId>,
    /// Next HNSW internal ID to assign.
    next_id: AtomicUsize,
}

// Safety: Hnsw uses internal synchronization via atomics/locks.
// The RwLock wrapper provides the outer synchronization needed.
unsafe impl Send for ScopeIndex {}
unsafe impl Sync for ScopeIndex {}

impl ScopeIndex {
    fn new(max_elements: usize) -> Self {
        // HNSW parameters:
        // max_nb_connection: 16 (standard for moderate dimensions)
        // ef_construction: 200 (higher = better recall during build)
        // max_layer: computed from expected elements
        let max_layer = (max_elements as f64).log2().ceil() as usize;
        let max_layer = max_layer.clamp(4, 16);
        let hnsw = Hnsw::new(max_layer, max_elements, 16, 200, DistCosine {});
        Self {
            hnsw: RwLock::new(hnsw),
            id_to_node: DashMap::new(),
            next_id: AtomicUsize::new(0),
        }
    }
}

impl HnswVectorIndex {
    /// Create an HNSW index. `max_elements` is a per-scope capacity hint.
    pub fn new(dim: EmbeddingDim, max_elements: usize) -> Self {
        Self {
            dim,
            max_elements,
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

impl VectorIndex for HnswVectorIndex {
    fn upsert(&self, scope: Scope, node_id: NodeId, embedding: &[f32]) -> IndexResult<()> {
        self.check_dim(embedding.len())?;
        let scope_index = self
            .scopes
            .entry(scope)
            .or_insert_with(|| ScopeIndex::new(self.max_elements));

        let internal_id = scope_index.next_id.fetch_add(1, Ordering::Relaxed);
        let data = embedding.to_vec();
        {
            // insert takes &self; the read guard is the outer synchronization
            let hnsw = scope_index.hnsw.read().map_err(|_| IndexError::Hnsw {
                message: "HNSW lock poisoned".into(),
            })?;
            hnsw.insert((&data, internal_id));
        }
        scope_index.id_to_node.insert(internal_id, node_id);
        Ok(())
    }

    fn search(&self, scope: Scope, query: &[f32], top_k: usize) -> IndexResult<Vec<SeedHit>> {
        self.check_dim(query.len())?;
        let Some(scope_index) = self.scopes.get(&scope) else {
            return Ok(Vec::new());
        };
        if top_k == 0 {
            return Ok(Vec::new());
        }

        // Oversample: stale entries from re-upserted nodes collapse in the
        // dedup below, so ask for more than top_k up front.
        let want = top_k.saturating_mul(2);
        let ef_search = want.max(32);

        let hnsw = scope_index.hnsw.read().map_err(|_| IndexError::Hnsw {
            message: "HNSW lock poisoned".into(),
        })?;
        let neighbours = hnsw.search(query, want, ef_search);
        drop(hnsw);

        let mut best: std::collections::HashMap<NodeId, f32> = std::collections::HashMap::new();
        for n in neighbours {
            let Some(node_id) = scope_index.id_to_node.get(&n.d_id).map(|e| *e.value()) else {
                continue;
            };
            // DistCosine returns 1 - cosine similarity
            let similarity = 1.0 - n.distance;
            let slot = best.entry(node_id).or_insert(f32::NEG_INFINITY);
            if similarity > *slot {
                *slot = similarity;
            }
        }

        let mut hits: Vec<SeedHit> = best
            .into_iter()
            .map(|(node_id, similarity)| SeedHit {
                node_id,
                similarity,
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
        self.scopes
            .get(&scope)
            .map_or(0, |s| s.id_to_node.len())
    }
}

impl std::fmt::Debug for HnswVectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HnswVectorIndex")
            .field("dim", &self.dim)
            .field("scopes", &self.scopes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn test_scope() -> Scope {
        Scope::new(Uuid::new_v4(), Uuid::new_v4())
    }

    fn axis(i: usize) -> Vec<f32> {
        let mut v = vec![0.0; EmbeddingDim::TEST.0];
        v[i] = 1.0;
        v
    }

    #[test]
    fn search_finds_self() {
        let index = HnswVectorIndex::new(EmbeddingDim::TEST, 1000);
        let scope = test_scope();
        let ids: Vec<NodeId> = (0..4).map(|_| NodeId::generate()).collect();
        for (i, id) in ids.iter().enumerate() {
            index.upsert(scope, *id, &axis(i)).unwrap();
        }

        let hits = index.search(scope, &axis(2), 2).unwrap();
        assert!(!hits.is_empty());
        assert_eq!(hits[0].node_id, ids[2]);
        assert!((hits[0].similarity - 1.0).abs() < 1e-3);
    }

    #[test]
    fn reupserted_node_appears_once() {
        let index = HnswVectorIndex::new(EmbeddingDim::TEST, 1000);
        let scope = test_scope();
        let id = NodeId::generate();
        index.upsert(scope, id, &axis(0)).unwrap();
        index.upsert(scope, id, &axis(0)).unwrap();

        let hits = index.search(scope, &axis(0), 5).unwrap();
        let matching: Vec<_> = hits.iter().filter(|h| h.node_id == id).collect();
        assert_eq!(matching.len(), 1);
    }

    #[test]
    fn empty_scope_returns_nothing() {
        let index = HnswVectorIndex::new(EmbeddingDim::TEST, 1000);
        assert!(index.search(test_scope(), &axis(0), 5).unwrap().is_empty());
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let index = HnswVectorIndex::new(EmbeddingDim::TEST, 1000);
        let err = index.search(test_scope(), &[0.5, 0.5], 5).unwrap_err();
        assert!(matches!(err, IndexError::DimensionMismatch { .. }));
    }
}
