//! Graph retrieval: vector seeding plus bounded one-hop expansion.
//!
//! A query embedding seeds from the vector index, then each seed's strongest
//! outgoing edges pull in structurally related nodes. Output order is
//! deterministic: seeds descending by similarity, then each seed's expansion
//! descending by edge weight, in seed-visit order — never re-sorted globally.

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chunk::ChunkSource;
use crate::error::RetrieveResult;
use crate::graph::{Node, NodeId, NodeStatus, NodeType};
use crate::index::VectorIndex;
use crate::scope::Scope;
use crate::store::GraphStore;

/// Seed-confidence floor. Callers route to fallback behavior below it;
/// the retriever itself always returns what it finds.
pub const CONFIDENCE_FLOOR: f32 = 0.60;

/// The vector index may hold entries for archived nodes; oversampling keeps
/// `top_k` live seeds available after the status filter.
const SEED_OVERSAMPLE: usize = 2;

/// Configuration for one retrieval call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrieveConfig {
    /// Seed nodes from vector search.
    pub top_k: usize,
    /// Graph expansion hops (0 = vector only). Values above 1 are clamped.
    pub hop_limit: usize,
    /// Max neighbours pulled per seed node.
    pub max_neighbours: usize,
    /// Min edge weight to follow.
    pub min_edge_weight: f32,
}

impl Default for RetrieveConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            hop_limit: 1,
            max_neighbours: 3,
            min_edge_weight: 0.75,
        }
    }
}

/// How a retrieved item entered the result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Returned directly by vector similarity search.
    Vector,
    /// Pulled in by following an edge from a seed.
    GraphExpansion,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vector => "vector",
            Self::GraphExpansion => "graph_expansion",
        }
    }
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One retrieved unit of content with its provenance.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedItem {
    pub node_id: NodeId,
    pub node_key: String,
    pub node_type: NodeType,
    pub document_id: Option<Uuid>,
    pub chunk_id: Option<Uuid>,
    pub chunk_index: Option<u32>,
    /// Full chunk text when available; preview/name otherwise.
    pub content: String,
    /// Vector-search similarity. Expansion items carry none.
    pub similarity: Option<f32>,
    pub provenance: Provenance,
}

/// An ordered retrieval result with its confidence signal.
#[derive(Debug, Clone, Serialize)]
pub struct Retrieval {
    pub items: Vec<RetrievedItem>,
    /// Top seed's similarity; 0.0 when nothing seeded.
    pub confidence: f32,
}

impl Retrieval {
    /// Whether the caller should route to low-confidence fallback behavior.
    pub fn is_low_confidence(&self) -> bool {
        self.confidence < CONFIDENCE_FLOOR
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Answers queries against the similarity-linked graph.
pub struct GraphRetriever {
    store: Arc<GraphStore>,
    chunks: Arc<dyn ChunkSource>,
    index: Arc<dyn VectorIndex>,
}

impl GraphRetriever {
    pub fn new(
        store: Arc<GraphStore>,
        chunks: Arc<dyn ChunkSource>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self {
            store,
            chunks,
            index,
        }
    }

    /// Retrieve content for a query embedding.
    ///
    /// Single deterministic pass, no backtracking: seed, expand each seed
    /// once, deduplicate on first occurrence, hydrate chunk text.
    pub fn retrieve(
        &self,
        scope: Scope,
        query_embedding: &[f32],
        config: &RetrieveConfig,
    ) -> RetrieveResult<Retrieval> {
        let hops = config.hop_limit.min(1);
        if config.hop_limit > 1 {
            tracing::debug!(
                requested = config.hop_limit,
                "multi-hop expansion not supported, clamping to 1"
            );
        }

        let seeds = self.seed(scope, query_embedding, config.top_k)?;
        let confidence = seeds.first().map_or(0.0, |(_, sim)| *sim);

        let mut seen: HashSet<NodeId> = HashSet::new();
        let mut items: Vec<RetrievedItem> = Vec::new();

        for (node, similarity) in &seeds {
            if !seen.insert(node.id) {
                continue;
            }
            items.push(self.hydrate(node, Some(*similarity), Provenance::Vector));

            if hops >= 1 {
                for neighbour in self.expand(scope, node.id, config, &seen) {
                    seen.insert(neighbour.id);
                    items.push(self.hydrate(&neighbour, None, Provenance::GraphExpansion));
                }
            }
        }

        tracing::debug!(
            %scope,
            seeds = seeds.len(),
            total = items.len(),
            confidence,
            "retrieval complete"
        );

        Ok(Retrieval { items, confidence })
    }

    /// Vector search filtered to live nodes, descending by similarity.
    fn seed(
        &self,
        scope: Scope,
        query_embedding: &[f32],
        top_k: usize,
    ) -> RetrieveResult<Vec<(Node, f32)>> {
        let hits = self
            .index
            .search(scope, query_embedding, top_k.saturating_mul(SEED_OVERSAMPLE))?;

        let mut seeds = Vec::with_capacity(top_k);
        for hit in hits {
            if seeds.len() == top_k {
                break;
            }
            let Some(node) = self.store.node(hit.node_id) else {
                continue;
            };
            if node.scope == scope && node.status == NodeStatus::Active {
                seeds.push((node, hit.similarity));
            }
        }
        Ok(seeds)
    }

    /// One expansion level from a seed: strongest qualifying outgoing edges,
    /// destinations fetched and re-ordered to match edge-weight order.
    fn expand(
        &self,
        scope: Scope,
        seed: NodeId,
        config: &RetrieveConfig,
        seen: &HashSet<NodeId>,
    ) -> Vec<Node> {
        let edges = self.store.outgoing_edges(
            scope,
            seed,
            config.min_edge_weight,
            config.max_neighbours,
        );
        let wanted: Vec<NodeId> = edges
            .iter()
            .map(|e| e.dst_id)
            .filter(|id| !seen.contains(id))
            .collect();
        if wanted.is_empty() {
            return Vec::new();
        }

        let fetched = self
            .store
            .nodes_by_ids(scope, &wanted, NodeStatus::Active);
        let mut by_id: HashMap<NodeId, Node> =
            fetched.into_iter().map(|n| (n.id, n)).collect();
        // Batch fetch loses edge order; walk the edge list to restore it.
        wanted.iter().filter_map(|id| by_id.remove(id)).collect()
    }

    /// Resolve an item's content: full chunk text when the node stands for a
    /// chunk, falling back preview → name → empty.
    fn hydrate(&self, node: &Node, similarity: Option<f32>, provenance: Provenance) -> RetrievedItem {
        let chunk_id = node.chunk_id();
        let content = chunk_id
            .and_then(|id| match self.chunks.content(node.scope.tenant_id, id) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(chunk_id = %id, error = %e, "chunk content fetch failed");
                    None
                }
            })
            .or_else(|| node.description.clone().filter(|d| !d.is_empty()))
            .unwrap_or_else(|| node.name.clone());

        RetrievedItem {
            node_id: node.id,
            node_key: node.node_key.clone(),
            node_type: node.node_type,
            document_id: node.document_id(),
            chunk_id,
            chunk_index: node.chunk_index(),
            content,
            similarity,
            provenance,
        }
    }
}
