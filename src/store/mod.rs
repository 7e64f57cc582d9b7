//! Graph storage: natural-key upserts over concurrent in-memory indexes
//! with an optional ACID write-through tier.
//!
//! Two layers serve different needs:
//!
//! - [`GraphStore`] / [`chunks::ChunkStore`] — hot indexes in concurrent
//!   hashmaps (DashMap), rebuilt at open time
//! - [`DurableStore`] — the canonical records in ACID transactions (redb)
//!
//! Upserts resolve natural keys through a conflict-key index (the DashMap
//! entry API serializes concurrent upserts of the same key), never by
//! read-then-write at the call site.

pub mod chunks;
pub mod durable;

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::graph::evidence::retain_top;
use crate::graph::{Edge, EdgeId, EdgeUpsert, Evidence, Node, NodeId, NodeStatus, NodeUpsert};
use crate::scope::Scope;

pub use chunks::ChunkStore;
pub use durable::DurableStore;

type NodeKey = (Scope, String);
type EdgeKey = (Scope, NodeId, NodeId, String);

/// The graph store: owns nodes, edges, and evidence rows.
///
/// All queries are scope-local. Mutations are idempotent natural-key
/// upserts; archival is a status flip, and hard deletes happen only through
/// the chunk cascade.
pub struct GraphStore {
    nodes: DashMap<NodeId, Node>,
    node_keys: DashMap<NodeKey, NodeId>,
    edges: DashMap<EdgeId, Edge>,
    edge_keys: DashMap<EdgeKey, EdgeId>,
    out_edges: DashMap<NodeId, Vec<EdgeId>>,
    in_edges: DashMap<NodeId, Vec<EdgeId>>,
    node_evidence: DashMap<NodeId, Vec<Evidence>>,
    edge_evidence: DashMap<EdgeId, Vec<Evidence>>,
    durable: Option<Arc<DurableStore>>,
}

impl GraphStore {
    /// Create a memory-only store (no persistence).
    pub fn memory_only() -> Self {
        Self::empty(None)
    }

    /// Create a store that writes through to the durable tier, loading any
    /// existing records into the hot indexes.
    pub fn with_persistence(durable: Arc<DurableStore>) -> StoreResult<Self> {
        let store = Self::empty(Some(Arc::clone(&durable)));
        for node in durable.load_nodes()? {
            store.index_node(node);
        }
        for edge in durable.load_edges()? {
            store.index_edge(edge);
        }
        for (id, rows) in durable.load_node_evidence()? {
            store.node_evidence.insert(id, rows);
        }
        for (id, rows) in durable.load_edge_evidence()? {
            store.edge_evidence.insert(id, rows);
        }
        tracing::debug!(
            nodes = store.nodes.len(),
            edges = store.edges.len(),
            "graph store loaded from durable tier"
        );
        Ok(store)
    }

    fn empty(durable: Option<Arc<DurableStore>>) -> Self {
        Self {
            nodes: DashMap::new(),
            node_keys: DashMap::new(),
            edges: DashMap::new(),
            edge_keys: DashMap::new(),
            out_edges: DashMap::new(),
            in_edges: DashMap::new(),
            node_evidence: DashMap::new(),
            edge_evidence: DashMap::new(),
            durable,
        }
    }

    fn index_node(&self, node: Node) {
        self.node_keys
            .insert((node.scope, node.node_key.clone()), node.id);
        self.nodes.insert(node.id, node);
    }

    fn index_edge(&self, edge: Edge) {
        self.edge_keys.insert(
            (edge.scope, edge.src_id, edge.dst_id, edge.rel_type.clone()),
            edge.id,
        );
        self.out_edges.entry(edge.src_id).or_default().push(edge.id);
        self.in_edges.entry(edge.dst_id).or_default().push(edge.id);
        self.edges.insert(edge.id, edge);
    }

    // ── Upserts ──────────────────────────────────────────────────────────────

    /// Upsert a node by its natural key `(scope, node_key)`.
    ///
    /// An existing row keeps its surrogate ID and `created_at`, gets every
    /// mutable attribute overwritten (status included — touching an archived
    /// key re-activates it), its `seen_count` bumped, and `last_seen_at`
    /// refreshed. Returns the surrogate ID either way.
    pub fn upsert_node(&self, scope: Scope, upsert: NodeUpsert) -> StoreResult<NodeId> {
        let now = Utc::now();
        let node = match self.node_keys.entry((scope, upsert.node_key.clone())) {
            Entry::Occupied(slot) => {
                let id = *slot.get();
                let mut guard = self.nodes.get_mut(&id).ok_or_else(|| StoreError::NodeNotFound {
                    node_id: id.to_string(),
                })?;
                let node = guard.value_mut();
                node.node_type = upsert.node_type;
                node.name = upsert.name;
                node.description = upsert.description;
                node.properties = upsert.properties;
                node.embedding = upsert.embedding;
                node.status = upsert.status;
                node.seen_count += 1;
                node.last_seen_at = now;
                node.clone()
            }
            Entry::Vacant(slot) => {
                let node = Node {
                    id: NodeId::generate(),
                    scope,
                    node_key: upsert.node_key,
                    node_type: upsert.node_type,
                    name: upsert.name,
                    description: upsert.description,
                    properties: upsert.properties,
                    embedding: upsert.embedding,
                    status: upsert.status,
                    seen_count: 1,
                    created_at: now,
                    last_seen_at: now,
                };
                slot.insert(node.id);
                self.nodes.insert(node.id, node.clone());
                node
            }
        };
        if let Some(durable) = &self.durable {
            durable.put_node(&node)?;
        }
        Ok(node.id)
    }

    /// Upsert an edge by its natural key `(scope, src_id, dst_id, rel_type)`.
    ///
    /// Both endpoints must already exist — node upserts sequence before edge
    /// upserts. An existing row gets weight and properties refreshed and is
    /// re-activated.
    pub fn upsert_edge(&self, scope: Scope, upsert: EdgeUpsert) -> StoreResult<EdgeId> {
        for endpoint in [upsert.src_id, upsert.dst_id] {
            if !self.nodes.contains_key(&endpoint) {
                return Err(StoreError::NodeNotFound {
                    node_id: endpoint.to_string(),
                });
            }
        }

        let now = Utc::now();
        let key = (scope, upsert.src_id, upsert.dst_id, upsert.rel_type.clone());
        let edge = match self.edge_keys.entry(key) {
            Entry::Occupied(slot) => {
                let id = *slot.get();
                let mut guard = self.edges.get_mut(&id).ok_or_else(|| StoreError::EdgeNotFound {
                    edge_id: id.to_string(),
                })?;
                let edge = guard.value_mut();
                edge.weight = upsert.weight;
                edge.properties = upsert.properties;
                edge.is_active = true;
                edge.last_seen_at = now;
                edge.clone()
            }
            Entry::Vacant(slot) => {
                let edge = Edge {
                    id: EdgeId::generate(),
                    scope,
                    src_id: upsert.src_id,
                    dst_id: upsert.dst_id,
                    rel_type: upsert.rel_type,
                    weight: upsert.weight,
                    properties: upsert.properties,
                    is_active: true,
                    created_at: now,
                    last_seen_at: now,
                };
                slot.insert(edge.id);
                self.out_edges.entry(edge.src_id).or_default().push(edge.id);
                self.in_edges.entry(edge.dst_id).or_default().push(edge.id);
                self.edges.insert(edge.id, edge.clone());
                edge
            }
        };
        if let Some(durable) = &self.durable {
            durable.put_edge(&edge)?;
        }
        Ok(edge.id)
    }

    // ── Reads ────────────────────────────────────────────────────────────────

    /// Fetch a node by surrogate ID.
    pub fn node(&self, id: NodeId) -> Option<Node> {
        self.nodes.get(&id).map(|n| n.value().clone())
    }

    /// Fetch a node by natural key.
    pub fn node_by_key(&self, scope: Scope, node_key: &str) -> Option<Node> {
        let id = *self.node_keys.get(&(scope, node_key.to_string()))?;
        self.node(id)
    }

    /// Batch fetch nodes by ID, keeping only those in the scope with the
    /// given status. Output order is unspecified — callers impose their own.
    pub fn nodes_by_ids(&self, scope: Scope, ids: &[NodeId], status: NodeStatus) -> Vec<Node> {
        ids.iter()
            .filter_map(|id| self.node(*id))
            .filter(|n| n.scope == scope && n.status == status)
            .collect()
    }

    /// Outgoing active edges from a node with `weight >= min_weight`, ordered
    /// by weight descending (destination ID breaks ties for determinism),
    /// capped at `limit`.
    pub fn outgoing_edges(
        &self,
        scope: Scope,
        src_id: NodeId,
        min_weight: f32,
        limit: usize,
    ) -> Vec<Edge> {
        let ids = self
            .out_edges
            .get(&src_id)
            .map(|list| list.clone())
            .unwrap_or_default();
        let mut edges: Vec<Edge> = ids
            .iter()
            .filter_map(|id| self.edges.get(id).map(|e| e.value().clone()))
            .filter(|e| e.scope == scope && e.is_active && e.weight >= min_weight)
            .collect();
        edges.sort_by(|a, b| {
            b.weight
                .partial_cmp(&a.weight)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.dst_id.cmp(&b.dst_id))
        });
        edges.truncate(limit);
        edges
    }

    /// Look up one edge by its natural key.
    pub fn edge_between(
        &self,
        scope: Scope,
        src_id: NodeId,
        dst_id: NodeId,
        rel_type: &str,
    ) -> Option<Edge> {
        let id = *self
            .edge_keys
            .get(&(scope, src_id, dst_id, rel_type.to_string()))?;
        self.edges.get(&id).map(|e| e.value().clone())
    }

    /// Snapshot of every node in a scope.
    pub fn nodes_in_scope(&self, scope: Scope) -> Vec<Node> {
        self.nodes
            .iter()
            .filter(|entry| entry.value().scope == scope)
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Snapshot of every edge in a scope.
    pub fn edges_in_scope(&self, scope: Scope) -> Vec<Edge> {
        self.edges
            .iter()
            .filter(|entry| entry.value().scope == scope)
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Every node carrying an embedding, across all scopes. Used to reseed
    /// the vector index at engine start.
    pub fn embedded_nodes(&self) -> Vec<(Scope, NodeId, Vec<f32>)> {
        self.nodes
            .iter()
            .filter_map(|entry| {
                let node = entry.value();
                node.embedding
                    .as_ref()
                    .map(|emb| (node.scope, node.id, emb.clone()))
            })
            .collect()
    }

    /// Total node count across scopes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Total edge count across scopes.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Count of active edges touching a node, as source or destination.
    pub fn active_degree(&self, id: NodeId) -> usize {
        let mut ids: Vec<EdgeId> = self
            .out_edges
            .get(&id)
            .map(|list| list.clone())
            .unwrap_or_default();
        ids.extend(
            self.in_edges
                .get(&id)
                .map(|list| list.clone())
                .unwrap_or_default(),
        );
        ids.iter()
            .filter(|edge_id| {
                self.edges
                    .get(edge_id)
                    .is_some_and(|e| e.value().is_active)
            })
            .count()
    }

    // ── Archival ─────────────────────────────────────────────────────────────

    /// Flip an edge inactive. Returns whether it was active.
    pub fn archive_edge(&self, id: EdgeId) -> StoreResult<bool> {
        let edge = {
            let mut guard = self.edges.get_mut(&id).ok_or_else(|| StoreError::EdgeNotFound {
                edge_id: id.to_string(),
            })?;
            let edge = guard.value_mut();
            if !edge.is_active {
                return Ok(false);
            }
            edge.is_active = false;
            edge.clone()
        };
        if let Some(durable) = &self.durable {
            durable.put_edge(&edge)?;
        }
        Ok(true)
    }

    /// Flip a node to archived. Returns whether it was previously unarchived.
    pub fn archive_node(&self, id: NodeId) -> StoreResult<bool> {
        let node = {
            let mut guard = self.nodes.get_mut(&id).ok_or_else(|| StoreError::NodeNotFound {
                node_id: id.to_string(),
            })?;
            let node = guard.value_mut();
            if node.status == NodeStatus::Archived {
                return Ok(false);
            }
            node.status = NodeStatus::Archived;
            node.clone()
        };
        if let Some(durable) = &self.durable {
            durable.put_node(&node)?;
        }
        Ok(true)
    }

    // ── Evidence ─────────────────────────────────────────────────────────────

    /// Attach an evidence row to a node.
    pub fn add_node_evidence(&self, id: NodeId, evidence: Evidence) -> StoreResult<()> {
        if !self.nodes.contains_key(&id) {
            return Err(StoreError::NodeNotFound {
                node_id: id.to_string(),
            });
        }
        let rows = {
            let mut entry = self.node_evidence.entry(id).or_default();
            entry.push(evidence);
            entry.clone()
        };
        if let Some(durable) = &self.durable {
            durable.put_node_evidence(id, &rows)?;
        }
        Ok(())
    }

    /// Attach an evidence row to an edge.
    pub fn add_edge_evidence(&self, id: EdgeId, evidence: Evidence) -> StoreResult<()> {
        if !self.edges.contains_key(&id) {
            return Err(StoreError::EdgeNotFound {
                edge_id: id.to_string(),
            });
        }
        let rows = {
            let mut entry = self.edge_evidence.entry(id).or_default();
            entry.push(evidence);
            entry.clone()
        };
        if let Some(durable) = &self.durable {
            durable.put_edge_evidence(id, &rows)?;
        }
        Ok(())
    }

    /// Evidence rows for a node.
    pub fn node_evidence(&self, id: NodeId) -> Vec<Evidence> {
        self.node_evidence
            .get(&id)
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }

    /// Evidence rows for an edge.
    pub fn edge_evidence(&self, id: EdgeId) -> Vec<Evidence> {
        self.edge_evidence
            .get(&id)
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }

    /// Trim a node's evidence to the `keep` best rows. Returns rows deleted.
    pub fn trim_node_evidence(&self, id: NodeId, keep: usize) -> StoreResult<usize> {
        let (deleted, rows) = {
            let Some(mut entry) = self.node_evidence.get_mut(&id) else {
                return Ok(0);
            };
            let deleted = retain_top(entry.value_mut(), keep);
            (deleted, entry.clone())
        };
        if deleted > 0 {
            if let Some(durable) = &self.durable {
                durable.put_node_evidence(id, &rows)?;
            }
        }
        Ok(deleted)
    }

    /// Trim an edge's evidence to the `keep` best rows. Returns rows deleted.
    pub fn trim_edge_evidence(&self, id: EdgeId, keep: usize) -> StoreResult<usize> {
        let (deleted, rows) = {
            let Some(mut entry) = self.edge_evidence.get_mut(&id) else {
                return Ok(0);
            };
            let deleted = retain_top(entry.value_mut(), keep);
            (deleted, entry.clone())
        };
        if deleted > 0 {
            if let Some(durable) = &self.durable {
                durable.put_edge_evidence(id, &rows)?;
            }
        }
        Ok(deleted)
    }

    // ── Cascade ──────────────────────────────────────────────────────────────

    /// Hard-delete the nodes standing for the given chunks, plus every edge
    /// touching them and all their evidence. The one path that physically
    /// removes graph rows — driven by chunk/document deletion, never by
    /// maintenance.
    ///
    /// Returns `(nodes_deleted, edges_deleted)`.
    pub fn remove_chunk_nodes(
        &self,
        scope: Scope,
        chunk_ids: &[Uuid],
    ) -> StoreResult<(usize, usize)> {
        let mut nodes_deleted = 0;
        let mut edges_deleted = 0;

        for chunk_id in chunk_ids {
            let key = (scope, format!("chunk:{chunk_id}"));
            let Some((_, node_id)) = self.node_keys.remove(&key) else {
                continue;
            };

            let mut incident: Vec<EdgeId> = Vec::new();
            if let Some((_, list)) = self.out_edges.remove(&node_id) {
                incident.extend(list);
            }
            if let Some((_, list)) = self.in_edges.remove(&node_id) {
                incident.extend(list);
            }

            for edge_id in incident {
                let Some((_, edge)) = self.edges.remove(&edge_id) else {
                    continue;
                };
                self.edge_keys.remove(&(
                    edge.scope,
                    edge.src_id,
                    edge.dst_id,
                    edge.rel_type.clone(),
                ));
                if edge.src_id != node_id {
                    if let Some(mut list) = self.out_edges.get_mut(&edge.src_id) {
                        list.retain(|id| *id != edge_id);
                    }
                }
                if edge.dst_id != node_id {
                    if let Some(mut list) = self.in_edges.get_mut(&edge.dst_id) {
                        list.retain(|id| *id != edge_id);
                    }
                }
                self.edge_evidence.remove(&edge_id);
                if let Some(durable) = &self.durable {
                    durable.remove_edge(edge_id)?;
                    durable.remove_edge_evidence(edge_id)?;
                }
                edges_deleted += 1;
            }

            self.nodes.remove(&node_id);
            self.node_evidence.remove(&node_id);
            if let Some(durable) = &self.durable {
                durable.remove_node(node_id)?;
                durable.remove_node_evidence(node_id)?;
            }
            nodes_deleted += 1;
        }

        Ok((nodes_deleted, edges_deleted))
    }
}

impl std::fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphStore")
            .field("nodes", &self.nodes.len())
            .field("edges", &self.edges.len())
            .field("persistent", &self.durable.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NodeType, REL_RELATED_TO};

    fn test_scope() -> Scope {
        Scope::new(Uuid::new_v4(), Uuid::new_v4())
    }

    fn chunk_upsert(key: &str) -> NodeUpsert {
        NodeUpsert::new(key, NodeType::Chunk, "Chunk").with_embedding(vec![1.0, 0.0])
    }

    #[test]
    fn upsert_node_is_idempotent_by_natural_key() {
        let store = GraphStore::memory_only();
        let scope = test_scope();

        let first = store.upsert_node(scope, chunk_upsert("chunk:a")).unwrap();
        let second = store.upsert_node(scope, chunk_upsert("chunk:a")).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.node_count(), 1);
        let node = store.node(first).unwrap();
        assert_eq!(node.seen_count, 2);
    }

    #[test]
    fn same_key_in_different_scopes_makes_two_nodes() {
        let store = GraphStore::memory_only();
        let a = store.upsert_node(test_scope(), chunk_upsert("chunk:a")).unwrap();
        let b = store.upsert_node(test_scope(), chunk_upsert("chunk:a")).unwrap();
        assert_ne!(a, b);
        assert_eq!(store.node_count(), 2);
    }

    #[test]
    fn upsert_reactivates_archived_node() {
        let store = GraphStore::memory_only();
        let scope = test_scope();
        let id = store.upsert_node(scope, chunk_upsert("chunk:a")).unwrap();

        assert!(store.archive_node(id).unwrap());
        assert_eq!(store.node(id).unwrap().status, NodeStatus::Archived);

        store.upsert_node(scope, chunk_upsert("chunk:a")).unwrap();
        assert_eq!(store.node(id).unwrap().status, NodeStatus::Active);
    }

    #[test]
    fn upsert_edge_requires_endpoints() {
        let store = GraphStore::memory_only();
        let scope = test_scope();
        let src = store.upsert_node(scope, chunk_upsert("chunk:a")).unwrap();

        let err = store
            .upsert_edge(
                scope,
                EdgeUpsert::new(src, NodeId::generate(), REL_RELATED_TO, 0.9),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::NodeNotFound { .. }));
    }

    #[test]
    fn upsert_edge_refreshes_weight_without_duplicating() {
        let store = GraphStore::memory_only();
        let scope = test_scope();
        let src = store.upsert_node(scope, chunk_upsert("chunk:a")).unwrap();
        let dst = store.upsert_node(scope, chunk_upsert("chunk:b")).unwrap();

        let first = store
            .upsert_edge(scope, EdgeUpsert::new(src, dst, REL_RELATED_TO, 0.85))
            .unwrap();
        let second = store
            .upsert_edge(scope, EdgeUpsert::new(src, dst, REL_RELATED_TO, 0.91))
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(store.edge_count(), 1);
        let edge = store.edge_between(scope, src, dst, REL_RELATED_TO).unwrap();
        assert!((edge.weight - 0.91).abs() < 1e-6);
    }

    #[test]
    fn outgoing_edges_filters_and_orders() {
        let store = GraphStore::memory_only();
        let scope = test_scope();
        let src = store.upsert_node(scope, chunk_upsert("chunk:src")).unwrap();
        let mut dsts = Vec::new();
        for (i, weight) in [0.7f32, 0.95, 0.8, 0.9].iter().enumerate() {
            let dst = store
                .upsert_node(scope, chunk_upsert(&format!("chunk:d{i}")))
                .unwrap();
            store
                .upsert_edge(scope, EdgeUpsert::new(src, dst, REL_RELATED_TO, *weight))
                .unwrap();
            dsts.push(dst);
        }

        let edges = store.outgoing_edges(scope, src, 0.75, 10);
        let weights: Vec<f32> = edges.iter().map(|e| e.weight).collect();
        assert_eq!(weights, vec![0.95, 0.9, 0.8]);

        // limit caps the result after ordering
        let capped = store.outgoing_edges(scope, src, 0.0, 2);
        assert_eq!(capped.len(), 2);
        assert!((capped[0].weight - 0.95).abs() < 1e-6);

        // archived edges disappear
        store.archive_edge(edges[0].id).unwrap();
        let remaining = store.outgoing_edges(scope, src, 0.0, 10);
        assert!(remaining.iter().all(|e| (e.weight - 0.95).abs() > 1e-6));
    }

    #[test]
    fn active_degree_counts_both_directions() {
        let store = GraphStore::memory_only();
        let scope = test_scope();
        let hub = store.upsert_node(scope, chunk_upsert("chunk:hub")).unwrap();
        let a = store.upsert_node(scope, chunk_upsert("chunk:a")).unwrap();
        let b = store.upsert_node(scope, chunk_upsert("chunk:b")).unwrap();

        store
            .upsert_edge(scope, EdgeUpsert::new(hub, a, REL_RELATED_TO, 0.9))
            .unwrap();
        store
            .upsert_edge(scope, EdgeUpsert::new(b, hub, REL_RELATED_TO, 0.9))
            .unwrap();
        assert_eq!(store.active_degree(hub), 2);

        let edge = store.edge_between(scope, hub, a, REL_RELATED_TO).unwrap();
        store.archive_edge(edge.id).unwrap();
        assert_eq!(store.active_degree(hub), 1);
    }

    #[test]
    fn evidence_add_and_trim() {
        let store = GraphStore::memory_only();
        let scope = test_scope();
        let id = store.upsert_node(scope, chunk_upsert("chunk:a")).unwrap();

        for score in [0.1f32, 0.9, 0.5, 0.7, 0.3] {
            store
                .add_node_evidence(id, Evidence::new(Uuid::new_v4()).with_score(score))
                .unwrap();
        }
        let deleted = store.trim_node_evidence(id, 2).unwrap();
        assert_eq!(deleted, 3);
        let kept: Vec<f32> = store.node_evidence(id).iter().filter_map(|e| e.score).collect();
        assert_eq!(kept, vec![0.9, 0.7]);
    }

    #[test]
    fn evidence_for_unknown_node_is_rejected() {
        let store = GraphStore::memory_only();
        let err = store
            .add_node_evidence(NodeId::generate(), Evidence::new(Uuid::new_v4()))
            .unwrap_err();
        assert!(matches!(err, StoreError::NodeNotFound { .. }));
    }

    #[test]
    fn chunk_cascade_removes_nodes_edges_and_evidence() {
        let store = GraphStore::memory_only();
        let scope = test_scope();
        let chunk_a = Uuid::new_v4();
        let chunk_b = Uuid::new_v4();

        let a = store
            .upsert_node(scope, chunk_upsert(&format!("chunk:{chunk_a}")))
            .unwrap();
        let b = store
            .upsert_node(scope, chunk_upsert(&format!("chunk:{chunk_b}")))
            .unwrap();
        store
            .upsert_edge(scope, EdgeUpsert::new(a, b, REL_RELATED_TO, 0.9))
            .unwrap();
        store
            .upsert_edge(scope, EdgeUpsert::new(b, a, REL_RELATED_TO, 0.9))
            .unwrap();
        store
            .add_node_evidence(a, Evidence::new(chunk_a))
            .unwrap();

        let (nodes_deleted, edges_deleted) = store.remove_chunk_nodes(scope, &[chunk_a]).unwrap();
        assert_eq!(nodes_deleted, 1);
        assert_eq!(edges_deleted, 2);
        assert!(store.node(a).is_none());
        assert!(store.node(b).is_some());
        assert!(store.node_evidence(a).is_empty());
        assert_eq!(store.active_degree(b), 0);
        // b's adjacency no longer references the deleted edges
        assert!(store.outgoing_edges(scope, b, 0.0, 10).is_empty());
    }
}
