//! Directed, weighted edges between graph nodes.
//!
//! Edges are drawn from embedding similarity at build time. Because fan-out
//! capping is applied independently per source node, an edge A→B does not
//! imply B→A exists — consumers must tolerate the asymmetry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scope::Scope;

use super::node::NodeId;
use super::property::PropertyMap;

/// Relation type used for similarity edges.
pub const REL_RELATED_TO: &str = "related_to";

/// Surrogate identifier for an edge. Stable across upserts of the same natural key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(Uuid);

impl EdgeId {
    /// Allocate a fresh surrogate ID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// The underlying UUID.
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A directed edge in the knowledge graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    /// Surrogate ID, assigned at creation, stable across upserts.
    pub id: EdgeId,
    /// Owning tenant + client scope.
    pub scope: Scope,
    /// Source node (edge goes FROM this node).
    pub src_id: NodeId,
    /// Destination node (edge goes TO this node).
    pub dst_id: NodeId,
    /// Relation type (e.g. `related_to`).
    pub rel_type: String,
    /// Similarity score in [0, 1], captured at build time.
    pub weight: f32,
    /// Method tag, threshold used, and any caller-supplied extras.
    pub properties: PropertyMap,
    /// Archived edges are flagged inactive, never deleted.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

impl Edge {
    /// Whether this edge goes FROM the given node.
    pub fn starts_from(&self, node: NodeId) -> bool {
        self.src_id == node
    }

    /// Whether this edge goes TO the given node.
    pub fn ends_at(&self, node: NodeId) -> bool {
        self.dst_id == node
    }

    /// Whether this edge touches the given node as source or destination.
    pub fn touches(&self, node: NodeId) -> bool {
        self.src_id == node || self.dst_id == node
    }
}

/// Intent model for an idempotent edge upsert.
///
/// The store resolves the natural key `(scope, src_id, dst_id, rel_type)`:
/// an existing row gets its weight and properties refreshed and is
/// re-activated; otherwise a new row is created.
#[derive(Debug, Clone)]
pub struct EdgeUpsert {
    pub src_id: NodeId,
    pub dst_id: NodeId,
    pub rel_type: String,
    pub weight: f32,
    pub properties: PropertyMap,
}

impl EdgeUpsert {
    pub fn new(src_id: NodeId, dst_id: NodeId, rel_type: impl Into<String>, weight: f32) -> Self {
        Self {
            src_id,
            dst_id,
            rel_type: rel_type.into(),
            weight,
            properties: PropertyMap::new(),
        }
    }

    pub fn with_properties(mut self, properties: PropertyMap) -> Self {
        self.properties = properties;
        self
    }
}
