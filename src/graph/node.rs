//! Graph nodes: lightweight, graph-addressable proxies for content.
//!
//! A node never carries full content — a Chunk-type node holds an 80-char
//! preview and a `chunk_id` back-reference; the text itself lives in the
//! chunk store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scope::Scope;

use super::property::{PropertyMap, PropertyValue};

/// Surrogate identifier for a node. Stable across upserts of the same natural key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(Uuid);

impl NodeId {
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

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The kind of content a node stands for.
///
/// Serialized with the wire names the rest of the platform uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    WebPage,
    #[serde(rename = "PDF")]
    Pdf,
    Image,
    PowerPoint,
    Docx,
    VideoTranscript,
    ChatTranscript,
    ChatSnapshot,
    Chunk,
}

impl NodeType {
    /// Wire name for diagnostics and API output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WebPage => "WebPage",
            Self::Pdf => "PDF",
            Self::Image => "Image",
            Self::PowerPoint => "PowerPoint",
            Self::Docx => "Docx",
            Self::VideoTranscript => "VideoTranscript",
            Self::ChatTranscript => "ChatTranscript",
            Self::ChatSnapshot => "ChatSnapshot",
            Self::Chunk => "Chunk",
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Active,
    PendingLinking,
    Archived,
}

impl NodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::PendingLinking => "pending_linking",
            Self::Archived => "archived",
        }
    }
}

impl std::fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node in the knowledge graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Surrogate ID, assigned at creation, stable across upserts.
    pub id: NodeId,
    /// Owning tenant + client scope.
    pub scope: Scope,
    /// Natural key within the scope (e.g. `chunk:{chunk_id}`).
    pub node_key: String,
    /// Content kind.
    pub node_type: NodeType,
    /// Short human-readable label.
    pub name: String,
    /// Bounded-length content preview. Never the full text.
    pub description: Option<String>,
    /// Open key-value map with back-references (`chunk_id`, `document_id`, …).
    pub properties: PropertyMap,
    /// Embedding vector, mirrored into the vector index when present.
    pub embedding: Option<Vec<f32>>,
    /// Lifecycle state.
    pub status: NodeStatus,
    /// How many upserts have touched this natural key.
    pub seen_count: u64,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

impl Node {
    /// Whether the node is active (eligible for retrieval).
    pub fn is_active(&self) -> bool {
        self.status == NodeStatus::Active
    }

    /// The referenced chunk, for Chunk-type nodes.
    pub fn chunk_id(&self) -> Option<Uuid> {
        self.properties.get("chunk_id").and_then(PropertyValue::as_uuid)
    }

    /// The owning document, when recorded.
    pub fn document_id(&self) -> Option<Uuid> {
        self.properties
            .get("document_id")
            .and_then(PropertyValue::as_uuid)
    }

    /// The chunk's position within its document, when recorded.
    pub fn chunk_index(&self) -> Option<u32> {
        self.properties
            .get("chunk_index")
            .and_then(PropertyValue::as_int)
            .and_then(|i| u32::try_from(i).ok())
    }
}

/// Intent model for an idempotent node upsert.
///
/// The store resolves the natural key `(scope, node_key)`: an existing row is
/// updated in place (same surrogate ID, `seen_count` bumped, `last_seen_at`
/// refreshed), otherwise a new row is created.
#[derive(Debug, Clone)]
pub struct NodeUpsert {
    pub node_key: String,
    pub node_type: NodeType,
    pub name: String,
    pub description: Option<String>,
    pub properties: PropertyMap,
    pub embedding: Option<Vec<f32>>,
    pub status: NodeStatus,
}

impl NodeUpsert {
    /// Start an upsert with empty properties and active status.
    pub fn new(node_key: impl Into<String>, node_type: NodeType, name: impl Into<String>) -> Self {
        Self {
            node_key: node_key.into(),
            node_type,
            name: name.into(),
            description: None,
            properties: PropertyMap::new(),
            embedding: None,
            status: NodeStatus::Active,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_properties(mut self, properties: PropertyMap) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn with_status(mut self, status: NodeStatus) -> Self {
        self.status = status;
        self
    }
}
