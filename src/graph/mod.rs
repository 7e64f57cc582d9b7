//! Knowledge-graph data model: nodes, edges, evidence, and property maps.
//!
//! Nodes are lightweight proxies for retrievable content, keyed by a natural
//! key within a tenant+client scope. Edges are directed similarity relations
//! drawn between them at build time. Evidence rows link either back to the
//! supporting chunks.

pub mod edge;
pub mod evidence;
pub mod node;
pub mod property;

pub use edge::{Edge, EdgeId, EdgeUpsert, REL_RELATED_TO};
pub use evidence::Evidence;
pub use node::{Node, NodeId, NodeStatus, NodeType, NodeUpsert};
pub use property::{PropertyMap, PropertyValue};
