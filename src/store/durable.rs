//! ACID-durable record storage backed by redb.
//!
//! Holds the canonical copy of nodes, edges, chunks, and evidence lists.
//! The in-memory indexes in [`GraphStore`](super::GraphStore) and
//! [`ChunkStore`](super::chunks::ChunkStore) are rebuilt from these tables
//! at open time; every mutation writes through here first-class.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition};
use uuid::Uuid;

use crate::chunk::ChunkRecord;
use crate::error::{StoreError, StoreResult};
use crate::graph::{Edge, EdgeId, Evidence, Node, NodeId};

const NODES: TableDefinition<&[u8], &[u8]> = TableDefinition::new("nodes");
const EDGES: TableDefinition<&[u8], &[u8]> = TableDefinition::new("edges");
const CHUNKS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("chunks");
const NODE_EVIDENCE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("node_evidence");
const EDGE_EVIDENCE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("edge_evidence");

/// ACID-durable store using redb.
///
/// All writes go through transactions. Reads use MVCC snapshots.
pub struct DurableStore {
    db: Arc<Database>,
}

impl DurableStore {
    /// Open or create a durable store in the given directory.
    pub fn open(data_dir: &Path) -> StoreResult<Self> {
        std::fs::create_dir_all(data_dir).map_err(|e| StoreError::Io { source: e })?;
        let db_path = data_dir.join("weft.redb");
        let db = Database::create(&db_path).map_err(|e| StoreError::Redb {
            message: format!("failed to open redb at {}: {e}", db_path.display()),
        })?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        Ok(store)
    }

    /// Create all tables so later read transactions never see a missing table.
    fn ensure_tables(&self) -> StoreResult<()> {
        let txn = self.db.begin_write().map_err(|e| StoreError::Redb {
            message: format!("begin_write failed: {e}"),
        })?;
        for def in [NODES, EDGES, CHUNKS, NODE_EVIDENCE, EDGE_EVIDENCE] {
            txn.open_table(def).map_err(|e| StoreError::Redb {
                message: format!("open_table failed: {e}"),
            })?;
        }
        txn.commit().map_err(|e| StoreError::Redb {
            message: format!("commit failed: {e}"),
        })?;
        Ok(())
    }

    fn put(&self, def: TableDefinition<&[u8], &[u8]>, key: &[u8], value: &[u8]) -> StoreResult<()> {
        let txn = self.db.begin_write().map_err(|e| StoreError::Redb {
            message: format!("begin_write failed: {e}"),
        })?;
        {
            let mut table = txn.open_table(def).map_err(|e| StoreError::Redb {
                message: format!("open_table failed: {e}"),
            })?;
            table.insert(key, value).map_err(|e| StoreError::Redb {
                message: format!("insert failed: {e}"),
            })?;
        }
        txn.commit().map_err(|e| StoreError::Redb {
            message: format!("commit failed: {e}"),
        })?;
        Ok(())
    }

    fn remove(&self, def: TableDefinition<&[u8], &[u8]>, key: &[u8]) -> StoreResult<bool> {
        let txn = self.db.begin_write().map_err(|e| StoreError::Redb {
            message: format!("begin_write failed: {e}"),
        })?;
        let existed = {
            let mut table = txn.open_table(def).map_err(|e| StoreError::Redb {
                message: format!("open_table failed: {e}"),
            })?;
            let result = table.remove(key).map_err(|e| StoreError::Redb {
                message: format!("remove failed: {e}"),
            })?;
            result.is_some()
        };
        txn.commit().map_err(|e| StoreError::Redb {
            message: format!("commit failed: {e}"),
        })?;
        Ok(existed)
    }

    fn load_table(&self, def: TableDefinition<&[u8], &[u8]>) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let txn = self.db.begin_read().map_err(|e| StoreError::Redb {
            message: format!("begin_read failed: {e}"),
        })?;
        let table = txn.open_table(def).map_err(|e| StoreError::Redb {
            message: format!("open_table failed: {e}"),
        })?;
        let mut rows = Vec::new();
        let iter = table.iter().map_err(|e| StoreError::Redb {
            message: format!("range scan failed: {e}"),
        })?;
        for entry in iter {
            let (key, value) = entry.map_err(|e| StoreError::Redb {
                message: format!("range scan failed: {e}"),
            })?;
            rows.push((key.value().to_vec(), value.value().to_vec()));
        }
        Ok(rows)
    }

    fn encode<T: serde::Serialize>(value: &T) -> StoreResult<Vec<u8>> {
        bincode::serialize(value).map_err(|e| StoreError::Serialization {
            message: format!("encode record: {e}"),
        })
    }

    fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> StoreResult<T> {
        bincode::deserialize(bytes).map_err(|e| StoreError::Serialization {
            message: format!("decode record: {e}"),
        })
    }

    // ── Nodes ────────────────────────────────────────────────────────────────

    pub fn put_node(&self, node: &Node) -> StoreResult<()> {
        self.put(NODES, node.id.as_uuid().as_bytes(), &Self::encode(node)?)
    }

    pub fn remove_node(&self, id: NodeId) -> StoreResult<bool> {
        self.remove(NODES, id.as_uuid().as_bytes())
    }

    pub fn load_nodes(&self) -> StoreResult<Vec<Node>> {
        self.load_table(NODES)?
            .iter()
            .map(|(_, value)| Self::decode(value))
            .collect()
    }

    // ── Edges ────────────────────────────────────────────────────────────────

    pub fn put_edge(&self, edge: &Edge) -> StoreResult<()> {
        self.put(EDGES, edge.id.as_uuid().as_bytes(), &Self::encode(edge)?)
    }

    pub fn remove_edge(&self, id: EdgeId) -> StoreResult<bool> {
        self.remove(EDGES, id.as_uuid().as_bytes())
    }

    pub fn load_edges(&self) -> StoreResult<Vec<Edge>> {
        self.load_table(EDGES)?
            .iter()
            .map(|(_, value)| Self::decode(value))
            .collect()
    }

    // ── Chunks ───────────────────────────────────────────────────────────────

    pub fn put_chunk(&self, chunk: &ChunkRecord) -> StoreResult<()> {
        self.put(CHUNKS, chunk.id.as_bytes(), &Self::encode(chunk)?)
    }

    pub fn remove_chunk(&self, id: Uuid) -> StoreResult<bool> {
        self.remove(CHUNKS, id.as_bytes())
    }

    pub fn load_chunks(&self) -> StoreResult<Vec<ChunkRecord>> {
        self.load_table(CHUNKS)?
            .iter()
            .map(|(_, value)| Self::decode(value))
            .collect()
    }

    // ── Evidence ─────────────────────────────────────────────────────────────

    pub fn put_node_evidence(&self, id: NodeId, rows: &[Evidence]) -> StoreResult<()> {
        self.put(NODE_EVIDENCE, id.as_uuid().as_bytes(), &Self::encode(&rows)?)
    }

    pub fn remove_node_evidence(&self, id: NodeId) -> StoreResult<bool> {
        self.remove(NODE_EVIDENCE, id.as_uuid().as_bytes())
    }

    pub fn load_node_evidence(&self) -> StoreResult<Vec<(NodeId, Vec<Evidence>)>> {
        self.load_table(NODE_EVIDENCE)?
            .iter()
            .map(|(key, value)| {
                let id = uuid_from_bytes(key)?;
                Ok((NodeId::from_uuid(id), Self::decode(value)?))
            })
            .collect()
    }

    pub fn put_edge_evidence(&self, id: EdgeId, rows: &[Evidence]) -> StoreResult<()> {
        self.put(EDGE_EVIDENCE, id.as_uuid().as_bytes(), &Self::encode(&rows)?)
    }

    pub fn remove_edge_evidence(&self, id: EdgeId) -> StoreResult<bool> {
        self.remove(EDGE_EVIDENCE, id.as_uuid().as_bytes())
    }

    pub fn load_edge_evidence(&self) -> StoreResult<Vec<(EdgeId, Vec<Evidence>)>> {
        self.load_table(EDGE_EVIDENCE)?
            .iter()
            .map(|(key, value)| {
                let id = uuid_from_bytes(key)?;
                Ok((EdgeId::from_uuid(id), Self::decode(value)?))
            })
            .collect()
    }
}

fn uuid_from_bytes(bytes: &[u8]) -> StoreResult<Uuid> {
    Uuid::from_slice(bytes).map_err(|e| StoreError::Serialization {
        message: format!("malformed uuid key: {e}"),
    })
}

impl std::fmt::Debug for DurableStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableStore").finish()
    }
}
