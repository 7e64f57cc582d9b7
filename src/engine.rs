//! Engine facade: top-level API for the weft system.
//!
//! The `Engine` owns all subsystems — graph store, chunk store, vector
//! index, builder, retriever, maintainer — and threads the store handles
//! through explicitly. There is no ambient global state.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use uuid::Uuid;

use crate::build::{BuildConfig, BuildReport, KnowledgeGraphBuilder};
use crate::chunk::ChunkUpsert;
use crate::error::{EngineError, WeftResult};
use crate::graph::{EdgeId, Evidence, NodeId};
use crate::index::{ExactVectorIndex, HnswVectorIndex, VectorIndex};
use crate::prune::{GraphMaintainer, PruneConfig, PruneReport};
use crate::retrieve::{GraphRetriever, Retrieval, RetrieveConfig};
use crate::scope::Scope;
use crate::similarity::EmbeddingDim;
use crate::store::{ChunkStore, DurableStore, GraphStore};

/// Which vector-search backend the engine runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexBackend {
    /// Brute-force cosine scan. Deterministic; right up to tens of
    /// thousands of nodes per scope.
    #[default]
    Exact,
    /// HNSW approximate nearest-neighbor, for larger graphs.
    Hnsw,
}

impl std::fmt::Display for IndexBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact => f.write_str("exact"),
            Self::Hnsw => f.write_str("hnsw"),
        }
    }
}

/// Configuration for the weft engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Data directory for persistence. `None` for memory-only mode.
    pub data_dir: Option<PathBuf>,
    /// Embedding dimension (default: 1536).
    pub embedding_dim: EmbeddingDim,
    /// Vector-search backend.
    pub index_backend: IndexBackend,
    /// Expected nodes per scope (capacity hint for the HNSW backend).
    pub max_nodes: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            embedding_dim: EmbeddingDim::DEFAULT,
            index_backend: IndexBackend::default(),
            max_nodes: 100_000,
        }
    }
}

/// Summary of a document cascade delete.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct DeleteReport {
    pub chunks_deleted: usize,
    pub nodes_deleted: usize,
    pub edges_deleted: usize,
}

/// The weft knowledge-graph engine.
///
/// Owns all subsystems and serializes builds per tenant+client scope so a
/// scope's edge set is a pure function of its chunk set.
pub struct Engine {
    config: EngineConfig,
    store: Arc<GraphStore>,
    chunks: Arc<ChunkStore>,
    index: Arc<dyn VectorIndex>,
    builder: KnowledgeGraphBuilder,
    retriever: GraphRetriever,
    maintainer: GraphMaintainer,
    build_locks: DashMap<Scope, Arc<Mutex<()>>>,
}

impl Engine {
    /// Create a new engine with the given configuration.
    pub fn new(config: EngineConfig) -> WeftResult<Self> {
        if config.embedding_dim.0 == 0 {
            return Err(EngineError::InvalidConfig {
                message: "embedding_dim must be > 0".into(),
            }
            .into());
        }

        tracing::info!(
            dim = config.embedding_dim.0,
            backend = %config.index_backend,
            persistent = config.data_dir.is_some(),
            "initializing weft engine"
        );

        let (store, chunks) = if let Some(ref dir) = config.data_dir {
            std::fs::create_dir_all(dir).map_err(|_| EngineError::DataDir {
                path: dir.display().to_string(),
            })?;
            let durable = Arc::new(DurableStore::open(dir)?);
            let store = GraphStore::with_persistence(Arc::clone(&durable))?;
            let chunks = ChunkStore::with_persistence(durable)?;
            (Arc::new(store), Arc::new(chunks))
        } else {
            (
                Arc::new(GraphStore::memory_only()),
                Arc::new(ChunkStore::memory_only()),
            )
        };

        let index: Arc<dyn VectorIndex> = match config.index_backend {
            IndexBackend::Exact => Arc::new(ExactVectorIndex::new(config.embedding_dim)),
            IndexBackend::Hnsw => Arc::new(HnswVectorIndex::new(
                config.embedding_dim,
                config.max_nodes,
            )),
        };

        // Reseed the index from persisted node embeddings.
        let mut reseeded = 0usize;
        for (scope, node_id, embedding) in store.embedded_nodes() {
            match index.upsert(scope, node_id, &embedding) {
                Ok(()) => reseeded += 1,
                Err(e) => {
                    tracing::warn!(%node_id, error = %e, "skipping node during index reseed")
                }
            }
        }
        if reseeded > 0 {
            tracing::debug!(nodes = reseeded, "vector index reseeded from store");
        }

        let builder = KnowledgeGraphBuilder::new(
            Arc::clone(&store),
            chunks.clone() as Arc<dyn crate::chunk::ChunkSource>,
            Arc::clone(&index),
            config.embedding_dim,
        );
        let retriever = GraphRetriever::new(
            Arc::clone(&store),
            chunks.clone() as Arc<dyn crate::chunk::ChunkSource>,
            Arc::clone(&index),
        );
        let maintainer = GraphMaintainer::new(Arc::clone(&store));

        Ok(Self {
            config,
            store,
            chunks,
            index,
            builder,
            retriever,
            maintainer,
            build_locks: DashMap::new(),
        })
    }

    /// Upsert a batch of pre-embedded chunks into a scope.
    pub fn upsert_chunks(
        &self,
        scope: Scope,
        chunks: Vec<ChunkUpsert>,
    ) -> WeftResult<Vec<Uuid>> {
        let mut ids = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            ids.push(self.chunks.upsert(scope, chunk)?);
        }
        Ok(ids)
    }

    /// Build (or refresh) the similarity graph for a scope.
    ///
    /// Builds for the same scope are serialized; different scopes run
    /// concurrently.
    pub fn build(
        &self,
        scope: Scope,
        document_id: Option<Uuid>,
        config: &BuildConfig,
    ) -> WeftResult<BuildReport> {
        let lock = self
            .build_locks
            .entry(scope)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().map_err(|_| EngineError::ScopeLock {
            message: format!("build lock for scope {scope}"),
        })?;
        Ok(self.builder.build(scope, document_id, config)?)
    }

    /// Retrieve content for a query embedding.
    pub fn retrieve(
        &self,
        scope: Scope,
        query_embedding: &[f32],
        config: &RetrieveConfig,
    ) -> WeftResult<Retrieval> {
        Ok(self.retriever.retrieve(scope, query_embedding, config)?)
    }

    /// Archive stale graph elements and trim evidence for a scope.
    pub fn prune(&self, scope: Scope, config: &PruneConfig) -> WeftResult<PruneReport> {
        Ok(self.maintainer.prune(scope, config)?)
    }

    /// Prune relative to an explicit reference time.
    pub fn prune_at(
        &self,
        scope: Scope,
        config: &PruneConfig,
        now: chrono::DateTime<chrono::Utc>,
    ) -> WeftResult<PruneReport> {
        Ok(self.maintainer.prune_at(scope, config, now)?)
    }

    /// Delete a document: its chunks, their nodes, and every edge touching
    /// them. The only hard-delete path in the system.
    pub fn delete_document(&self, scope: Scope, document_id: Uuid) -> WeftResult<DeleteReport> {
        let chunk_ids = self.chunks.delete_document(scope, document_id)?;
        let (nodes_deleted, edges_deleted) = self.store.remove_chunk_nodes(scope, &chunk_ids)?;
        tracing::info!(
            %scope,
            %document_id,
            chunks = chunk_ids.len(),
            nodes = nodes_deleted,
            edges = edges_deleted,
            "document cascade delete complete"
        );
        Ok(DeleteReport {
            chunks_deleted: chunk_ids.len(),
            nodes_deleted,
            edges_deleted,
        })
    }

    /// Attach an evidence row to a node.
    pub fn add_node_evidence(&self, node_id: NodeId, evidence: Evidence) -> WeftResult<()> {
        Ok(self.store.add_node_evidence(node_id, evidence)?)
    }

    /// Attach an evidence row to an edge.
    pub fn add_edge_evidence(&self, edge_id: EdgeId, evidence: Evidence) -> WeftResult<()> {
        Ok(self.store.add_edge_evidence(edge_id, evidence)?)
    }

    /// Get the graph store handle.
    pub fn store(&self) -> &Arc<GraphStore> {
        &self.store
    }

    /// Get the chunk store handle.
    pub fn chunk_store(&self) -> &Arc<ChunkStore> {
        &self.chunks
    }

    /// Get the vector index handle.
    pub fn vector_index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    /// Get the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Summary statistics for the whole engine.
    pub fn info(&self) -> EngineInfo {
        EngineInfo {
            embedding_dim: self.config.embedding_dim.0,
            index_backend: self.config.index_backend.to_string(),
            node_count: self.store.node_count(),
            edge_count: self.store.edge_count(),
            chunk_count: self.chunks.len(),
            persistent: self.config.data_dir.is_some(),
        }
    }
}

/// Summary information about the engine state.
#[derive(Debug, Clone, serde::Serialize)]
pub struct EngineInfo {
    pub embedding_dim: usize,
    pub index_backend: String,
    pub node_count: usize,
    pub edge_count: usize,
    pub chunk_count: usize,
    pub persistent: bool,
}

impl std::fmt::Display for EngineInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "weft engine info")?;
        writeln!(f, "  embedding dim: {}", self.embedding_dim)?;
        writeln!(f, "  index:         {}", self.index_backend)?;
        writeln!(f, "  nodes:         {}", self.node_count)?;
        writeln!(f, "  edges:         {}", self.edge_count)?;
        writeln!(f, "  chunks:        {}", self.chunk_count)?;
        writeln!(f, "  persistent:    {}", self.persistent)?;
        Ok(())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("store", &self.store)
            .field("chunks", &self.chunks)
            .finish()
    }
}
