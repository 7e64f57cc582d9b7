//! Knowledge-graph build pipeline:
//! fetch chunks → validate embeddings → upsert nodes → draw similarity edges.
//!
//! The pairwise similarity step is one dense matmul over the whole batch —
//! the only way the operation stays tractable at thousands of chunks. The
//! threshold and fan-out cap keep near-duplicate content from producing a
//! near-complete graph.

use std::collections::HashMap;
use std::sync::Arc;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chunk::{ChunkRecord, ChunkSource};
use crate::error::{BuildError, BuildResult};
use crate::graph::{
    EdgeUpsert, NodeId, NodeStatus, NodeType, NodeUpsert, PropertyMap, PropertyValue,
    REL_RELATED_TO,
};
use crate::index::VectorIndex;
use crate::scope::Scope;
use crate::similarity::{EmbeddingDim, cosine_similarity_matrix};
use crate::store::GraphStore;

/// Maximum characters of chunk text stored on a node as its description.
const PREVIEW_CHARS: usize = 80;

/// Configuration for one build pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Minimum cosine similarity for an edge, in [0, 1].
    pub similarity_threshold: f32,
    /// Fan-out cap: highest-similarity edges kept per source node.
    pub max_edges_per_chunk: usize,
    /// Hard cap on chunks per build. Excess chunks are truncated, not an error.
    pub max_chunks: usize,
    /// Page size for the chunk fetch loop.
    pub batch_size: usize,
    /// Relation type written on similarity edges.
    pub rel_type: String,
    /// Extra properties merged onto every edge (method/threshold tags win).
    pub edge_properties: PropertyMap,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.82,
            max_edges_per_chunk: 10,
            max_chunks: 2000,
            batch_size: 500,
            rel_type: REL_RELATED_TO.into(),
            edge_properties: PropertyMap::new(),
        }
    }
}

impl BuildConfig {
    fn validate(&self) -> BuildResult<()> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(BuildError::InvalidConfig {
                message: format!(
                    "similarity_threshold {} outside [0, 1]",
                    self.similarity_threshold
                ),
            });
        }
        if self.batch_size == 0 {
            return Err(BuildError::InvalidConfig {
                message: "batch_size must be > 0".into(),
            });
        }
        Ok(())
    }
}

/// Summary of one build pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
    pub chunks_fetched: usize,
    pub chunks_valid: usize,
    pub chunks_skipped: usize,
    pub nodes_upserted: usize,
    pub edges_upserted: usize,
    /// Per-item failures that did not abort the build.
    pub warnings: Vec<String>,
    /// Set when the build had nothing to do.
    pub note: Option<String>,
}

impl std::fmt::Display for BuildReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "build report")?;
        writeln!(f, "  chunks fetched: {}", self.chunks_fetched)?;
        writeln!(f, "  chunks valid:   {}", self.chunks_valid)?;
        writeln!(f, "  chunks skipped: {}", self.chunks_skipped)?;
        writeln!(f, "  nodes upserted: {}", self.nodes_upserted)?;
        writeln!(f, "  edges upserted: {}", self.edges_upserted)?;
        if !self.warnings.is_empty() {
            writeln!(f, "  warnings:       {}", self.warnings.len())?;
        }
        if let Some(ref note) = self.note {
            writeln!(f, "  note: {note}")?;
        }
        Ok(())
    }
}

/// Builds the similarity-linked graph from embedded chunks.
pub struct KnowledgeGraphBuilder {
    store: Arc<GraphStore>,
    chunks: Arc<dyn ChunkSource>,
    index: Arc<dyn VectorIndex>,
    dim: EmbeddingDim,
}

impl KnowledgeGraphBuilder {
    pub fn new(
        store: Arc<GraphStore>,
        chunks: Arc<dyn ChunkSource>,
        index: Arc<dyn VectorIndex>,
        dim: EmbeddingDim,
    ) -> Self {
        Self {
            store,
            chunks,
            index,
            dim,
        }
    }

    /// Run one build pass over a scope, optionally narrowed to a document.
    ///
    /// Node upserts complete before any edge is drawn — edges reference the
    /// surrogate IDs the upserts produce. Per-chunk validation failures and
    /// per-row upsert failures degrade into counters and warnings; only a
    /// failed scope-level fetch aborts the pass.
    pub fn build(
        &self,
        scope: Scope,
        document_id: Option<Uuid>,
        config: &BuildConfig,
    ) -> BuildResult<BuildReport> {
        config.validate()?;

        let all_chunks = self.fetch_all(scope, document_id, config)?;
        if all_chunks.is_empty() {
            return Ok(BuildReport {
                note: Some("No embedded chunks found.".into()),
                ..BuildReport::default()
            });
        }

        // Validate embeddings.
        let chunks_fetched = all_chunks.len();
        let mut valid: Vec<&ChunkRecord> = Vec::with_capacity(all_chunks.len());
        let mut skipped = 0usize;
        for chunk in &all_chunks {
            match &chunk.embedding {
                Some(emb) if emb.len() == self.dim.0 => valid.push(chunk),
                other => {
                    skipped += 1;
                    tracing::warn!(
                        chunk_id = %chunk.id,
                        got = other.as_ref().map_or(0, Vec::len),
                        expected = self.dim.0,
                        "skipping chunk with bad embedding"
                    );
                }
            }
        }

        if valid.is_empty() {
            return Ok(BuildReport {
                chunks_fetched,
                chunks_skipped: skipped,
                note: Some("No chunks had valid embeddings.".into()),
                ..BuildReport::default()
            });
        }

        let mut warnings = Vec::new();

        // 1) Upsert chunk nodes. Must complete before edges are drawn.
        let mut node_ids: HashMap<usize, NodeId> = HashMap::with_capacity(valid.len());
        let mut nodes_upserted = 0usize;
        for (i, chunk) in valid.iter().enumerate() {
            match self.upsert_chunk_node(scope, chunk) {
                Ok(node_id) => {
                    node_ids.insert(i, node_id);
                    nodes_upserted += 1;
                }
                Err(e) => warnings.push(format!("node upsert failed for chunk {}: {e}", chunk.id)),
            }
        }

        // 2) Similarity edges from one dense matrix over the batch.
        let mut vectors = Array2::<f32>::zeros((valid.len(), self.dim.0));
        for (i, chunk) in valid.iter().enumerate() {
            if let Some(emb) = &chunk.embedding {
                for (j, v) in emb.iter().enumerate() {
                    vectors[[i, j]] = *v;
                }
            }
        }
        let sim = cosine_similarity_matrix(&vectors);

        // Candidate selection is embarrassingly parallel over matrix rows;
        // the upserts below stay sequential so counts and warnings are
        // deterministic.
        let candidate_lists: Vec<Vec<(usize, f32)>> = {
            use rayon::prelude::*;
            (0..valid.len())
                .into_par_iter()
                .map(|i| {
                    let mut candidates: Vec<(usize, f32)> = sim
                        .row(i)
                        .iter()
                        .enumerate()
                        .filter(|(j, s)| *j != i && **s >= config.similarity_threshold)
                        .map(|(j, s)| (j, *s))
                        .collect();
                    candidates.sort_by(|a, b| {
                        b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal)
                    });
                    candidates.truncate(config.max_edges_per_chunk);
                    candidates
                })
                .collect()
        };

        let mut edges_upserted = 0usize;
        for (i, candidates) in candidate_lists.into_iter().enumerate() {
            let Some(&src_id) = node_ids.get(&i) else {
                continue;
            };

            for (j, weight) in candidates {
                let Some(&dst_id) = node_ids.get(&j) else {
                    continue;
                };
                let mut properties = config.edge_properties.clone();
                properties.insert("method".into(), "chunk_embedding_cosine".into());
                properties.insert(
                    "threshold".into(),
                    PropertyValue::from(config.similarity_threshold),
                );
                let upsert = EdgeUpsert::new(src_id, dst_id, config.rel_type.clone(), weight)
                    .with_properties(properties);
                match self.store.upsert_edge(scope, upsert) {
                    Ok(_) => edges_upserted += 1,
                    Err(e) => warnings.push(format!(
                        "edge upsert failed for chunks {} -> {}: {e}",
                        valid[i].id, valid[j].id
                    )),
                }
            }
        }

        tracing::info!(
            %scope,
            chunks_fetched,
            chunks_valid = valid.len(),
            chunks_skipped = skipped,
            nodes_upserted,
            edges_upserted,
            warnings = warnings.len(),
            "knowledge-graph build complete"
        );

        Ok(BuildReport {
            chunks_fetched,
            chunks_valid: valid.len(),
            chunks_skipped: skipped,
            nodes_upserted,
            edges_upserted,
            warnings,
            note: None,
        })
    }

    /// Page through every embedded chunk in scope, honoring `max_chunks` as
    /// the cooperative upper bound.
    fn fetch_all(
        &self,
        scope: Scope,
        document_id: Option<Uuid>,
        config: &BuildConfig,
    ) -> BuildResult<Vec<ChunkRecord>> {
        let mut chunks: Vec<ChunkRecord> = Vec::new();
        let mut offset = 0usize;
        loop {
            let batch = self
                .chunks
                .fetch_embedded(scope, document_id, config.batch_size, offset)?;
            if batch.is_empty() {
                break;
            }
            let batch_len = batch.len();
            chunks.extend(batch);
            tracing::debug!(
                fetched = batch_len,
                total = chunks.len(),
                offset,
                "fetched chunk batch"
            );
            if chunks.len() >= config.max_chunks {
                tracing::warn!(max_chunks = config.max_chunks, "reached max_chunks limit, truncating");
                chunks.truncate(config.max_chunks);
                break;
            }
            if batch_len < config.batch_size {
                break;
            }
            offset += config.batch_size;
        }
        Ok(chunks)
    }

    fn upsert_chunk_node(&self, scope: Scope, chunk: &ChunkRecord) -> BuildResult<NodeId> {
        let mut properties = PropertyMap::new();
        properties.insert("chunk_id".into(), chunk.id.into());
        properties.insert("document_id".into(), chunk.document_id.into());
        properties.insert("chunk_index".into(), chunk.chunk_index.into());
        properties.insert(
            "metadata".into(),
            PropertyValue::Map(chunk.metadata.clone()),
        );

        let mut upsert = NodeUpsert::new(
            format!("chunk:{}", chunk.id),
            NodeType::Chunk,
            format!("Chunk {}", chunk.chunk_index),
        )
        .with_description(preview(&chunk.content, PREVIEW_CHARS))
        .with_properties(properties)
        .with_status(NodeStatus::Active);
        if let Some(emb) = &chunk.embedding {
            upsert = upsert.with_embedding(emb.clone());
        }

        let node_id = self.store.upsert_node(scope, upsert)?;
        if let Some(emb) = &chunk.embedding {
            self.index.upsert(scope, node_id, emb)?;
        }
        Ok(node_id)
    }
}

/// Collapse newlines and bound the preview to `max_chars` characters,
/// appending an ellipsis when truncating.
fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.trim().replace('\n', " ");
    let mut out: String = flat.chars().take(max_chars).collect();
    if flat.chars().count() > max_chars {
        out.push('…');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_bounds_length_and_flattens_newlines() {
        let short = preview("hello\nworld", 80);
        assert_eq!(short, "hello world");

        let long_text = "x".repeat(100);
        let long = preview(&long_text, 80);
        assert_eq!(long.chars().count(), 81);
        assert!(long.ends_with('…'));
    }

    #[test]
    fn preview_counts_chars_not_bytes() {
        let text = "é".repeat(90);
        let out = preview(&text, 80);
        assert_eq!(out.chars().count(), 81);
    }

    #[test]
    fn default_config_matches_contract() {
        let cfg = BuildConfig::default();
        assert!((cfg.similarity_threshold - 0.82).abs() < 1e-6);
        assert_eq!(cfg.max_edges_per_chunk, 10);
        assert_eq!(cfg.max_chunks, 2000);
        assert_eq!(cfg.batch_size, 500);
        assert_eq!(cfg.rel_type, REL_RELATED_TO);
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let cfg = BuildConfig {
            similarity_threshold: 1.5,
            ..BuildConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(BuildError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let cfg = BuildConfig {
            batch_size: 0,
            ..BuildConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
