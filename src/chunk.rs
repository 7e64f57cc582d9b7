//! Chunk records and the capability trait the graph core consumes them through.
//!
//! Chunks arrive pre-embedded from the ingestion layer; the graph core never
//! parses documents or computes embeddings itself. Node descriptions are
//! previews — retrieval comes back here for the full text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreResult;
use crate::graph::PropertyMap;
use crate::scope::Scope;

/// A unit of extracted document text with its own embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Surrogate ID, stable across upserts of the same natural key.
    pub id: Uuid,
    /// Owning tenant + client scope.
    pub scope: Scope,
    /// The document this chunk was extracted from.
    pub document_id: Uuid,
    /// Position within the document. Part of the natural key.
    pub chunk_index: u32,
    /// Full extracted text.
    pub content: String,
    /// Token count, when the tokenizer reported one.
    pub content_tokens: Option<u32>,
    /// Source page range, for paginated formats.
    pub page_start: Option<u32>,
    pub page_end: Option<u32>,
    /// Extraction metadata (source URL, mime type, …).
    pub metadata: PropertyMap,
    /// Embedding vector. Chunks without one are invisible to the builder.
    pub embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
}

/// Intent model for an idempotent chunk upsert.
///
/// Natural key: `(scope, document_id, chunk_index)`.
#[derive(Debug, Clone)]
pub struct ChunkUpsert {
    pub document_id: Uuid,
    pub chunk_index: u32,
    pub content: String,
    pub content_tokens: Option<u32>,
    pub page_start: Option<u32>,
    pub page_end: Option<u32>,
    pub metadata: PropertyMap,
    pub embedding: Option<Vec<f32>>,
}

impl ChunkUpsert {
    pub fn new(document_id: Uuid, chunk_index: u32, content: impl Into<String>) -> Self {
        Self {
            document_id,
            chunk_index,
            content: content.into(),
            content_tokens: None,
            page_start: None,
            page_end: None,
            metadata: PropertyMap::new(),
            embedding: None,
        }
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn with_metadata(mut self, metadata: PropertyMap) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Capability trait: where the graph core reads chunks from.
///
/// The shipped [`ChunkStore`](crate::store::chunks::ChunkStore) implements it;
/// callers with their own storage can substitute theirs.
pub trait ChunkSource: Send + Sync {
    /// Fetch chunks that have an embedding, scoped to tenant + client,
    /// optionally narrowed to one document. Paginated: results are in a
    /// stable `(document_id, chunk_index)` order so `offset`/`limit` walk
    /// the set without gaps or repeats.
    fn fetch_embedded(
        &self,
        scope: Scope,
        document_id: Option<Uuid>,
        limit: usize,
        offset: usize,
    ) -> StoreResult<Vec<ChunkRecord>>;

    /// Full text of one chunk, tenant-checked. `None` when the chunk does
    /// not exist (or belongs to another tenant).
    fn content(&self, tenant_id: Uuid, chunk_id: Uuid) -> StoreResult<Option<String>>;
}
