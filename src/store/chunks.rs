//! Chunk storage: the embedded-text records the graph is built from.
//!
//! Same two-layer shape as the graph store: hot DashMap indexes over an
//! optional durable write-through tier. Implements [`ChunkSource`] for the
//! builder and retriever.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use crate::chunk::{ChunkRecord, ChunkSource, ChunkUpsert};
use crate::error::StoreResult;
use crate::scope::Scope;

use super::durable::DurableStore;

type ChunkKey = (Scope, Uuid, u32);

/// Store of embedded text chunks, upserted by `(scope, document_id, chunk_index)`.
pub struct ChunkStore {
    records: DashMap<Uuid, ChunkRecord>,
    keys: DashMap<ChunkKey, Uuid>,
    durable: Option<Arc<DurableStore>>,
}

impl ChunkStore {
    /// Create a memory-only chunk store.
    pub fn memory_only() -> Self {
        Self {
            records: DashMap::new(),
            keys: DashMap::new(),
            durable: None,
        }
    }

    /// Create a chunk store over the durable tier, loading existing records.
    pub fn with_persistence(durable: Arc<DurableStore>) -> StoreResult<Self> {
        let store = Self {
            records: DashMap::new(),
            keys: DashMap::new(),
            durable: Some(Arc::clone(&durable)),
        };
        for chunk in durable.load_chunks()? {
            store
                .keys
                .insert((chunk.scope, chunk.document_id, chunk.chunk_index), chunk.id);
            store.records.insert(chunk.id, chunk);
        }
        tracing::debug!(chunks = store.records.len(), "chunk store loaded from durable tier");
        Ok(store)
    }

    /// Upsert a chunk by its natural key. Returns the surrogate ID.
    pub fn upsert(&self, scope: Scope, upsert: ChunkUpsert) -> StoreResult<Uuid> {
        let now = Utc::now();
        let chunk = match self
            .keys
            .entry((scope, upsert.document_id, upsert.chunk_index))
        {
            Entry::Occupied(slot) => {
                let id = *slot.get();
                let mut guard =
                    self.records
                        .get_mut(&id)
                        .ok_or_else(|| crate::error::StoreError::ChunkNotFound {
                            chunk_id: id.to_string(),
                        })?;
                let chunk = guard.value_mut();
                chunk.content = upsert.content;
                chunk.content_tokens = upsert.content_tokens;
                chunk.page_start = upsert.page_start;
                chunk.page_end = upsert.page_end;
                chunk.metadata = upsert.metadata;
                chunk.embedding = upsert.embedding;
                chunk.clone()
            }
            Entry::Vacant(slot) => {
                let chunk = ChunkRecord {
                    id: Uuid::new_v4(),
                    scope,
                    document_id: upsert.document_id,
                    chunk_index: upsert.chunk_index,
                    content: upsert.content,
                    content_tokens: upsert.content_tokens,
                    page_start: upsert.page_start,
                    page_end: upsert.page_end,
                    metadata: upsert.metadata,
                    embedding: upsert.embedding,
                    created_at: now,
                };
                slot.insert(chunk.id);
                self.records.insert(chunk.id, chunk.clone());
                chunk
            }
        };
        if let Some(durable) = &self.durable {
            durable.put_chunk(&chunk)?;
        }
        Ok(chunk.id)
    }

    /// Fetch a chunk by surrogate ID.
    pub fn get(&self, id: Uuid) -> Option<ChunkRecord> {
        self.records.get(&id).map(|c| c.value().clone())
    }

    /// Delete every chunk of a document. Returns the deleted chunk IDs so the
    /// caller can cascade into the graph store.
    pub fn delete_document(&self, scope: Scope, document_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let doomed: Vec<(ChunkKey, Uuid)> = self
            .records
            .iter()
            .filter(|entry| {
                let c = entry.value();
                c.scope == scope && c.document_id == document_id
            })
            .map(|entry| {
                let c = entry.value();
                ((c.scope, c.document_id, c.chunk_index), c.id)
            })
            .collect();

        let mut deleted = Vec::with_capacity(doomed.len());
        for (key, id) in doomed {
            self.keys.remove(&key);
            self.records.remove(&id);
            if let Some(durable) = &self.durable {
                durable.remove_chunk(id)?;
            }
            deleted.push(id);
        }
        Ok(deleted)
    }

    /// Total chunk count across scopes.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ChunkSource for ChunkStore {
    fn fetch_embedded(
        &self,
        scope: Scope,
        document_id: Option<Uuid>,
        limit: usize,
        offset: usize,
    ) -> StoreResult<Vec<ChunkRecord>> {
        // Snapshot, then sort for a stable pagination order. O(n log n) per
        // page is acceptable at the supported scale and stays correct under
        // concurrent mutation.
        let mut matching: Vec<ChunkRecord> = self
            .records
            .iter()
            .filter(|entry| {
                let c = entry.value();
                c.scope == scope
                    && c.embedding.is_some()
                    && document_id.is_none_or(|d| c.document_id == d)
            })
            .map(|entry| entry.value().clone())
            .collect();
        matching.sort_by(|a, b| {
            a.document_id
                .cmp(&b.document_id)
                .then_with(|| a.chunk_index.cmp(&b.chunk_index))
        });
        Ok(matching.into_iter().skip(offset).take(limit).collect())
    }

    fn content(&self, tenant_id: Uuid, chunk_id: Uuid) -> StoreResult<Option<String>> {
        Ok(self
            .records
            .get(&chunk_id)
            .filter(|c| c.value().scope.tenant_id == tenant_id)
            .map(|c| c.value().content.clone()))
    }
}

impl std::fmt::Debug for ChunkStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkStore")
            .field("chunks", &self.records.len())
            .field("persistent", &self.durable.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_scope() -> Scope {
        Scope::new(Uuid::new_v4(), Uuid::new_v4())
    }

    fn embedded(document_id: Uuid, index: u32) -> ChunkUpsert {
        ChunkUpsert::new(document_id, index, format!("chunk {index} text"))
            .with_embedding(vec![index as f32, 1.0])
    }

    #[test]
    fn upsert_is_idempotent_by_natural_key() {
        let store = ChunkStore::memory_only();
        let scope = test_scope();
        let doc = Uuid::new_v4();

        let first = store.upsert(scope, embedded(doc, 0)).unwrap();
        let second = store
            .upsert(scope, ChunkUpsert::new(doc, 0, "updated text").with_embedding(vec![9.0, 9.0]))
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(first).unwrap().content, "updated text");
    }

    #[test]
    fn fetch_embedded_paginates_in_stable_order() {
        let store = ChunkStore::memory_only();
        let scope = test_scope();
        let doc = Uuid::new_v4();
        for i in 0..5 {
            store.upsert(scope, embedded(doc, i)).unwrap();
        }
        // One chunk without an embedding is invisible.
        store.upsert(scope, ChunkUpsert::new(doc, 10, "no vector")).unwrap();

        let page1 = store.fetch_embedded(scope, None, 2, 0).unwrap();
        let page2 = store.fetch_embedded(scope, None, 2, 2).unwrap();
        let page3 = store.fetch_embedded(scope, None, 2, 4).unwrap();

        let indexes: Vec<u32> = page1
            .iter()
            .chain(page2.iter())
            .chain(page3.iter())
            .map(|c| c.chunk_index)
            .collect();
        assert_eq!(indexes, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn fetch_embedded_filters_by_document_and_scope() {
        let store = ChunkStore::memory_only();
        let scope = test_scope();
        let doc_a = Uuid::new_v4();
        let doc_b = Uuid::new_v4();
        store.upsert(scope, embedded(doc_a, 0)).unwrap();
        store.upsert(scope, embedded(doc_b, 0)).unwrap();
        store.upsert(test_scope(), embedded(doc_a, 1)).unwrap();

        let only_a = store.fetch_embedded(scope, Some(doc_a), 10, 0).unwrap();
        assert_eq!(only_a.len(), 1);
        assert_eq!(only_a[0].document_id, doc_a);

        let in_scope = store.fetch_embedded(scope, None, 10, 0).unwrap();
        assert_eq!(in_scope.len(), 2);
    }

    #[test]
    fn content_is_tenant_checked() {
        let store = ChunkStore::memory_only();
        let scope = test_scope();
        let id = store.upsert(scope, embedded(Uuid::new_v4(), 0)).unwrap();

        assert!(store.content(scope.tenant_id, id).unwrap().is_some());
        assert!(store.content(Uuid::new_v4(), id).unwrap().is_none());
    }

    #[test]
    fn delete_document_returns_chunk_ids() {
        let store = ChunkStore::memory_only();
        let scope = test_scope();
        let doc = Uuid::new_v4();
        let keep_doc = Uuid::new_v4();
        for i in 0..3 {
            store.upsert(scope, embedded(doc, i)).unwrap();
        }
        store.upsert(scope, embedded(keep_doc, 0)).unwrap();

        let deleted = store.delete_document(scope, doc).unwrap();
        assert_eq!(deleted.len(), 3);
        assert_eq!(store.len(), 1);
        // Re-upserting a deleted key makes a fresh record.
        let fresh = store.upsert(scope, embedded(doc, 0)).unwrap();
        assert!(!deleted.contains(&fresh));
    }
}
