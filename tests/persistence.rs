//! Persistence tests: the graph, chunks, and index state survive a restart.

use uuid::Uuid;

use weft::build::BuildConfig;
use weft::chunk::ChunkUpsert;
use weft::engine::{Engine, EngineConfig};
use weft::graph::NodeStatus;
use weft::prune::PruneConfig;
use weft::retrieve::RetrieveConfig;
use weft::scope::Scope;
use weft::similarity::EmbeddingDim;

fn persistent_engine(dir: &std::path::Path) -> Engine {
    Engine::new(EngineConfig {
        embedding_dim: EmbeddingDim::TEST,
        data_dir: Some(dir.to_path_buf()),
        ..Default::default()
    })
    .unwrap()
}

fn vec8(components: &[f32]) -> Vec<f32> {
    let mut v = vec![0.0; EmbeddingDim::TEST.0];
    v[..components.len()].copy_from_slice(components);
    v
}

fn ingest_and_build(engine: &Engine, scope: Scope) -> Uuid {
    let document_id = Uuid::new_v4();
    let upserts = vec![
        ChunkUpsert::new(document_id, 0, "alpha chunk with plenty of text in it".to_string())
            .with_embedding(vec8(&[1.0])),
        ChunkUpsert::new(document_id, 1, "beta chunk with plenty of text in it".to_string())
            .with_embedding(vec8(&[0.90, 0.435_889_9])),
    ];
    engine.upsert_chunks(scope, upserts).unwrap();
    engine.build(scope, None, &BuildConfig::default()).unwrap();
    document_id
}

#[test]
fn graph_survives_reopen() {
    let dir = tempfile::TempDir::new().unwrap();
    let scope = Scope::new(Uuid::new_v4(), Uuid::new_v4());

    {
        let engine = persistent_engine(dir.path());
        ingest_and_build(&engine, scope);
        assert_eq!(engine.store().node_count(), 2);
        assert_eq!(engine.store().edge_count(), 2);
    }

    let engine = persistent_engine(dir.path());
    let info = engine.info();
    assert_eq!(info.node_count, 2);
    assert_eq!(info.edge_count, 2);
    assert_eq!(info.chunk_count, 2);
}

#[test]
fn retrieval_works_after_reopen() {
    let dir = tempfile::TempDir::new().unwrap();
    let scope = Scope::new(Uuid::new_v4(), Uuid::new_v4());

    {
        let engine = persistent_engine(dir.path());
        ingest_and_build(&engine, scope);
    }

    // The vector index is reseeded from persisted node embeddings at open.
    let engine = persistent_engine(dir.path());
    let result = engine
        .retrieve(scope, &vec8(&[1.0]), &RetrieveConfig::default())
        .unwrap();

    assert!(!result.is_empty());
    assert!((result.confidence - 1.0).abs() < 1e-3);
    // Content hydrates from the persisted chunk store, not the preview.
    assert!(result.items[0].content.starts_with("alpha chunk"));
}

#[test]
fn rebuild_after_reopen_stays_idempotent() {
    let dir = tempfile::TempDir::new().unwrap();
    let scope = Scope::new(Uuid::new_v4(), Uuid::new_v4());

    {
        let engine = persistent_engine(dir.path());
        ingest_and_build(&engine, scope);
    }

    let engine = persistent_engine(dir.path());
    let report = engine.build(scope, None, &BuildConfig::default()).unwrap();
    assert_eq!(report.nodes_upserted, 2);
    assert_eq!(report.edges_upserted, 2);
    assert_eq!(engine.store().node_count(), 2);
    assert_eq!(engine.store().edge_count(), 2);

    // Surrogate IDs held steady across the restart and the rebuild.
    let nodes = engine.store().nodes_in_scope(scope);
    assert_eq!(nodes[0].seen_count, 2);
}

#[test]
fn archival_survives_reopen() {
    let dir = tempfile::TempDir::new().unwrap();
    let scope = Scope::new(Uuid::new_v4(), Uuid::new_v4());

    {
        let engine = persistent_engine(dir.path());
        ingest_and_build(&engine, scope);
        let report = engine
            .prune_at(
                scope,
                &PruneConfig::default(),
                chrono::Utc::now() + chrono::Duration::days(365),
            )
            .unwrap();
        assert_eq!(report.edges_archived, 2);
        assert_eq!(report.nodes_archived, 2);
    }

    let engine = persistent_engine(dir.path());
    let nodes = engine.store().nodes_in_scope(scope);
    assert!(nodes.iter().all(|n| n.status == NodeStatus::Archived));
    let edges = engine.store().edges_in_scope(scope);
    assert!(edges.iter().all(|e| !e.is_active));

    let result = engine
        .retrieve(scope, &vec8(&[1.0]), &RetrieveConfig::default())
        .unwrap();
    assert!(result.is_empty());
}

#[test]
fn document_delete_survives_reopen() {
    let dir = tempfile::TempDir::new().unwrap();
    let scope = Scope::new(Uuid::new_v4(), Uuid::new_v4());

    {
        let engine = persistent_engine(dir.path());
        let document_id = ingest_and_build(&engine, scope);
        let report = engine.delete_document(scope, document_id).unwrap();
        assert_eq!(report.chunks_deleted, 2);
    }

    let engine = persistent_engine(dir.path());
    let info = engine.info();
    assert_eq!(info.node_count, 0);
    assert_eq!(info.edge_count, 0);
    assert_eq!(info.chunk_count, 0);
}
