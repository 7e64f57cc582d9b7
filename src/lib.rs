// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # weft
//!
//! A knowledge-graph engine that turns embedded text chunks into a
//! similarity-linked graph and answers queries by combining vector search
//! with bounded graph expansion.
//!
//! ## Architecture
//!
//! - **Graph store** (`store`): nodes/edges/evidence with natural-key upserts —
//!   hot DashMap indexes over an optional ACID tier (redb)
//! - **Builder** (`build`): chunks → nodes + dense-cosine similarity edges,
//!   thresholded and fan-out capped
//! - **Retriever** (`retrieve`): vector seeding + one-hop expansion with
//!   deterministic ordering and a confidence signal
//! - **Maintainer** (`prune`): staleness/degree-based archival, evidence trim
//! - **Vector index** (`index`): scoped top-k cosine search — exact scan or
//!   HNSW
//!
//! ## Library usage
//!
//! ```no_run
//! use uuid::Uuid;
//! use weft::build::BuildConfig;
//! use weft::chunk::ChunkUpsert;
//! use weft::engine::{Engine, EngineConfig};
//! use weft::retrieve::RetrieveConfig;
//! use weft::scope::Scope;
//!
//! let engine = Engine::new(EngineConfig::default()).unwrap();
//! let scope = Scope::new(Uuid::new_v4(), Uuid::new_v4());
//!
//! let chunk = ChunkUpsert::new(Uuid::new_v4(), 0, "chunk text")
//!     .with_embedding(vec![0.0; 1536]);
//! engine.upsert_chunks(scope, vec![chunk]).unwrap();
//! engine.build(scope, None, &BuildConfig::default()).unwrap();
//!
//! let query = vec![0.0; 1536];
//! let result = engine.retrieve(scope, &query, &RetrieveConfig::default()).unwrap();
//! if result.is_low_confidence() {
//!     // route to fallback behavior
//! }
//! ```

pub mod build;
pub mod chunk;
pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod index;
pub mod prune;
pub mod retrieve;
pub mod scope;
pub mod similarity;
pub mod store;
