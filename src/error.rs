//! Rich diagnostic error types for the weft engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains so users know exactly what
//! went wrong and how to fix it.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the weft engine.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text, source spans) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum WeftError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Retrieve(#[from] RetrieveError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Prune(#[from] PruneError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Engine(#[from] EngineError),
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("I/O error: {source}")]
    #[diagnostic(
        code(weft::store::io),
        help(
            "A filesystem operation failed. Check that the data directory exists, \
             has correct permissions, and that the disk is not full."
        )
    )]
    Io {
        #[source]
        source: std::io::Error,
    },

    #[error("redb transaction error: {message}")]
    #[diagnostic(
        code(weft::store::redb),
        help(
            "The embedded database encountered a transaction error. \
             This may indicate corruption — try running with a fresh data directory. \
             If the problem persists, file a bug report."
        )
    )]
    Redb { message: String },

    #[error("serialization error: {message}")]
    #[diagnostic(
        code(weft::store::serde),
        help(
            "Failed to serialize or deserialize a stored record. \
             This usually means the stored data format has changed between versions. \
             Try rebuilding the graph from the source chunks."
        )
    )]
    Serialization { message: String },

    #[error("node not found: {node_id}")]
    #[diagnostic(
        code(weft::store::node_not_found),
        help("No node with this ID exists in the graph store. Verify the ID is correct.")
    )]
    NodeNotFound { node_id: String },

    #[error("edge not found: {edge_id}")]
    #[diagnostic(
        code(weft::store::edge_not_found),
        help("No edge with this ID exists in the graph store. Verify the ID is correct.")
    )]
    EdgeNotFound { edge_id: String },

    #[error("chunk not found: {chunk_id}")]
    #[diagnostic(
        code(weft::store::chunk_not_found),
        help("No chunk with this ID exists in the chunk store. Verify the ID is correct.")
    )]
    ChunkNotFound { chunk_id: String },
}

// ---------------------------------------------------------------------------
// Vector-index errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum IndexError {
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    #[diagnostic(
        code(weft::index::dim_mismatch),
        help(
            "All embeddings handed to the vector index must share the dimension \
             the engine was configured with. Check that the chunks were embedded \
             with the same model as the query."
        )
    )]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("HNSW index error: {message}")]
    #[diagnostic(
        code(weft::index::hnsw),
        help("The HNSW approximate nearest-neighbor index encountered an internal error.")
    )]
    Hnsw { message: String },
}

// ---------------------------------------------------------------------------
// Build errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum BuildError {
    #[error("invalid build config: {message}")]
    #[diagnostic(
        code(weft::build::invalid_config),
        help(
            "Check the BuildConfig fields: similarity_threshold must lie in [0, 1] \
             and batch_size must be greater than zero."
        )
    )]
    InvalidConfig { message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Index(#[from] IndexError),
}

// ---------------------------------------------------------------------------
// Retrieval errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum RetrieveError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Index(#[from] IndexError),
}

// ---------------------------------------------------------------------------
// Pruning errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum PruneError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),
}

// ---------------------------------------------------------------------------
// Engine errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    #[error("invalid configuration: {message}")]
    #[diagnostic(
        code(weft::engine::invalid_config),
        help("Check the EngineConfig fields. {message}")
    )]
    InvalidConfig { message: String },

    #[error("data directory error: {path}")]
    #[diagnostic(
        code(weft::engine::data_dir),
        help(
            "The data directory could not be accessed. \
             Ensure the path exists and has read/write permissions."
        )
    )]
    DataDir { path: String },

    #[error("scope lock poisoned: {message}")]
    #[diagnostic(
        code(weft::engine::scope_lock),
        help(
            "A previous build for this tenant+client scope panicked while holding \
             the build lock. Restart the process to clear the poisoned lock."
        )
    )]
    ScopeLock { message: String },
}

/// Convenience alias for functions returning weft results.
pub type WeftResult<T> = std::result::Result<T, WeftError>;

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type for vector-index operations.
pub type IndexResult<T> = std::result::Result<T, IndexError>;

/// Result type for build operations.
pub type BuildResult<T> = std::result::Result<T, BuildError>;

/// Result type for retrieval operations.
pub type RetrieveResult<T> = std::result::Result<T, RetrieveError>;

/// Result type for pruning operations.
pub type PruneResult<T> = std::result::Result<T, PruneError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_converts_to_weft_error() {
        let err = StoreError::NodeNotFound {
            node_id: "test".into(),
        };
        let weft: WeftError = err.into();
        assert!(matches!(weft, WeftError::Store(StoreError::NodeNotFound { .. })));
    }

    #[test]
    fn build_error_wraps_index_error() {
        let idx_err = IndexError::DimensionMismatch {
            expected: 1536,
            actual: 768,
        };
        let build_err: BuildError = idx_err.into();
        assert!(matches!(
            build_err,
            BuildError::Index(IndexError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn error_display_messages_are_descriptive() {
        let err = IndexError::DimensionMismatch {
            expected: 1536,
            actual: 768,
        };
        let msg = format!("{err}");
        assert!(msg.contains("1536"));
        assert!(msg.contains("768"));
    }
}
