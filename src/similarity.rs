//! Cosine-similarity primitives shared by the builder and the exact index.
//!
//! The builder computes one dense N×N matrix per batch — a single matmul,
//! never a lookup per pair.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Embedding vector dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingDim(pub usize);

impl EmbeddingDim {
    /// Production default: OpenAI `text-embedding-3-small`.
    pub const DEFAULT: EmbeddingDim = EmbeddingDim(1536);

    /// Small dimension for fast tests.
    pub const TEST: EmbeddingDim = EmbeddingDim(8);
}

impl Default for EmbeddingDim {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl std::fmt::Display for EmbeddingDim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Pairwise cosine similarity matrix for an (n, d) array of row vectors.
///
/// Rows are L2-normalized first; a zero-norm row is left as zeros, so its
/// similarity to everything (itself included) is 0 rather than a division
/// error.
pub fn cosine_similarity_matrix(vectors: &Array2<f32>) -> Array2<f32> {
    let mut normalized = vectors.to_owned();
    for mut row in normalized.rows_mut() {
        let norm = row.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            row.mapv_inplace(|v| v / norm);
        }
    }
    normalized.dot(&normalized.t())
}

/// Cosine similarity of two vectors, with the same zero-norm guard.
///
/// Mismatched lengths compare over the shorter prefix; callers validate
/// dimensions before getting here.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a <= 0.0 || norm_b <= 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
