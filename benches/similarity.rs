//! Benchmarks for the dense cosine-similarity matrix.
//!
//! The matrix is the dominant cost of a graph build; these track it at
//! typical batch sizes with production-dimension vectors.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use ndarray::Array2;

use weft::similarity::{EmbeddingDim, cosine_similarity_matrix};

/// Deterministic pseudo-embeddings — no RNG so runs are comparable.
fn synthetic_vectors(n: usize, dim: usize) -> Array2<f32> {
    Array2::from_shape_fn((n, dim), |(i, j)| {
        ((i * dim + j) as f32 * 0.37).sin()
    })
}

fn bench_similarity_matrix(c: &mut Criterion) {
    let dim = EmbeddingDim::DEFAULT.0;
    let mut group = c.benchmark_group("cosine_similarity_matrix");

    for n in [64usize, 256, 1024] {
        let vectors = synthetic_vectors(n, dim);
        group.bench_function(format!("{n}x{dim}"), |b| {
            b.iter(|| cosine_similarity_matrix(black_box(&vectors)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_similarity_matrix);
criterion_main!(benches);
