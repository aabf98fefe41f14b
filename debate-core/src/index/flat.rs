//! Exact nearest-neighbour search over a flat, row-major vector store.

use serde::{Deserialize, Serialize};

/// Brute-force L2 index. Rows are stored contiguously; row `i` is
/// `vectors[i * dimension..(i + 1) * dimension]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatIndex {
    dimension: usize,
    vectors: Vec<f32>,
}

impl FlatIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: Vec::new(),
        }
    }

    pub(crate) fn from_raw(dimension: usize, vectors: Vec<f32>) -> Option<Self> {
        if dimension == 0 || vectors.len() % dimension != 0 {
            return None;
        }
        Some(Self { dimension, vectors })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored rows.
    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.vectors.len() / self.dimension
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub(crate) fn raw(&self) -> &[f32] {
        &self.vectors
    }

    /// Append one row. Returns `false` (and stores nothing) when the
    /// vector length does not match the index dimension.
    pub fn add(&mut self, vector: &[f32]) -> bool {
        if vector.len() != self.dimension {
            return false;
        }
        self.vectors.extend_from_slice(vector);
        true
    }

    /// The `k` rows closest to `query` by squared Euclidean distance,
    /// ascending. Ties keep insertion order. `k` is clamped to `len()`.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<(usize, f32)> {
        if query.len() != self.dimension || self.dimension == 0 {
            return Vec::new();
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(i, row)| (i, squared_l2(query, row)))
            .collect();

        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        scored.truncate(k.min(self.len()));
        scored
    }
}

/// Squared Euclidean distance between two equal-length vectors.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
