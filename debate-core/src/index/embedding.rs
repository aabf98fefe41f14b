//! Embedding functions used to place chunks and queries in one vector space.

use async_trait::async_trait;
use thiserror::Error;

/// Failure while embedding a batch of texts.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding request failed: {0}")]
    RequestFailed(String),

    #[error("embedding has dimension {actual}, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("embedder returned {actual} vectors for {expected} inputs")]
    CountMismatch { expected: usize, actual: usize },
}

/// Maps texts to fixed-length vectors.
///
/// The same embedder must serve both index build and query; mixing models
/// corrupts distances silently, so the index persists `model_id` and
/// `dimension` and refuses to load under a different embedder.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Stable identifier of the embedding model.
    fn model_id(&self) -> &str;

    /// Length of every vector this embedder produces.
    fn dimension(&self) -> usize;

    /// Embed each text, preserving input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

/// Model id recorded for [`HashingEmbedder`] indexes.
pub const HASHING_MODEL_ID: &str = "hashing-v1";

/// Default vector length for [`HashingEmbedder`].
pub const DEFAULT_HASHING_DIMENSION: usize = 384;

/// Deterministic bag-of-words embedder using signed feature hashing.
///
/// Lowercased alphanumeric tokens are hashed with blake3 into `dimension`
/// buckets; the top hash bit picks the sign. Vectors are L2-normalised so
/// squared Euclidean distance tracks cosine similarity. Needs no network and
/// gives identical output across runs and platforms.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    /// Embed a single text synchronously.
    pub fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        for token in tokenize(text) {
            let hash = blake3::hash(token.as_bytes());
            let mut head = [0u8; 8];
            head.copy_from_slice(&hash.as_bytes()[..8]);
            let bits = u64::from_le_bytes(head);

            let bucket = (bits % self.dimension as u64) as usize;
            let sign = if bits >> 63 == 1 { -1.0 } else { 1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_HASHING_DIMENSION)
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn model_id(&self) -> &str {
        HASHING_MODEL_ID
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashing_is_deterministic() {
        let embedder = HashingEmbedder::new(64);
        let a = embedder.embed_one("Photosynthesis converts light");
        let b = embedder.embed_one("Photosynthesis converts light");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_hashing_is_normalised() {
        let embedder = HashingEmbedder::default();
        let v = embedder.embed_one("the mitochondria is the powerhouse of the cell");
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_hashing_ignores_case_and_punctuation() {
        let embedder = HashingEmbedder::default();
        assert_eq!(
            embedder.embed_one("Capital, of FRANCE!"),
            embedder.embed_one("capital of france")
        );
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let embedder = HashingEmbedder::new(16);
        assert!(embedder.embed_one("  ...  ").iter().all(|v| *v == 0.0));
    }

    #[tokio::test]
    async fn test_batch_preserves_order() {
        let embedder = HashingEmbedder::new(32);
        let texts = vec!["alpha".to_string(), "beta".to_string()];
        let out = embedder.embed(&texts).await.unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], embedder.embed_one("alpha"));
        assert_eq!(out[1], embedder.embed_one("beta"));
    }

    #[test]
    fn test_zero_dimension_is_clamped() {
        assert_eq!(HashingEmbedder::new(0).dimension(), 1);
    }
}
