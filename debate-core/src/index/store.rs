//! The evidence index: chunk texts and metadata kept positionally aligned
//! with their embeddings, searchable by exact squared-L2 distance.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::embedding::{Embedder, EmbeddingError};
use super::flat::FlatIndex;

/// Per-chunk metadata (e.g. `source`, `chunk_index`).
pub type Metadata = BTreeMap<String, String>;

/// One retrieved unit of evidence. `score` is the squared Euclidean
/// distance to the query: lower means more similar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceChunk {
    pub text: String,
    pub metadata: Metadata,
    pub score: f32,
}

/// Errors from building, persisting, loading or querying the index.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("invalid index input: {0}")]
    Configuration(String),

    #[error("no persisted index at {}", path.display())]
    NotFound { path: PathBuf },

    #[error("index not built or loaded; call build() or load() first")]
    NotBuilt,

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error("index I/O failed at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("index codec error: {0}")]
    Codec(String),

    #[error("persisted index is corrupt: {0}")]
    Corrupt(String),

    #[error(
        "index was built with embedder {found} (dim {found_dimension}), \
         but {expected} (dim {expected_dimension}) is configured"
    )]
    EmbedderMismatch {
        expected: String,
        expected_dimension: usize,
        found: String,
        found_dimension: usize,
    },
}

impl IndexError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Current on-disk format of the `.index` blob.
pub const INDEX_FORMAT_VERSION: u32 = 1;

/// Opaque searchable blob written to `<base>.index`.
#[derive(Debug, Serialize, Deserialize)]
struct IndexBlob {
    format_version: u32,
    embedder_model: String,
    dimension: usize,
    vectors: Vec<f32>,
}

/// Text bundle written to `<base>.json`, positionally aligned with the blob.
#[derive(Debug, Serialize, Deserialize)]
struct DocumentBundle {
    documents: Vec<String>,
    metadata: Vec<Metadata>,
}

/// The two co-located artifacts for a base path: `(<base>.index, <base>.json)`.
pub fn index_paths(base: &Path) -> (PathBuf, PathBuf) {
    let with_suffix = |suffix: &str| {
        let mut s = base.as_os_str().to_owned();
        s.push(suffix);
        PathBuf::from(s)
    };
    (with_suffix(".index"), with_suffix(".json"))
}

/// Whether both persisted artifacts exist for `base`.
pub fn index_exists(base: &Path) -> bool {
    let (blob, bundle) = index_paths(base);
    blob.exists() && bundle.exists()
}

/// Flat vector index over text chunks.
///
/// Built once (or loaded), then queried many times through `&self`.
/// `documents`, `metadata` and the rows of `index` always have equal length.
pub struct EvidenceIndex {
    embedder: Arc<dyn Embedder>,
    index: Option<FlatIndex>,
    documents: Vec<String>,
    metadata: Vec<Metadata>,
}

impl std::fmt::Debug for EvidenceIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvidenceIndex")
            .field("embedder", &self.embedder.model_id())
            .field("ready", &self.is_ready())
            .field("documents", &self.documents.len())
            .finish()
    }
}

impl EvidenceIndex {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            index: None,
            documents: Vec::new(),
            metadata: Vec::new(),
        }
    }

    /// Create an index and load it from `base` in one step.
    pub fn open(embedder: Arc<dyn Embedder>, base: &Path) -> Result<Self, IndexError> {
        let mut index = Self::new(embedder);
        index.load(base)?;
        Ok(index)
    }

    /// Whether `build` or `load` has completed.
    pub fn is_ready(&self) -> bool {
        self.index.is_some()
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn embedder_model(&self) -> &str {
        self.embedder.model_id()
    }

    pub fn dimension(&self) -> usize {
        self.embedder.dimension()
    }

    /// Embed `texts` and replace the index contents.
    ///
    /// `metadata`, when given, must be parallel to `texts`; when `None`
    /// every chunk gets an empty map. On error the previous contents are
    /// left untouched.
    pub async fn build(
        &mut self,
        texts: Vec<String>,
        metadata: Option<Vec<Metadata>>,
    ) -> Result<(), IndexError> {
        if texts.is_empty() {
            return Err(IndexError::Configuration(
                "cannot build an index from zero texts".to_string(),
            ));
        }

        let metadata = match metadata {
            Some(m) if m.len() != texts.len() => {
                return Err(IndexError::Configuration(format!(
                    "{} metadata entries for {} texts",
                    m.len(),
                    texts.len()
                )));
            }
            Some(m) => m,
            None => vec![Metadata::new(); texts.len()],
        };

        info!(
            documents = texts.len(),
            embedder = self.embedder.model_id(),
            "Building evidence index"
        );

        let embeddings = self.embedder.embed(&texts).await?;
        if embeddings.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                actual: embeddings.len(),
            }
            .into());
        }

        let dimension = self.embedder.dimension();
        let mut index = FlatIndex::new(dimension);
        for embedding in &embeddings {
            if !index.add(embedding) {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: dimension,
                    actual: embedding.len(),
                }
                .into());
            }
        }

        info!(
            vectors = index.len(),
            dimension, "Evidence index built"
        );

        self.index = Some(index);
        self.documents = texts;
        self.metadata = metadata;
        Ok(())
    }

    /// Write `<base>.index` and `<base>.json`.
    pub fn persist(&self, base: &Path) -> Result<(), IndexError> {
        let index = self.index.as_ref().ok_or(IndexError::NotBuilt)?;
        let (blob_path, bundle_path) = index_paths(base);

        if let Some(parent) = blob_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| IndexError::io(parent, e))?;
        }

        let blob = IndexBlob {
            format_version: INDEX_FORMAT_VERSION,
            embedder_model: self.embedder.model_id().to_string(),
            dimension: index.dimension(),
            vectors: index.raw().to_vec(),
        };
        let bytes = bincode::serde::encode_to_vec(&blob, bincode::config::standard())
            .map_err(|e| IndexError::Codec(e.to_string()))?;
        std::fs::write(&blob_path, bytes).map_err(|e| IndexError::io(&blob_path, e))?;

        let bundle = DocumentBundle {
            documents: self.documents.clone(),
            metadata: self.metadata.clone(),
        };
        let json =
            serde_json::to_string_pretty(&bundle).map_err(|e| IndexError::Codec(e.to_string()))?;
        std::fs::write(&bundle_path, json).map_err(|e| IndexError::io(&bundle_path, e))?;

        info!(path = %base.display(), documents = self.documents.len(), "Evidence index saved");
        Ok(())
    }

    /// Replace the index contents with the artifacts persisted at `base`.
    ///
    /// Loading is idempotent; both artifacts must exist and agree with each
    /// other and with the configured embedder.
    pub fn load(&mut self, base: &Path) -> Result<(), IndexError> {
        let (blob_path, bundle_path) = index_paths(base);
        for path in [&blob_path, &bundle_path] {
            if !path.exists() {
                return Err(IndexError::NotFound { path: path.clone() });
            }
        }

        let bytes = std::fs::read(&blob_path).map_err(|e| IndexError::io(&blob_path, e))?;
        let (blob, _): (IndexBlob, usize) =
            bincode::serde::decode_from_slice(&bytes, bincode::config::standard())
                .map_err(|e| IndexError::Codec(e.to_string()))?;

        if blob.format_version > INDEX_FORMAT_VERSION {
            return Err(IndexError::Corrupt(format!(
                "format version {} is newer than supported {}",
                blob.format_version, INDEX_FORMAT_VERSION
            )));
        }

        if blob.embedder_model != self.embedder.model_id()
            || blob.dimension != self.embedder.dimension()
        {
            return Err(IndexError::EmbedderMismatch {
                expected: self.embedder.model_id().to_string(),
                expected_dimension: self.embedder.dimension(),
                found: blob.embedder_model,
                found_dimension: blob.dimension,
            });
        }

        let index = FlatIndex::from_raw(blob.dimension, blob.vectors).ok_or_else(|| {
            IndexError::Corrupt("vector data is not a whole number of rows".to_string())
        })?;

        let json =
            std::fs::read_to_string(&bundle_path).map_err(|e| IndexError::io(&bundle_path, e))?;
        let bundle: DocumentBundle =
            serde_json::from_str(&json).map_err(|e| IndexError::Codec(e.to_string()))?;

        if bundle.documents.len() != index.len() || bundle.metadata.len() != index.len() {
            return Err(IndexError::Corrupt(format!(
                "{} vectors, {} documents, {} metadata entries",
                index.len(),
                bundle.documents.len(),
                bundle.metadata.len()
            )));
        }

        info!(path = %base.display(), vectors = index.len(), "Evidence index loaded");

        self.index = Some(index);
        self.documents = bundle.documents;
        self.metadata = bundle.metadata;
        Ok(())
    }

    /// The `k` chunks nearest to `query`, most similar first.
    ///
    /// Returns exactly `min(k, len())` chunks; `k` larger than the index is
    /// clamped rather than rejected.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<EvidenceChunk>, IndexError> {
        let index = self.index.as_ref().ok_or(IndexError::NotBuilt)?;

        let mut embedded = self.embedder.embed(&[query.to_string()]).await?;
        let query_vector = match embedded.pop() {
            Some(v) if embedded.is_empty() => v,
            _ => {
                return Err(EmbeddingError::CountMismatch {
                    expected: 1,
                    actual: embedded.len() + 1,
                }
                .into())
            }
        };
        if query_vector.len() != index.dimension() {
            return Err(EmbeddingError::DimensionMismatch {
                expected: index.dimension(),
                actual: query_vector.len(),
            }
            .into());
        }

        let chunks: Vec<EvidenceChunk> = index
            .search(&query_vector, k)
            .into_iter()
            .map(|(row, score)| EvidenceChunk {
                text: self.documents[row].clone(),
                metadata: self.metadata[row].clone(),
                score,
            })
            .collect();

        debug!(
            query = %truncate(query, 50),
            hits = chunks.len(),
            "Retrieved evidence"
        );
        Ok(chunks)
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::super::embedding::HashingEmbedder;
    use super::*;

    fn embedder() -> Arc<dyn Embedder> {
        Arc::new(HashingEmbedder::new(128))
    }

    fn corpus() -> Vec<String> {
        vec![
            "Chlorophyll absorbs red and blue light".to_string(),
            "The Calvin cycle fixes carbon dioxide".to_string(),
            "Stomata regulate gas exchange in leaves".to_string(),
        ]
    }

    #[tokio::test]
    async fn test_build_rejects_empty() {
        let mut index = EvidenceIndex::new(embedder());
        let err = index.build(vec![], None).await.unwrap_err();
        assert!(matches!(err, IndexError::Configuration(_)));
        assert!(!index.is_ready());
    }

    #[tokio::test]
    async fn test_build_rejects_misaligned_metadata() {
        let mut index = EvidenceIndex::new(embedder());
        let err = index
            .build(corpus(), Some(vec![Metadata::new()]))
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_retrieve_before_build() {
        let index = EvidenceIndex::new(embedder());
        let err = index.retrieve("anything", 3).await.unwrap_err();
        assert!(matches!(err, IndexError::NotBuilt));
    }

    #[tokio::test]
    async fn test_exact_text_ranks_first() {
        let mut index = EvidenceIndex::new(embedder());
        index.build(corpus(), None).await.unwrap();

        let hits = index
            .retrieve("The Calvin cycle fixes carbon dioxide", 3)
            .await
            .unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].text, "The Calvin cycle fixes carbon dioxide");
        assert!(hits[0].score.abs() < 1e-6);
        assert!(hits.windows(2).all(|w| w[0].score <= w[1].score));
    }

    #[tokio::test]
    async fn test_k_clamped_to_size() {
        let mut index = EvidenceIndex::new(embedder());
        index.build(corpus(), None).await.unwrap();
        assert_eq!(index.retrieve("light", 50).await.unwrap().len(), 3);
        assert_eq!(index.retrieve("light", 2).await.unwrap().len(), 2);
        assert!(index.retrieve("light", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_default_metadata_is_empty_map() {
        let mut index = EvidenceIndex::new(embedder());
        index.build(corpus(), None).await.unwrap();
        let hits = index.retrieve("stomata", 1).await.unwrap();
        assert!(hits[0].metadata.is_empty());
    }

    #[tokio::test]
    async fn test_persist_before_build() {
        let dir = tempfile::tempdir().unwrap();
        let index = EvidenceIndex::new(embedder());
        let err = index.persist(&dir.path().join("idx")).unwrap_err();
        assert!(matches!(err, IndexError::NotBuilt));
    }

    #[tokio::test]
    async fn test_load_missing() {
        let dir = tempfile::tempdir().unwrap();
        let mut index = EvidenceIndex::new(embedder());
        let err = index.load(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, IndexError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_load_requires_both_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("store").join("idx");

        let mut index = EvidenceIndex::new(embedder());
        index.build(corpus(), None).await.unwrap();
        index.persist(&base).unwrap();

        let (_, bundle) = index_paths(&base);
        std::fs::remove_file(&bundle).unwrap();

        let mut fresh = EvidenceIndex::new(embedder());
        let err = fresh.load(&base).unwrap_err();
        assert!(matches!(err, IndexError::NotFound { path } if path == bundle));
    }

    #[tokio::test]
    async fn test_load_rejects_other_embedder() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("idx");

        let mut index = EvidenceIndex::new(embedder());
        index.build(corpus(), None).await.unwrap();
        index.persist(&base).unwrap();

        let mut other = EvidenceIndex::new(Arc::new(HashingEmbedder::new(64)));
        let err = other.load(&base).unwrap_err();
        assert!(matches!(err, IndexError::EmbedderMismatch { .. }));
        assert!(!other.is_ready());
    }

    #[tokio::test]
    async fn test_load_detects_row_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("idx");

        let mut index = EvidenceIndex::new(embedder());
        index.build(corpus(), None).await.unwrap();
        index.persist(&base).unwrap();

        let (_, bundle_path) = index_paths(&base);
        let bundle = DocumentBundle {
            documents: vec!["only one".to_string()],
            metadata: vec![Metadata::new()],
        };
        std::fs::write(&bundle_path, serde_json::to_string(&bundle).unwrap()).unwrap();

        let mut fresh = EvidenceIndex::new(embedder());
        assert!(matches!(
            fresh.load(&base).unwrap_err(),
            IndexError::Corrupt(_)
        ));
    }

    #[test]
    fn test_index_paths() {
        let (blob, bundle) = index_paths(Path::new("data/vector_store/evidence_index"));
        assert_eq!(blob, PathBuf::from("data/vector_store/evidence_index.index"));
        assert_eq!(bundle, PathBuf::from("data/vector_store/evidence_index.json"));
    }
}
