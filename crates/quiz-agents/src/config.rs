use std::path::PathBuf;
use std::time::Duration;

use debate_core::index::{DEFAULT_HASHING_DIMENSION, HASHING_MODEL_ID};
use thiserror::Error;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-pro";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 768;

/// `EMBEDDING_MODEL` value that selects the offline hashing embedder.
pub const HASHING_EMBEDDING_MODEL: &str = "hashing";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set; export it before running")]
    MissingCredential(&'static str),

    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Which embedding function the evidence index uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbeddingBackend {
    /// Gemini embedding API.
    Gemini { model: String },
    /// Offline feature-hashing embedder.
    Hashing,
}

impl EmbeddingBackend {
    /// Model id recorded in the persisted index.
    pub fn model_id(&self) -> &str {
        match self {
            Self::Gemini { model } => model,
            Self::Hashing => HASHING_MODEL_ID,
        }
    }
}

/// Runtime configuration, read from the process environment.
#[derive(Clone)]
pub struct QuizConfig {
    pub api_key: String,
    pub generation_model: String,
    pub api_base: String,
    pub embedding: EmbeddingBackend,
    pub embedding_dimension: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub max_rounds: u32,
    pub generation_timeout: Duration,
    pub data_dir: PathBuf,
}

impl std::fmt::Debug for QuizConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuizConfig")
            .field("api_key", &"<redacted>")
            .field("generation_model", &self.generation_model)
            .field("api_base", &self.api_base)
            .field("embedding", &self.embedding)
            .field("embedding_dimension", &self.embedding_dimension)
            .field("chunk_size", &self.chunk_size)
            .field("chunk_overlap", &self.chunk_overlap)
            .field("top_k", &self.top_k)
            .field("max_rounds", &self.max_rounds)
            .field("generation_timeout", &self.generation_timeout)
            .field("data_dir", &self.data_dir)
            .finish()
    }
}

impl QuizConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = get("GEMINI_API_KEY").ok_or(ConfigError::MissingCredential("GEMINI_API_KEY"))?;

        let embedding = match get("EMBEDDING_MODEL") {
            Some(m) if m.eq_ignore_ascii_case(HASHING_EMBEDDING_MODEL) => EmbeddingBackend::Hashing,
            Some(model) => EmbeddingBackend::Gemini { model },
            None => EmbeddingBackend::Gemini {
                model: DEFAULT_EMBEDDING_MODEL.to_string(),
            },
        };
        let default_dimension = match embedding {
            EmbeddingBackend::Hashing => DEFAULT_HASHING_DIMENSION,
            EmbeddingBackend::Gemini { .. } => DEFAULT_EMBEDDING_DIMENSION,
        };

        let config = Self {
            api_key,
            generation_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.into()),
            api_base: get("GEMINI_API_BASE")
                .map(|b| b.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.into()),
            embedding,
            embedding_dimension: parse(&get, "EMBEDDING_DIMENSION", default_dimension)?,
            chunk_size: parse(&get, "CHUNK_SIZE", 1000)?,
            chunk_overlap: parse(&get, "CHUNK_OVERLAP", 200)?,
            top_k: parse(&get, "TOP_K_RETRIEVAL", 3)?,
            max_rounds: parse(&get, "MAX_DEBATE_ROUNDS", 2)?,
            generation_timeout: Duration::from_secs(parse(&get, "GENERATION_TIMEOUT_SECS", 120)?),
            data_dir: get("QUIZ_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data")),
        };

        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<(), ConfigError> {
        let positive: [(&'static str, u64); 5] = [
            ("EMBEDDING_DIMENSION", self.embedding_dimension as u64),
            ("CHUNK_SIZE", self.chunk_size as u64),
            ("TOP_K_RETRIEVAL", self.top_k as u64),
            ("MAX_DEBATE_ROUNDS", self.max_rounds as u64),
            ("GENERATION_TIMEOUT_SECS", self.generation_timeout.as_secs()),
        ];
        for (key, value) in positive {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key,
                    value: "0".into(),
                    reason: "must be at least 1".into(),
                });
            }
        }

        if self.chunk_overlap >= self.chunk_size {
            return Err(ConfigError::InvalidValue {
                key: "CHUNK_OVERLAP",
                value: self.chunk_overlap.to_string(),
                reason: format!("must be smaller than CHUNK_SIZE ({})", self.chunk_size),
            });
        }
        Ok(())
    }

    /// Directory scanned for source documents.
    pub fn raw_docs_dir(&self) -> PathBuf {
        self.data_dir.join("raw_docs")
    }

    /// Base path of the persisted evidence index.
    pub fn index_base(&self) -> PathBuf {
        self.data_dir.join("vector_store").join("evidence_index")
    }

    pub fn telemetry_path(&self) -> PathBuf {
        self.data_dir.join("telemetry.jsonl")
    }
}

fn parse<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}
