//! Evidence Index: flat nearest-neighbour retrieval over text chunks
//!
//! ```text
//! texts ──embed──▶ FlatIndex (row-major f32)
//!   │                    │
//!   └─ documents ────────┤  positionally aligned
//!   └─ metadata  ────────┘
//!
//! persist(P) → P.index (bincode blob) + P.json (documents, metadata)
//! ```

pub mod embedding;
pub mod flat;
pub mod store;

pub use embedding::{
    Embedder, EmbeddingError, HashingEmbedder, DEFAULT_HASHING_DIMENSION, HASHING_MODEL_ID,
};
pub use flat::{squared_l2, FlatIndex};
pub use store::{
    index_exists, index_paths, EvidenceChunk, EvidenceIndex, IndexError, Metadata,
    INDEX_FORMAT_VERSION,
};
