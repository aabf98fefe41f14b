//! Debate Core Library
//!
//! Retrieval-augmented multi-agent debate for quiz generation:
//! - Evidence index: flat nearest-neighbour search over embedded text chunks,
//!   persisted as a bincode blob plus a JSON document bundle
//! - Debate agents: a Proponent and an Opponent that each formulate a search
//!   query, retrieve evidence and argue their side
//! - Debate orchestrator: a fixed-round state machine with an append-only
//!   transcript and JSON checkpoints
//! - Judge synthesis: one model call turning the transcript into a validated
//!   multiple-choice question, with deterministic fallback on any failure
//!
//! Network access lives outside this crate. Model calls enter through
//! [`GenerationClient`] and embeddings through [`Embedder`].
//!
//! # Data Flow
//!
//! ```text
//! topic ─▶ DebateOrchestrator ─┬─▶ DebateAgent (supporting) ─┐
//!                              │        ▲        │           │ EvidenceIndex
//!                              │        └ transcript ◀───────┤ GenerationClient
//!                              └─▶ DebateAgent (opposing) ───┘
//!                                          │
//!                                          ▼
//!                               JudgeSynthesizer ─▶ QuizArtifact
//! ```

#![allow(dead_code)]
#![allow(clippy::uninlined_format_args)]

pub mod debate;
pub mod generation;
pub mod index;
pub mod pipeline;
pub mod prompts;
pub mod quiz;

// Re-export key debate types
pub use debate::{
    AgentTurn, CheckpointWriter, DebateAgent, DebateCheckpoint, DebateError, DebateOrchestrator,
    DebatePhase, DebateRole, DebateSession, DebateTranscript, DebateTurn, IntegrityStatus,
    PersistenceError, Topic,
};

// Re-export generation types
pub use generation::{GenerationClient, GenerationError, TimeoutClient};

// Re-export index types
pub use index::{
    Embedder, EmbeddingError, EvidenceChunk, EvidenceIndex, HashingEmbedder, IndexError, Metadata,
};

// Re-export quiz types
pub use pipeline::{DebateQuiz, QuizPipeline};
pub use prompts::PROMPT_VERSION;
pub use quiz::{
    BaselineGenerator, JudgeSynthesizer, QuizArtifact, QuizContent, QuizMethod, SchemaError,
    SynthesisError,
};
