//! Quiz Agents
//!
//! Gemini-backed front end for `debate_core`: environment configuration,
//! rig-backed generation and embedding clients, document ingestion, run telemetry
//! and the `quiz-agents` command line.

#![allow(clippy::uninlined_format_args)]

pub mod cli;
pub mod config;
pub mod gemini;
pub mod ingest;
pub mod telemetry;

pub use cli::{execute, run, Args, RunOutcome};
pub use config::{ConfigError, EmbeddingBackend, QuizConfig};
