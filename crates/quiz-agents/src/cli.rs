//! Command-line surface and the run loop behind it.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use debate_core::debate::{
    load_checkpoint, CheckpointWriter, DebatePhase, DebateSession, IntegrityStatus,
};
use debate_core::index::{index_exists, EvidenceIndex, HashingEmbedder};
use debate_core::{Embedder, GenerationClient, QuizArtifact, QuizPipeline, TimeoutClient};
use tracing::{info, warn};

use crate::config::{EmbeddingBackend, QuizConfig};
use crate::gemini::{build_gemini_client, GeminiClient, GeminiEmbedder};
use crate::ingest::{ingest, TextSplitter};
use crate::telemetry::{append_run, RunRecord};

/// Generate a multiple-choice quiz question by debating a topic over your documents
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Topic to debate and generate a quiz for
    #[arg(long)]
    pub topic: String,

    /// Number of debate rounds (overrides MAX_DEBATE_ROUNDS)
    #[arg(long)]
    pub rounds: Option<u32>,

    /// Output file path
    #[arg(long, default_value = "quiz_output.json")]
    pub output: PathBuf,

    /// Ingest documents from <data>/raw_docs before running
    #[arg(long, default_value_t = false)]
    pub ingest: bool,

    /// Skip the debate and generate from retrieved context in a single call
    #[arg(long, default_value_t = false)]
    pub baseline: bool,

    /// Checkpoint file; written after every round and resumed if present
    #[arg(long)]
    pub checkpoint: Option<PathBuf>,

    /// Leave the debate transcript out of the saved quiz
    #[arg(long, default_value_t = false)]
    pub no_transcript: bool,
}

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub quiz: QuizArtifact,
    pub rounds: u32,
    pub degraded_turns: usize,
}

/// Embedder selected by the configuration.
pub fn build_embedder(config: &QuizConfig) -> Result<Arc<dyn Embedder>> {
    Ok(match &config.embedding {
        EmbeddingBackend::Hashing => Arc::new(HashingEmbedder::new(config.embedding_dimension)),
        EmbeddingBackend::Gemini { model } => {
            let client = build_gemini_client(&config.api_key, &config.api_base)?;
            Arc::new(GeminiEmbedder::new(client, model, config.embedding_dimension))
        }
    })
}

/// Gemini generation client with the configured per-call timeout.
pub fn build_client(config: &QuizConfig) -> Result<Arc<dyn GenerationClient>> {
    let client = GeminiClient::from_config(config).context("Failed to build Gemini client")?;
    Ok(Arc::new(TimeoutClient::new(client, config.generation_timeout)))
}

/// Ingest if asked, otherwise load the persisted index.
pub async fn prepare_index(
    args: &Args,
    config: &QuizConfig,
    embedder: Arc<dyn Embedder>,
) -> Result<EvidenceIndex> {
    let base = config.index_base();

    if args.ingest {
        info!(dir = %config.raw_docs_dir().display(), "Ingesting documents...");
        let splitter = TextSplitter::new(config.chunk_size, config.chunk_overlap);
        return ingest(&config.raw_docs_dir(), &base, &splitter, embedder)
            .await
            .context("Document ingestion failed");
    }

    if !index_exists(&base) {
        bail!(
            "No evidence index found at {}. Run with --ingest first.",
            base.display()
        );
    }
    EvidenceIndex::open(embedder, &base)
        .with_context(|| format!("Failed to load evidence index from {}", base.display()))
}

/// Fresh session, or the session stored in `--checkpoint` if one exists.
///
/// A resumed session keeps its stored round count; an explicit `--rounds`
/// that disagrees with it is refused.
fn open_session(
    args: &Args,
    pipeline: &QuizPipeline,
    rounds: u32,
) -> Result<(DebateSession, Option<CheckpointWriter>)> {
    let Some(path) = &args.checkpoint else {
        return Ok((pipeline.start(&args.topic, rounds)?, None));
    };

    if !path.exists() {
        let session = pipeline.start(&args.topic, rounds)?;
        return Ok((session, Some(CheckpointWriter::new(path))));
    }

    let (checkpoint, status) = load_checkpoint(path)
        .with_context(|| format!("Failed to restore checkpoint {}", path.display()))?;
    if let IntegrityStatus::Recoverable { warnings } = &status {
        for w in warnings {
            warn!(path = %path.display(), "Checkpoint warning: {w}");
        }
    }
    if checkpoint.session.topic.as_str().trim() != args.topic.trim() {
        bail!(
            "Checkpoint {} is for topic {:?}, not {:?}",
            path.display(),
            checkpoint.session.topic.as_str(),
            args.topic
        );
    }
    if let Some(requested) = args.rounds {
        if requested != checkpoint.session.max_rounds {
            bail!(
                "Checkpoint {} was started with {} rounds, not {}. Drop --rounds or use a new checkpoint.",
                path.display(),
                checkpoint.session.max_rounds,
                requested
            );
        }
    }

    info!(
        path = %path.display(),
        status = %checkpoint.session.status_line(),
        "Resuming debate from checkpoint"
    );
    let writer = CheckpointWriter::resuming(path, &checkpoint);
    Ok((checkpoint.session, Some(writer)))
}

/// Produce, save and record one quiz.
pub async fn execute(
    args: &Args,
    config: &QuizConfig,
    client: Arc<dyn GenerationClient>,
    embedder: Arc<dyn Embedder>,
) -> Result<RunOutcome> {
    let started = Instant::now();
    let index = Arc::new(prepare_index(args, config, embedder).await?);
    let pipeline = QuizPipeline::new(index, client, config.top_k)?;

    let outcome = if args.baseline {
        let quiz = pipeline.baseline(&args.topic).await;
        RunOutcome {
            quiz,
            rounds: 0,
            degraded_turns: 0,
        }
    } else {
        let rounds = args.rounds.unwrap_or(config.max_rounds);
        let (mut session, mut writer) = open_session(args, &pipeline, rounds)?;

        if session.phase == DebatePhase::Completed {
            info!("Checkpointed debate already complete, judging it directly");
        } else {
            pipeline
                .run_debate(&mut session, |s| {
                    if let Some(w) = writer.as_mut() {
                        if let Err(e) = w.write(s, "round complete") {
                            warn!("Failed to write checkpoint: {e}");
                        }
                    }
                })
                .await?;
        }

        let quiz = pipeline.synthesize(&session, !args.no_transcript).await;
        RunOutcome {
            quiz,
            rounds: session.current_round,
            degraded_turns: session.transcript.degraded_count(),
        }
    };

    outcome
        .quiz
        .save(&args.output)
        .with_context(|| format!("Failed to save quiz to {}", args.output.display()))?;
    info!(path = %args.output.display(), "Quiz saved");

    let record = RunRecord::new(
        uuid::Uuid::new_v4().to_string(),
        &outcome.quiz,
        outcome.rounds,
        outcome.degraded_turns,
        started.elapsed(),
    )
    .with_models(&config.generation_model, config.embedding.model_id());
    append_run(&record, &config.telemetry_path());

    Ok(outcome)
}

/// Run against the live Gemini backends.
pub async fn run(args: &Args, config: &QuizConfig) -> Result<RunOutcome> {
    let client = build_client(config)?;
    let embedder = build_embedder(config)?;
    execute(args, config, client, embedder).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["quiz-agents", "--topic", "Photosynthesis"]).unwrap();
        assert_eq!(args.topic, "Photosynthesis");
        assert_eq!(args.rounds, None);
        assert_eq!(args.output, PathBuf::from("quiz_output.json"));
        assert!(!args.ingest && !args.baseline && !args.no_transcript);
        assert!(args.checkpoint.is_none());
    }

    #[test]
    fn test_all_flags() {
        let args = Args::try_parse_from([
            "quiz-agents",
            "--topic",
            "Cell respiration",
            "--rounds",
            "3",
            "--output",
            "out/q.json",
            "--ingest",
            "--baseline",
            "--checkpoint",
            "ckpt.json",
            "--no-transcript",
        ])
        .unwrap();
        assert_eq!(args.rounds, Some(3));
        assert_eq!(args.output, PathBuf::from("out/q.json"));
        assert!(args.ingest && args.baseline && args.no_transcript);
        assert_eq!(args.checkpoint, Some(PathBuf::from("ckpt.json")));
    }

    #[test]
    fn test_topic_is_required() {
        assert!(Args::try_parse_from(["quiz-agents"]).is_err());
    }
}
