//! `quiz-agents`: debate a topic over a document corpus and emit one
//! multiple-choice question.
//!
//! # Usage
//!
//! ```bash
//! # First run: index data/raw_docs, then debate
//! GEMINI_API_KEY=... quiz-agents --topic "Photosynthesis" --ingest
//!
//! # Later runs reuse the persisted index
//! quiz-agents --topic "Photosynthesis" --rounds 3 --output out/quiz.json
//!
//! # Single-call baseline for comparison
//! quiz-agents --topic "Photosynthesis" --baseline
//! ```

use std::process::ExitCode;

use clap::Parser;
use quiz_agents::{Args, QuizConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match QuizConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    info!(
        model = %config.generation_model,
        embedding = %config.embedding.model_id(),
        topic = %args.topic,
        "Quiz agents starting"
    );

    match quiz_agents::run(&args, &config).await {
        Ok(outcome) => {
            println!("{}", outcome.quiz.render());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
