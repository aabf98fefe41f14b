//! Judge synthesis: one generation call that turns a finished debate into a
//! multiple-choice question with graded distractors.

use std::sync::Arc;

use tracing::{error, info};

use super::parse::{parse_quiz, QuizContent, SynthesisError};
use super::{QuizArtifact, QuizMethod};
use crate::debate::DebateTranscript;
use crate::generation::GenerationClient;
use crate::prompts;

pub struct JudgeSynthesizer {
    client: Arc<dyn GenerationClient>,
}

impl JudgeSynthesizer {
    pub fn new(client: Arc<dyn GenerationClient>) -> Self {
        info!("Initialized quiz judge");
        Self { client }
    }

    /// Generate and validate quiz content, surfacing the failure cause.
    pub async fn try_synthesize(
        &self,
        topic: &str,
        transcript: &DebateTranscript,
    ) -> Result<QuizContent, SynthesisError> {
        let prompt = prompts::judge_prompt(topic, &transcript.render());
        let response = self.client.generate(&prompt).await?;

        parse_quiz(&response).inspect_err(|e| {
            if matches!(e, SynthesisError::Parse(_)) {
                let head: String = response.chars().take(500).collect();
                error!(response = %head, "Judge returned unparseable JSON");
            }
        })
    }

    /// Turn the debate into a quiz. Never fails: any generation, parse or
    /// schema failure yields [`QuizArtifact::fallback`].
    pub async fn synthesize(&self, topic: &str, transcript: &DebateTranscript) -> QuizArtifact {
        match self.try_synthesize(topic, transcript).await {
            Ok(content) => {
                info!("Successfully generated quiz question");
                QuizArtifact::from_content(content, topic, QuizMethod::MultiAgentDebate)
            }
            Err(e) => {
                error!(error = %e, "Quiz synthesis failed; returning fallback");
                QuizArtifact::fallback(topic, QuizMethod::MultiAgentDebate, &e)
            }
        }
    }
}
