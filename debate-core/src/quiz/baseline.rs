//! Single-agent baseline: retrieve context for the topic and ask for a quiz
//! in one call, with no debate. Used to compare against the debate pipeline.

use std::sync::Arc;

use tracing::{error, info, warn};

use super::parse::{parse_quiz, QuizContent, SynthesisError};
use super::{QuizArtifact, QuizMethod};
use crate::generation::GenerationClient;
use crate::index::EvidenceIndex;
use crate::prompts;

/// Context chunks retrieved for the baseline prompt.
pub const BASELINE_TOP_K: usize = 5;

pub struct BaselineGenerator {
    index: Arc<EvidenceIndex>,
    client: Arc<dyn GenerationClient>,
    top_k: usize,
}

impl BaselineGenerator {
    pub fn new(index: Arc<EvidenceIndex>, client: Arc<dyn GenerationClient>) -> Self {
        info!("Initialized baseline single agent");
        Self {
            index,
            client,
            top_k: BASELINE_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    async fn context(&self, topic: &str) -> String {
        match self.index.retrieve(topic, self.top_k).await {
            Ok(chunks) if !chunks.is_empty() => prompts::number_blocks("Context", &chunks),
            Ok(_) => prompts::NO_CONTEXT.to_string(),
            Err(e) => {
                warn!(error = %e, "Baseline retrieval failed");
                prompts::NO_CONTEXT.to_string()
            }
        }
    }

    pub async fn try_generate(&self, topic: &str) -> Result<QuizContent, SynthesisError> {
        let context = self.context(topic).await;
        let prompt = prompts::baseline_prompt(topic, &context);
        let response = self.client.generate(&prompt).await?;
        parse_quiz(&response)
    }

    /// Generate a quiz without debate. Never fails; see
    /// [`QuizArtifact::fallback`].
    pub async fn generate(&self, topic: &str) -> QuizArtifact {
        match self.try_generate(topic).await {
            Ok(content) => {
                info!("Successfully generated baseline quiz");
                QuizArtifact::from_content(content, topic, QuizMethod::BaselineSingleAgent)
            }
            Err(e) => {
                error!(error = %e, "Baseline quiz generation failed; returning fallback");
                QuizArtifact::fallback(topic, QuizMethod::BaselineSingleAgent, &e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::MockGenerationClient;
    use crate::index::HashingEmbedder;

    async fn index(n: usize) -> Arc<EvidenceIndex> {
        let mut index = EvidenceIndex::new(Arc::new(HashingEmbedder::new(32)));
        let texts = (0..n).map(|i| format!("fact number {}", i)).collect();
        index.build(texts, None).await.unwrap();
        Arc::new(index)
    }

    #[tokio::test]
    async fn test_baseline_uses_five_context_blocks() {
        let mut mock = MockGenerationClient::new();
        mock.expect_generate()
            .withf(|p: &str| p.contains("[Context 5]:") && !p.contains("[Context 6]:"))
            .times(1)
            .returning(|_| {
                Ok(r#"{"question": "Q", "correct_answer": "A",
                       "distractors": ["B", "C", "D"], "explanation": "E"}"#
                    .to_string())
            });

        let baseline = BaselineGenerator::new(index(8).await, Arc::new(mock));
        let quiz = baseline.generate("facts").await;
        assert!(!quiz.is_fallback());
        assert_eq!(quiz.method, QuizMethod::BaselineSingleAgent);
        assert!(quiz.debate_transcript.is_none());
    }

    #[tokio::test]
    async fn test_baseline_falls_back_on_bad_json() {
        let mut mock = MockGenerationClient::new();
        mock.expect_generate()
            .returning(|_| Ok("not json at all".to_string()));

        let baseline = BaselineGenerator::new(index(2).await, Arc::new(mock));
        let quiz = baseline.generate("facts").await;
        assert!(quiz.is_fallback());
        assert_eq!(quiz.method, QuizMethod::BaselineSingleAgent);
    }

    #[tokio::test]
    async fn test_unbuilt_index_uses_placeholder() {
        let mut mock = MockGenerationClient::new();
        mock.expect_generate()
            .withf(|p: &str| p.contains(prompts::NO_CONTEXT))
            .returning(|_| Ok("{}".to_string()));

        let empty = Arc::new(EvidenceIndex::new(Arc::new(HashingEmbedder::new(8))));
        let quiz = BaselineGenerator::new(empty, Arc::new(mock))
            .generate("facts")
            .await;
        assert!(quiz.question.contains("Missing required key: question"));
    }
}
