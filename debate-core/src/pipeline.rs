//! End-to-end wiring: topic → debate → judge → quiz artifact.

use std::sync::Arc;

use tracing::info;

use crate::debate::{DebateAgent, DebateError, DebateOrchestrator, DebateSession};
use crate::generation::GenerationClient;
use crate::index::EvidenceIndex;
use crate::quiz::{BaselineGenerator, JudgeSynthesizer, QuizArtifact};

/// A finished debate and the quiz synthesized from it.
#[derive(Debug, Clone)]
pub struct DebateQuiz {
    pub quiz: QuizArtifact,
    pub session: DebateSession,
}

/// Both agents, the judge and the baseline over one index and one client.
pub struct QuizPipeline {
    orchestrator: DebateOrchestrator,
    judge: JudgeSynthesizer,
    baseline: BaselineGenerator,
}

impl QuizPipeline {
    /// Wire a pipeline whose agents retrieve `top_k` chunks per turn.
    pub fn new(
        index: Arc<EvidenceIndex>,
        client: Arc<dyn GenerationClient>,
        top_k: usize,
    ) -> Result<Self, DebateError> {
        let orchestrator = DebateOrchestrator::new(
            DebateAgent::supporting(index.clone(), client.clone()).with_top_k(top_k),
            DebateAgent::opposing(index.clone(), client.clone()).with_top_k(top_k),
        )?;
        info!(top_k, documents = index.len(), "Quiz pipeline initialized");
        Ok(Self {
            orchestrator,
            judge: JudgeSynthesizer::new(client.clone()),
            baseline: BaselineGenerator::new(index, client),
        })
    }

    pub fn orchestrator(&self) -> &DebateOrchestrator {
        &self.orchestrator
    }

    /// Open a new debate session.
    pub fn start(&self, topic: &str, rounds: u32) -> Result<DebateSession, DebateError> {
        self.orchestrator.start(topic, rounds)
    }

    /// Run the remaining rounds of `session`, calling `on_round` after each.
    pub async fn run_debate<F>(
        &self,
        session: &mut DebateSession,
        on_round: F,
    ) -> Result<(), DebateError>
    where
        F: FnMut(&DebateSession),
    {
        self.orchestrator.run_with(session, on_round).await
    }

    /// Judge a finished session. Always returns an artifact.
    pub async fn synthesize(&self, session: &DebateSession, include_transcript: bool) -> QuizArtifact {
        info!("Judge generating quiz from debate...");
        let quiz = self
            .judge
            .synthesize(session.topic.as_str(), &session.transcript)
            .await;
        if include_transcript {
            quiz.with_transcript(session.transcript.render())
        } else {
            quiz
        }
    }

    /// Debate `topic` for `rounds` rounds and synthesize a quiz.
    pub async fn generate(&self, topic: &str, rounds: u32) -> Result<DebateQuiz, DebateError> {
        let mut session = self.start(topic, rounds)?;
        self.run_debate(&mut session, |_| {}).await?;
        let quiz = self.synthesize(&session, true).await;
        Ok(DebateQuiz { quiz, session })
    }

    /// Single-call baseline quiz, no debate.
    pub async fn baseline(&self, topic: &str) -> QuizArtifact {
        self.baseline.generate(topic).await
    }
}
