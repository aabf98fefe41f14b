//! Debate orchestrator: drives the supporting→opposing round loop.
//!
//! Owns the two agents and advances a [`DebateSession`] one turn at a time.
//! A round always runs to completion: a degraded turn is recorded like any
//! other, so `run(topic, n)` yields exactly `2n` turns.

use tracing::{info, warn};

use super::agent::DebateAgent;
use super::state::{DebatePhase, DebateRole, DebateSession, DebateTranscript, DebateTurn, Topic};

/// Error from the debate orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebateError {
    /// Topic was empty or whitespace-only.
    EmptyTopic,
    /// A debate needs at least one round.
    NoRounds,
    /// An agent was wired into the wrong seat.
    RoleMismatch {
        expected: DebateRole,
        actual: DebateRole,
    },
    /// State transition failed.
    TransitionFailed(String),
    /// Debate was already completed.
    AlreadyComplete,
}

impl std::fmt::Display for DebateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTopic => write!(f, "topic must not be empty"),
            Self::NoRounds => write!(f, "a debate needs at least one round"),
            Self::RoleMismatch { expected, actual } => {
                write!(f, "expected the {} agent, got the {} agent", expected, actual)
            }
            Self::TransitionFailed(msg) => write!(f, "transition failed: {}", msg),
            Self::AlreadyComplete => write!(f, "debate already complete"),
        }
    }
}

impl std::error::Error for DebateError {}

impl From<super::state::TransitionError> for DebateError {
    fn from(e: super::state::TransitionError) -> Self {
        Self::TransitionFailed(e.to_string())
    }
}

/// The debate orchestrator.
///
/// Usage:
/// 1. `start()` a session for a topic and round count
/// 2. `run_round()` until `has_rounds_remaining()` is false, or `run_with()`
///    to run every remaining round with a per-round hook
/// 3. Read `session.transcript`
///
/// `run()` does all three.
#[derive(Debug)]
pub struct DebateOrchestrator {
    supporting: DebateAgent,
    opposing: DebateAgent,
}

impl DebateOrchestrator {
    /// Seat the two agents. Each must hold the role of its seat.
    pub fn new(supporting: DebateAgent, opposing: DebateAgent) -> Result<Self, DebateError> {
        for (agent, seat) in [
            (&supporting, DebateRole::Supporting),
            (&opposing, DebateRole::Opposing),
        ] {
            if agent.role() != seat {
                return Err(DebateError::RoleMismatch {
                    expected: seat,
                    actual: agent.role(),
                });
            }
        }
        Ok(Self {
            supporting,
            opposing,
        })
    }

    pub fn supporting(&self) -> &DebateAgent {
        &self.supporting
    }

    pub fn opposing(&self) -> &DebateAgent {
        &self.opposing
    }

    fn agent_for(&self, role: DebateRole) -> &DebateAgent {
        match role {
            DebateRole::Supporting => &self.supporting,
            DebateRole::Opposing => &self.opposing,
        }
    }

    /// Create a session and open round 1.
    pub fn start(&self, topic: &str, num_rounds: u32) -> Result<DebateSession, DebateError> {
        let topic = Topic::new(topic).ok_or(DebateError::EmptyTopic)?;
        if num_rounds == 0 {
            return Err(DebateError::NoRounds);
        }

        let mut session = DebateSession::new(topic, num_rounds);
        session.start()?;
        info!(
            session = %session.id,
            topic = %session.topic,
            rounds = num_rounds,
            "Starting debate"
        );
        Ok(session)
    }

    /// Run exactly one full round, resuming from wherever `session` stands.
    ///
    /// From `RoundComplete` the next round is opened first; from a turn phase
    /// the remaining turns of the current round are taken.
    pub async fn run_round(&self, session: &mut DebateSession) -> Result<(), DebateError> {
        match session.phase {
            DebatePhase::Completed | DebatePhase::Aborted => {
                return Err(DebateError::AlreadyComplete)
            }
            DebatePhase::Idle => session.start()?,
            DebatePhase::RoundComplete => {
                if !session.has_rounds_remaining() {
                    return Err(DebateError::AlreadyComplete);
                }
                session.next_round()?;
            }
            DebatePhase::SupportingTurn | DebatePhase::OpposingTurn => {}
        }

        info!("--- Round {} ---", session.current_round);

        while let Some(role) = session.phase.speaker() {
            let agent = self.agent_for(role);
            let turn = agent.take_turn(&session.topic, &session.transcript).await;

            info!(
                agent = agent.name(),
                round = session.current_round,
                degraded = turn.degraded,
                "{} argument: {}...",
                role.label(),
                truncate(&turn.argument, 100)
            );

            session.record_turn(DebateTurn::new(
                session.current_round,
                role,
                agent.name(),
                turn.argument,
                turn.degraded,
            ))?;
        }

        Ok(())
    }

    /// Run every remaining round, calling `on_round` after each, then close
    /// the session.
    pub async fn run_with<F>(
        &self,
        session: &mut DebateSession,
        mut on_round: F,
    ) -> Result<(), DebateError>
    where
        F: FnMut(&DebateSession),
    {
        if session.is_complete() {
            return Err(DebateError::AlreadyComplete);
        }
        if session.max_rounds == 0 {
            return Err(DebateError::NoRounds);
        }

        loop {
            let mid_round = session.phase.speaker().is_some();
            if !mid_round && !session.has_rounds_remaining() {
                break;
            }
            self.run_round(session).await?;
            on_round(session);
        }

        session.complete()?;

        let degraded = session.transcript.degraded_count();
        if degraded > 0 {
            warn!(degraded, "Debate completed with degraded turns");
        }
        info!(
            session = %session.id,
            turns = session.transcript.len(),
            "Debate completed"
        );
        Ok(())
    }

    /// Run a whole debate and return its transcript of `2 * num_rounds` turns.
    pub async fn run(&self, topic: &str, num_rounds: u32) -> Result<DebateTranscript, DebateError> {
        let mut session = self.start(topic, num_rounds)?;
        self.run_with(&mut session, |_| {}).await?;
        Ok(session.transcript)
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::generation::{GenerationClient, GenerationError, MockGenerationClient};
    use crate::index::{EvidenceIndex, HashingEmbedder};

    async fn index() -> Arc<EvidenceIndex> {
        let mut index = EvidenceIndex::new(Arc::new(HashingEmbedder::new(32)));
        index
            .build(vec!["Leaves are green".to_string()], None)
            .await
            .unwrap();
        Arc::new(index)
    }

    fn echo_client() -> Arc<dyn GenerationClient> {
        let mut mock = MockGenerationClient::new();
        mock.expect_generate().returning(|p| {
            if p.contains("search query") {
                Ok("leaves".to_string())
            } else if p.contains("supporting the topic") {
                Ok("for".to_string())
            } else {
                Ok("against".to_string())
            }
        });
        Arc::new(mock)
    }

    async fn orchestrator(client: Arc<dyn GenerationClient>) -> DebateOrchestrator {
        let index = index().await;
        DebateOrchestrator::new(
            DebateAgent::supporting(index.clone(), client.clone()),
            DebateAgent::opposing(index, client),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_new_rejects_swapped_agents() {
        let index = index().await;
        let client = echo_client();
        let err = DebateOrchestrator::new(
            DebateAgent::opposing(index.clone(), client.clone()),
            DebateAgent::supporting(index, client),
        )
        .unwrap_err();
        assert_eq!(
            err,
            DebateError::RoleMismatch {
                expected: DebateRole::Supporting,
                actual: DebateRole::Opposing,
            }
        );
    }

    #[tokio::test]
    async fn test_start_validates_input() {
        let orch = orchestrator(echo_client()).await;
        assert_eq!(orch.start("   ", 2).unwrap_err(), DebateError::EmptyTopic);
        assert_eq!(orch.start("Leaves", 0).unwrap_err(), DebateError::NoRounds);

        let session = orch.start("Leaves", 2).unwrap();
        assert_eq!(session.phase, DebatePhase::SupportingTurn);
        assert_eq!(session.current_round, 1);
    }

    #[tokio::test]
    async fn test_run_alternates_roles() {
        let orch = orchestrator(echo_client()).await;
        let transcript = orch.run("Leaves", 3).await.unwrap();

        assert_eq!(transcript.len(), 6);
        for (i, turn) in transcript.iter().enumerate() {
            let expected = if i % 2 == 0 {
                DebateRole::Supporting
            } else {
                DebateRole::Opposing
            };
            assert_eq!(turn.role, expected);
            assert_eq!(turn.round as usize, i / 2 + 1);
        }
        assert_eq!(transcript.turns()[0].argument, "for");
        assert_eq!(transcript.turns()[1].argument, "against");
        assert_eq!(transcript.turns()[1].speaker, "TA_Opponent");
    }

    #[tokio::test]
    async fn test_run_round_one_at_a_time() {
        let orch = orchestrator(echo_client()).await;
        let mut session = orch.start("Leaves", 2).unwrap();

        orch.run_round(&mut session).await.unwrap();
        assert_eq!(session.phase, DebatePhase::RoundComplete);
        assert_eq!(session.transcript.len(), 2);

        orch.run_round(&mut session).await.unwrap();
        assert_eq!(session.current_round, 2);
        assert_eq!(session.transcript.len(), 4);

        assert_eq!(
            orch.run_round(&mut session).await.unwrap_err(),
            DebateError::AlreadyComplete
        );
    }

    #[tokio::test]
    async fn test_run_round_resumes_mid_round() {
        let orch = orchestrator(echo_client()).await;
        let mut session = orch.start("Leaves", 1).unwrap();
        session
            .record_turn(DebateTurn::new(
                1,
                DebateRole::Supporting,
                "TA_Proponent",
                "earlier",
                false,
            ))
            .unwrap();

        orch.run_round(&mut session).await.unwrap();
        assert_eq!(session.transcript.len(), 2);
        assert_eq!(session.transcript.turns()[0].argument, "earlier");
        assert_eq!(session.transcript.turns()[1].role, DebateRole::Opposing);
    }

    #[tokio::test]
    async fn test_run_with_calls_hook_per_round() {
        let orch = orchestrator(echo_client()).await;
        let mut session = orch.start("Leaves", 3).unwrap();
        let mut seen = Vec::new();

        orch.run_with(&mut session, |s| seen.push(s.transcript.len()))
            .await
            .unwrap();

        assert_eq!(seen, vec![2, 4, 6]);
        assert_eq!(session.phase, DebatePhase::Completed);
        assert_eq!(
            orch.run_with(&mut session, |_| {}).await.unwrap_err(),
            DebateError::AlreadyComplete
        );
    }

    #[tokio::test]
    async fn test_argument_prompt_keeps_opening_rounds() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Mutex;

        let prompts = Arc::new(Mutex::new(Vec::new()));
        let seen = prompts.clone();
        let count = AtomicUsize::new(0);
        let mut mock = MockGenerationClient::new();
        mock.expect_generate().returning(move |p| {
            if p.contains("search query") {
                return Ok("leaves".to_string());
            }
            seen.lock().unwrap().push(p.to_string());
            Ok(format!("argument {}", count.fetch_add(1, Ordering::SeqCst) + 1))
        });
        let orch = orchestrator(Arc::new(mock)).await;

        let transcript = orch.run("Leaves", 3).await.unwrap();
        assert_eq!(transcript.len(), 6);

        let prompts = prompts.lock().unwrap();
        let last = prompts.last().unwrap();
        assert!(last.contains("Round 1: Round 1 - Proponent: argument 1\n"));
        assert!(last.contains("Round 2: Round 1 - Opponent: argument 2\n"));
        assert!(last.contains("Round 5: Round 3 - Proponent: argument 5"));
        assert!(!last.contains("argument 6"));
    }

    #[tokio::test]
    async fn test_failures_do_not_abort() {
        let mut mock = MockGenerationClient::new();
        mock.expect_generate()
            .returning(|_| Err(GenerationError::RequestFailed("offline".into())));
        let orch = orchestrator(Arc::new(mock)).await;

        let transcript = orch.run("Leaves", 2).await.unwrap();
        assert_eq!(transcript.len(), 4);
        assert_eq!(transcript.degraded_count(), 4);
        assert!(transcript.turns()[0]
            .argument
            .starts_with("TA_Proponent encountered an error"));
    }

    #[test]
    fn test_debate_error_display() {
        assert_eq!(DebateError::EmptyTopic.to_string(), "topic must not be empty");
        assert_eq!(
            DebateError::AlreadyComplete.to_string(),
            "debate already complete"
        );
        let err = DebateError::RoleMismatch {
            expected: DebateRole::Opposing,
            actual: DebateRole::Supporting,
        };
        assert_eq!(err.to_string(), "expected the opposing agent, got the supporting agent");
    }
}
