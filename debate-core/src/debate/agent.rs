//! Retrieval-augmented debate agent.
//!
//! Each turn: formulate a search query from the topic and the last two
//! transcript entries, pull the top-k evidence chunks, then argue the
//! agent's side against the whole transcript. The agent keeps no history of
//! its own; it reads the orchestrator's transcript.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::state::{DebateRole, DebateTranscript, DebateTurn, Topic};
use crate::generation::{GenerationClient, GenerationError};
use crate::index::EvidenceIndex;
use crate::prompts;

/// Transcript entries shown to the query formulation prompt.
pub const QUERY_HISTORY_WINDOW: usize = 2;

/// Evidence chunks retrieved per turn.
pub const DEFAULT_TOP_K: usize = 3;

/// What one agent produced on its turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentTurn {
    /// Argument text, or an agent-labelled error string.
    pub argument: String,
    /// Search query actually used for retrieval.
    pub query: String,
    /// Number of evidence chunks fed to the prompt.
    pub evidence_count: usize,
    /// Whether argument generation failed.
    pub degraded: bool,
}

pub struct DebateAgent {
    name: String,
    role: DebateRole,
    index: Arc<EvidenceIndex>,
    client: Arc<dyn GenerationClient>,
    top_k: usize,
}

impl std::fmt::Debug for DebateAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebateAgent")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("top_k", &self.top_k)
            .finish_non_exhaustive()
    }
}

impl DebateAgent {
    pub fn new(
        name: impl Into<String>,
        role: DebateRole,
        index: Arc<EvidenceIndex>,
        client: Arc<dyn GenerationClient>,
    ) -> Self {
        let name = name.into();
        info!(agent = %name, role = %role, "Initialized debate agent");
        Self {
            name,
            role,
            index,
            client,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// `TA_Proponent`, arguing for the topic.
    pub fn supporting(index: Arc<EvidenceIndex>, client: Arc<dyn GenerationClient>) -> Self {
        let role = DebateRole::Supporting;
        Self::new(role.default_agent_name(), role, index, client)
    }

    /// `TA_Opponent`, arguing against the topic.
    pub fn opposing(index: Arc<EvidenceIndex>, client: Arc<dyn GenerationClient>) -> Self {
        let role = DebateRole::Opposing;
        Self::new(role.default_agent_name(), role, index, client)
    }

    /// Override the evidence fan-out. Zero is raised to one.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> DebateRole {
        self.role
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Query used when the model cannot produce one.
    pub fn fallback_query(&self, topic: &str) -> String {
        match self.role {
            DebateRole::Supporting => topic.to_string(),
            DebateRole::Opposing => format!("limitations of {}", topic),
        }
    }

    /// Argument text substituted when generation fails.
    pub fn error_argument(&self, err: &GenerationError) -> String {
        format!("{} encountered an error: {}", self.name, err)
    }

    /// Ask the model for a short search query biased toward this agent's side.
    ///
    /// Falls back to [`fallback_query`](Self::fallback_query) on error or
    /// blank output.
    pub async fn formulate_query(&self, topic: &Topic, recent: &[DebateTurn]) -> String {
        let prompt = prompts::query_prompt(self.role, topic.as_str(), recent);

        match self.client.generate(&prompt).await {
            Ok(text) if !text.trim().is_empty() => {
                let query = text.trim().to_string();
                debug!(agent = %self.name, query = %query, "Generated search query");
                query
            }
            Ok(_) => {
                warn!(agent = %self.name, "Empty search query; using fallback");
                self.fallback_query(topic.as_str())
            }
            Err(e) => {
                warn!(agent = %self.name, error = %e, "Search query generation failed; using fallback");
                self.fallback_query(topic.as_str())
            }
        }
    }

    /// Retrieve evidence and render it as a labelled block.
    async fn gather_evidence(&self, query: &str) -> (String, usize) {
        match self.index.retrieve(query, self.top_k).await {
            Ok(chunks) if !chunks.is_empty() => {
                (prompts::number_blocks("Evidence", &chunks), chunks.len())
            }
            Ok(_) => (prompts::NO_EVIDENCE.to_string(), 0),
            Err(e) => {
                warn!(agent = %self.name, error = %e, "Evidence retrieval failed");
                (prompts::NO_EVIDENCE.to_string(), 0)
            }
        }
    }

    /// Take one turn against the transcript so far.
    ///
    /// Never fails: a generation error becomes an agent-labelled error string
    /// with `degraded` set, so the debate always continues.
    pub async fn take_turn(&self, topic: &Topic, transcript: &DebateTranscript) -> AgentTurn {
        let query = self
            .formulate_query(topic, transcript.recent(QUERY_HISTORY_WINDOW))
            .await;
        let (evidence, evidence_count) = self.gather_evidence(&query).await;

        let prompt = prompts::argument_prompt(
            self.role,
            topic.as_str(),
            &evidence,
            transcript.turns(),
        );

        let result = match self.client.generate(&prompt).await {
            Ok(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
            Ok(_) => Err(GenerationError::EmptyResponse),
            Err(e) => Err(e),
        };

        match result {
            Ok(argument) => {
                info!(
                    agent = %self.name,
                    chars = argument.len(),
                    evidence = evidence_count,
                    "Generated argument"
                );
                AgentTurn {
                    argument,
                    query,
                    evidence_count,
                    degraded: false,
                }
            }
            Err(e) => {
                warn!(agent = %self.name, error = %e, "Argument generation failed");
                AgentTurn {
                    argument: self.error_argument(&e),
                    query,
                    evidence_count,
                    degraded: true,
                }
            }
        }
    }
}
