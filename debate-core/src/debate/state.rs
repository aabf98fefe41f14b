//! Debate state machine: phases, transitions, turns and session tracking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which side of the topic an agent argues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebateRole {
    /// Argues for the topic. Always speaks first in a round.
    Supporting,
    /// Argues against the topic or for its limitations.
    Opposing,
}

impl DebateRole {
    /// Label used in rendered transcript lines.
    pub fn label(self) -> &'static str {
        match self {
            Self::Supporting => "Proponent",
            Self::Opposing => "Opponent",
        }
    }

    /// Agent name used when none is configured.
    pub fn default_agent_name(self) -> &'static str {
        match self {
            Self::Supporting => "TA_Proponent",
            Self::Opposing => "TA_Opponent",
        }
    }

    /// The other side.
    pub fn opponent(self) -> Self {
        match self {
            Self::Supporting => Self::Opposing,
            Self::Opposing => Self::Supporting,
        }
    }
}

impl std::fmt::Display for DebateRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Supporting => write!(f, "supporting"),
            Self::Opposing => write!(f, "opposing"),
        }
    }
}

/// Phase of a debate session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DebatePhase {
    /// Session created but not started.
    Idle,
    /// Supporting agent is speaking in the current round.
    SupportingTurn,
    /// Opposing agent is speaking in the current round.
    OpposingTurn,
    /// Both agents have spoken in the current round.
    RoundComplete,
    /// All rounds ran.
    Completed,
    /// Stopped between rounds by the caller.
    Aborted,
}

impl DebatePhase {
    /// Whether this is a terminal phase.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Aborted)
    }

    /// Whether this phase allows transition to a new phase.
    pub fn can_transition(self) -> bool {
        !self.is_terminal()
    }

    /// Valid transitions from this phase.
    ///
    /// There is no mid-round interrupt: `Aborted` is only reachable before
    /// the first round or between rounds.
    pub fn valid_transitions(self) -> &'static [DebatePhase] {
        match self {
            Self::Idle => &[Self::SupportingTurn, Self::Aborted],
            Self::SupportingTurn => &[Self::OpposingTurn],
            Self::OpposingTurn => &[Self::RoundComplete],
            Self::RoundComplete => &[Self::SupportingTurn, Self::Completed, Self::Aborted],
            Self::Completed | Self::Aborted => &[],
        }
    }

    /// The role expected to speak in this phase, if any.
    pub fn speaker(self) -> Option<DebateRole> {
        match self {
            Self::SupportingTurn => Some(DebateRole::Supporting),
            Self::OpposingTurn => Some(DebateRole::Opposing),
            _ => None,
        }
    }
}

impl std::fmt::Display for DebatePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::SupportingTurn => write!(f, "supporting_turn"),
            Self::OpposingTurn => write!(f, "opposing_turn"),
            Self::RoundComplete => write!(f, "round_complete"),
            Self::Completed => write!(f, "completed"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}

/// The subject under debate. Never empty or whitespace-only, including when
/// deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Topic(String);

impl Topic {
    /// `None` when `topic` is empty or whitespace-only.
    pub fn new(topic: impl Into<String>) -> Option<Self> {
        let topic = topic.into();
        if topic.trim().is_empty() {
            None
        } else {
            Some(Self(topic))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Topic {
    type Error = &'static str;

    fn try_from(topic: String) -> Result<Self, Self::Error> {
        Self::new(topic).ok_or("topic must not be empty")
    }
}

impl From<Topic> for String {
    fn from(topic: Topic) -> Self {
        topic.0
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Topic {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One agent utterance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebateTurn {
    /// Round number (1-indexed).
    pub round: u32,
    /// Side the speaker argues.
    pub role: DebateRole,
    /// Agent name.
    pub speaker: String,
    /// Argument text, or an agent-labelled error string when `degraded`.
    pub argument: String,
    /// Whether generation failed and `argument` is an error string.
    pub degraded: bool,
}

impl DebateTurn {
    pub fn new(
        round: u32,
        role: DebateRole,
        speaker: impl Into<String>,
        argument: impl Into<String>,
        degraded: bool,
    ) -> Self {
        Self {
            round,
            role,
            speaker: speaker.into(),
            argument: argument.into(),
            degraded,
        }
    }

    /// `Round R - <Label>: <argument>`
    pub fn render(&self) -> String {
        format!(
            "Round {} - {}: {}",
            self.round,
            self.role.label(),
            self.argument
        )
    }
}

/// Ordered, append-only record of every turn in a debate.
///
/// Only [`DebateSession::record_turn`] appends; everyone else reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DebateTranscript {
    turns: Vec<DebateTurn>,
}

impl DebateTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[DebateTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&DebateTurn> {
        self.turns.last()
    }

    /// The last `n` turns (fewer if the transcript is shorter).
    pub fn recent(&self, n: usize) -> &[DebateTurn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }

    /// Number of turns whose generation failed.
    pub fn degraded_count(&self) -> usize {
        self.turns.iter().filter(|t| t.degraded).count()
    }

    /// Each turn rendered as a `Round R - <Label>: <argument>` line.
    pub fn lines(&self) -> Vec<String> {
        self.turns.iter().map(DebateTurn::render).collect()
    }

    /// Full transcript as newline-joined rendered lines.
    pub fn render(&self) -> String {
        self.lines().join("\n")
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DebateTurn> {
        self.turns.iter()
    }

    fn push(&mut self, turn: DebateTurn) {
        self.turns.push(turn);
    }
}

impl<'a> IntoIterator for &'a DebateTranscript {
    type Item = &'a DebateTurn;
    type IntoIter = std::slice::Iter<'a, DebateTurn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}

/// A phase transition record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateTransition {
    /// Previous phase.
    pub from: DebatePhase,
    /// New phase.
    pub to: DebatePhase,
    /// When the transition occurred.
    pub timestamp: DateTime<Utc>,
    /// Reason for the transition.
    pub reason: String,
}

/// Error for invalid state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionError {
    pub from: DebatePhase,
    pub to: DebatePhase,
    pub reason: String,
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid transition {} → {}: {}",
            self.from, self.to, self.reason
        )
    }
}

impl std::error::Error for TransitionError {}

/// A debate session tracking state and history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateSession {
    /// Unique session identifier.
    pub id: String,
    /// Subject under debate. Fixed for the life of the session.
    pub topic: Topic,
    /// Current phase.
    pub phase: DebatePhase,
    /// Current round number (0 before the first round starts).
    pub current_round: u32,
    /// Number of rounds to run.
    pub max_rounds: u32,
    /// Every turn so far, in speaking order.
    pub transcript: DebateTranscript,
    /// Transition history.
    pub transitions: Vec<DebateTransition>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
}

impl DebateSession {
    /// Create a new debate session with a fresh id.
    pub fn new(topic: Topic, max_rounds: u32) -> Self {
        Self::with_id(&uuid::Uuid::new_v4().to_string(), topic, max_rounds)
    }

    pub fn with_id(id: &str, topic: Topic, max_rounds: u32) -> Self {
        Self {
            id: id.to_string(),
            topic,
            phase: DebatePhase::Idle,
            current_round: 0,
            max_rounds,
            transcript: DebateTranscript::new(),
            transitions: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Transition to a new phase with a reason.
    pub fn transition(&mut self, to: DebatePhase, reason: &str) -> Result<(), TransitionError> {
        if !self.phase.valid_transitions().contains(&to) {
            return Err(TransitionError {
                from: self.phase,
                to,
                reason: format!(
                    "not a valid transition (allowed: {:?})",
                    self.phase.valid_transitions()
                ),
            });
        }

        if to == DebatePhase::SupportingTurn && self.current_round >= self.max_rounds {
            return Err(TransitionError {
                from: self.phase,
                to,
                reason: format!("all {} rounds already ran", self.max_rounds),
            });
        }

        self.transitions.push(DebateTransition {
            from: self.phase,
            to,
            timestamp: Utc::now(),
            reason: reason.to_string(),
        });
        self.phase = to;

        // A round begins when the supporting agent takes the floor
        if to == DebatePhase::SupportingTurn {
            self.current_round += 1;
        }

        Ok(())
    }

    /// Start the debate (Idle → SupportingTurn).
    pub fn start(&mut self) -> Result<(), TransitionError> {
        self.transition(DebatePhase::SupportingTurn, "debate started")
    }

    /// Begin the next round (RoundComplete → SupportingTurn).
    pub fn next_round(&mut self) -> Result<(), TransitionError> {
        let reason = format!("round {} started", self.current_round + 1);
        self.transition(DebatePhase::SupportingTurn, &reason)
    }

    /// Append a turn and hand the floor on.
    ///
    /// The turn must belong to the role whose phase it is and carry the
    /// current round number; otherwise nothing is appended.
    pub fn record_turn(&mut self, turn: DebateTurn) -> Result<(), TransitionError> {
        let (expected, next) = match self.phase {
            DebatePhase::SupportingTurn => (DebateRole::Supporting, DebatePhase::OpposingTurn),
            DebatePhase::OpposingTurn => (DebateRole::Opposing, DebatePhase::RoundComplete),
            other => {
                return Err(TransitionError {
                    from: other,
                    to: other,
                    reason: format!("no turn is expected in phase {}", other),
                })
            }
        };

        if turn.role != expected || turn.round != self.current_round {
            return Err(TransitionError {
                from: self.phase,
                to: next,
                reason: format!(
                    "expected {} turn for round {}, got {} turn for round {}",
                    expected, self.current_round, turn.role, turn.round
                ),
            });
        }

        let reason = format!("{} turn recorded", turn.role);
        self.transition(next, &reason)?;
        self.transcript.push(turn);
        Ok(())
    }

    /// Finish the debate (RoundComplete → Completed).
    pub fn complete(&mut self) -> Result<(), TransitionError> {
        self.transition(DebatePhase::Completed, "all rounds complete")
    }

    /// Stop the debate between rounds.
    pub fn abort(&mut self, reason: &str) -> Result<(), TransitionError> {
        self.transition(DebatePhase::Aborted, reason)
    }

    /// Whether the debate has ended.
    pub fn is_complete(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Whether more rounds are available.
    pub fn has_rounds_remaining(&self) -> bool {
        self.current_round < self.max_rounds
    }

    /// Transcript length implied by the current phase and round.
    pub fn expected_turns(&self) -> usize {
        let r = self.current_round as usize;
        match self.phase {
            DebatePhase::Idle => 0,
            DebatePhase::SupportingTurn => 2 * r.saturating_sub(1),
            DebatePhase::OpposingTurn => 2 * r.saturating_sub(1) + 1,
            DebatePhase::RoundComplete | DebatePhase::Completed | DebatePhase::Aborted => 2 * r,
        }
    }

    /// Compact status line.
    pub fn status_line(&self) -> String {
        format!(
            "[{}] round {}/{} | {} turns | topic={}",
            self.phase,
            self.current_round,
            self.max_rounds,
            self.transcript.len(),
            self.topic
        )
    }
}
