//! Debate Orchestration: Proponent/Opponent Evidence Loop
//!
//! Two retrieval-augmented agents argue a topic for a fixed number of rounds.
//! The supporting agent always speaks first; every turn sees the transcript
//! accumulated so far.
//!
//! # Debate Flow
//!
//! ```text
//! Idle → SupportingTurn → OpposingTurn → RoundComplete
//!   │          ▲                              │
//!   │          └──── rounds left ─────────────┤
//!   │                                         ├─ no rounds left → Completed
//!   └─ abort ──────────── Aborted ◀───────────┘ (between rounds only)
//! ```

pub mod agent;
pub mod orchestrator;
pub mod persistence;
pub mod state;

pub use agent::{AgentTurn, DebateAgent, DEFAULT_TOP_K, QUERY_HISTORY_WINDOW};
pub use orchestrator::{DebateError, DebateOrchestrator};
pub use persistence::{
    load_checkpoint, restore, validate_checkpoint, CheckpointWriter, DebateCheckpoint,
    IntegrityStatus, PersistenceError,
};
pub use state::{
    DebatePhase, DebateRole, DebateSession, DebateTranscript, DebateTransition, DebateTurn,
    Topic, TransitionError,
};
