//! Debate persistence: checkpoint and resume for interrupted debates.
//!
//! A checkpoint is the whole [`DebateSession`] as JSON, written after every
//! round. Restoring validates the session's internal consistency so a
//! hand-edited or truncated file cannot resume into an impossible state.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::state::{DebatePhase, DebateRole, DebateSession};

/// A complete debate checkpoint for serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateCheckpoint {
    /// Schema version for forward compatibility.
    pub version: u32,
    /// Monotonic checkpoint sequence number.
    pub sequence: u32,
    /// Checkpoint reason.
    pub reason: String,
    /// The session state at checkpoint time.
    pub session: DebateSession,
}

impl DebateCheckpoint {
    /// Current schema version.
    pub const CURRENT_VERSION: u32 = 1;

    /// Create a new checkpoint.
    pub fn new(session: &DebateSession, reason: &str, sequence: u32) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            sequence,
            reason: reason.to_string(),
            session: session.clone(),
        }
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, PersistenceError> {
        serde_json::to_string_pretty(self).map_err(|e| PersistenceError::SerializeFailed {
            reason: e.to_string(),
        })
    }

    /// Deserialize from JSON string.
    pub fn from_json(json: &str) -> Result<Self, PersistenceError> {
        let checkpoint: Self =
            serde_json::from_str(json).map_err(|e| PersistenceError::DeserializeFailed {
                reason: e.to_string(),
            })?;

        if checkpoint.version > Self::CURRENT_VERSION {
            return Err(PersistenceError::VersionMismatch {
                expected: Self::CURRENT_VERSION,
                found: checkpoint.version,
            });
        }

        Ok(checkpoint)
    }
}

/// Error during persistence operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// Serialization failed.
    SerializeFailed { reason: String },
    /// Deserialization failed.
    DeserializeFailed { reason: String },
    /// Schema version mismatch.
    VersionMismatch { expected: u32, found: u32 },
    /// Integrity check failed on restore.
    IntegrityCheckFailed { reason: String },
    /// Reading or writing the checkpoint file failed.
    Io { path: PathBuf, reason: String },
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SerializeFailed { reason } => write!(f, "serialize failed: {}", reason),
            Self::DeserializeFailed { reason } => write!(f, "deserialize failed: {}", reason),
            Self::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "version mismatch: expected {}, found {}",
                    expected, found
                )
            }
            Self::IntegrityCheckFailed { reason } => {
                write!(f, "integrity check failed: {}", reason)
            }
            Self::Io { path, reason } => {
                write!(f, "checkpoint I/O failed at {}: {}", path.display(), reason)
            }
        }
    }
}

impl std::error::Error for PersistenceError {}

/// Integrity check result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityStatus {
    /// Checkpoint is valid and can be resumed.
    Valid,
    /// Checkpoint has minor issues but is recoverable.
    Recoverable { warnings: Vec<String> },
    /// Checkpoint is corrupted and cannot be used.
    Corrupted { errors: Vec<String> },
}

impl IntegrityStatus {
    /// Whether resume is safe.
    pub fn can_resume(&self) -> bool {
        matches!(self, Self::Valid | Self::Recoverable { .. })
    }
}

/// Validate a checkpoint's integrity before resuming.
pub fn validate_checkpoint(checkpoint: &DebateCheckpoint) -> IntegrityStatus {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();
    let session = &checkpoint.session;

    if checkpoint.version > DebateCheckpoint::CURRENT_VERSION {
        errors.push(format!(
            "version {} > current {}",
            checkpoint.version,
            DebateCheckpoint::CURRENT_VERSION
        ));
    }

    if session.max_rounds == 0 {
        errors.push("max_rounds is 0".to_string());
    }

    if session.current_round > session.max_rounds {
        errors.push(format!(
            "current_round {} exceeds max_rounds {}",
            session.current_round, session.max_rounds
        ));
    }

    match session.transitions.last() {
        Some(last) if last.to != session.phase => {
            errors.push(format!(
                "last transition target {:?} doesn't match current phase {:?}",
                last.to, session.phase
            ));
        }
        None if session.phase != DebatePhase::Idle => {
            warnings.push(format!("no transition history for phase {}", session.phase));
        }
        _ => {}
    }

    let expected_turns = session.expected_turns();
    if session.transcript.len() != expected_turns {
        errors.push(format!(
            "{} turns recorded, {} expected in phase {} of round {}",
            session.transcript.len(),
            expected_turns,
            session.phase,
            session.current_round
        ));
    }

    // Turns must alternate supporting/opposing with rounds numbered from 1
    for (i, turn) in session.transcript.iter().enumerate() {
        let role = if i % 2 == 0 {
            DebateRole::Supporting
        } else {
            DebateRole::Opposing
        };
        let round = (i / 2 + 1) as u32;
        if turn.role != role || turn.round != round {
            errors.push(format!(
                "turn {} is {} round {}, expected {} round {}",
                i, turn.role, turn.round, role, round
            ));
            break;
        }
    }

    let degraded = session.transcript.degraded_count();
    if degraded > 0 {
        warnings.push(format!("{} degraded turns in transcript", degraded));
    }

    if !errors.is_empty() {
        IntegrityStatus::Corrupted { errors }
    } else if !warnings.is_empty() {
        IntegrityStatus::Recoverable { warnings }
    } else {
        IntegrityStatus::Valid
    }
}

/// Parse a checkpoint and refuse it if it is corrupted.
pub fn restore(json: &str) -> Result<(DebateCheckpoint, IntegrityStatus), PersistenceError> {
    let checkpoint = DebateCheckpoint::from_json(json)?;
    let status = validate_checkpoint(&checkpoint);

    if let IntegrityStatus::Corrupted { ref errors } = status {
        return Err(PersistenceError::IntegrityCheckFailed {
            reason: errors.join("; "),
        });
    }

    Ok((checkpoint, status))
}

/// Read and [`restore`] a checkpoint file.
pub fn load_checkpoint(
    path: &Path,
) -> Result<(DebateCheckpoint, IntegrityStatus), PersistenceError> {
    let json = std::fs::read_to_string(path).map_err(|e| PersistenceError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    restore(&json)
}

/// Writes numbered checkpoints of one session to a single file.
///
/// Each write replaces the previous checkpoint via a sibling temp file and
/// rename, so a crash mid-write leaves the last good checkpoint in place.
#[derive(Debug, Clone)]
pub struct CheckpointWriter {
    path: PathBuf,
    sequence: u32,
}

impl CheckpointWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sequence: 0,
        }
    }

    /// Continue numbering after a restored checkpoint.
    pub fn resuming(path: impl Into<PathBuf>, last: &DebateCheckpoint) -> Self {
        Self {
            path: path.into(),
            sequence: last.sequence,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current sequence number.
    pub fn current_sequence(&self) -> u32 {
        self.sequence
    }

    /// Checkpoint `session` to disk.
    pub fn write(
        &mut self,
        session: &DebateSession,
        reason: &str,
    ) -> Result<DebateCheckpoint, PersistenceError> {
        let io_err = |path: &Path, e: std::io::Error| PersistenceError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };

        let checkpoint = DebateCheckpoint::new(session, reason, self.sequence + 1);
        let json = checkpoint.to_json()?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }

        let mut tmp = self.path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, json).map_err(|e| io_err(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| io_err(&self.path, e))?;

        self.sequence = checkpoint.sequence;
        info!(
            path = %self.path.display(),
            sequence = checkpoint.sequence,
            phase = %session.phase,
            "Debate checkpoint written"
        );
        Ok(checkpoint)
    }
}
