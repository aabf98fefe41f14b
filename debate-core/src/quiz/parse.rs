//! Tolerant parsing and strict validation of model-produced quiz JSON.
//!
//! Parse directly first. Only if that fails, strip a single fenced code block
//! (```json ... ``` or bare ```) and retry once.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::generation::GenerationError;

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)```")
        .expect("FENCED_BLOCK regex should compile")
});

/// Keys every quiz object must carry, in validation order.
pub const REQUIRED_KEYS: [&str; 4] = ["question", "correct_answer", "distractors", "explanation"];

/// Number of wrong answers in every quiz.
pub const DISTRACTOR_COUNT: usize = 3;

/// Structurally valid JSON that is not a usable quiz.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("quiz output is not a JSON object")]
    NotAnObject,

    #[error("Missing required key: {0}")]
    MissingKey(&'static str),

    #[error("invalid field {key}: {reason}")]
    InvalidField { key: &'static str, reason: String },

    #[error("distractors must be a list of 3 items, got {0}")]
    DistractorCount(usize),
}

/// Why a quiz could not be produced from a generation call.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("Failed to parse JSON from response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// The four model-authored fields of a quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizContent {
    pub question: String,
    pub correct_answer: String,
    pub distractors: [String; DISTRACTOR_COUNT],
    pub explanation: String,
}

/// Contents of the first fenced code block in `text`, if any.
pub fn strip_fence(text: &str) -> Option<&str> {
    FENCED_BLOCK
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

/// Parse and validate a model response into quiz content.
pub fn parse_quiz(text: &str) -> Result<QuizContent, SynthesisError> {
    let trimmed = text.trim();

    let value: Value = match serde_json::from_str(trimmed) {
        Ok(value) => value,
        Err(direct) => match strip_fence(trimmed) {
            Some(inner) => serde_json::from_str(inner)?,
            None => return Err(direct.into()),
        },
    };

    Ok(validate(&value)?)
}

fn text_field(obj: &serde_json::Map<String, Value>, key: &'static str) -> Result<String, SchemaError> {
    match obj.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(Value::String(_)) => Err(SchemaError::InvalidField {
            key,
            reason: "must not be empty".to_string(),
        }),
        Some(other) => Err(SchemaError::InvalidField {
            key,
            reason: format!("expected a string, got {}", json_kind(other)),
        }),
        None => Err(SchemaError::MissingKey(key)),
    }
}

/// Check a parsed JSON value against the quiz schema.
pub fn validate(value: &Value) -> Result<QuizContent, SchemaError> {
    let obj = value.as_object().ok_or(SchemaError::NotAnObject)?;

    if let Some(missing) = REQUIRED_KEYS.iter().find(|k| !obj.contains_key(**k)) {
        return Err(SchemaError::MissingKey(*missing));
    }

    let items = match &obj["distractors"] {
        Value::Array(items) => items,
        other => {
            return Err(SchemaError::InvalidField {
                key: "distractors",
                reason: format!("expected a list, got {}", json_kind(other)),
            })
        }
    };
    if items.len() != DISTRACTOR_COUNT {
        return Err(SchemaError::DistractorCount(items.len()));
    }

    let mut distractors: [String; DISTRACTOR_COUNT] = Default::default();
    for (slot, item) in distractors.iter_mut().zip(items) {
        *slot = item
            .as_str()
            .ok_or_else(|| SchemaError::InvalidField {
                key: "distractors",
                reason: format!("expected strings, got {}", json_kind(item)),
            })?
            .to_string();
    }

    Ok(QuizContent {
        question: text_field(obj, "question")?,
        correct_answer: text_field(obj, "correct_answer")?,
        distractors,
        explanation: text_field(obj, "explanation")?,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
