//! Quiz artifacts and the generators that produce them.
//!
//! Both generators always return a well-formed [`QuizArtifact`]. When the
//! model call, JSON parsing or schema validation fails they return a
//! fallback artifact with `"N/A"` answers; check [`QuizArtifact::is_fallback`]
//! before trusting the content.

pub mod baseline;
pub mod judge;
pub mod parse;

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use baseline::{BaselineGenerator, BASELINE_TOP_K};
pub use judge::JudgeSynthesizer;
pub use parse::{
    parse_quiz, strip_fence, validate, QuizContent, SchemaError, SynthesisError,
    DISTRACTOR_COUNT, REQUIRED_KEYS,
};

use crate::prompts::PROMPT_VERSION;

/// Sentinel answer used by fallback artifacts.
pub const NOT_AVAILABLE: &str = "N/A";

pub const PARSE_FAILED_QUESTION: &str = "Error generating question. Please check logs.";
pub const PARSE_FAILED_EXPLANATION: &str = "JSON parsing failed.";
pub const GENERATION_FAILED_EXPLANATION: &str = "Quiz generation failed.";

/// How a quiz was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizMethod {
    MultiAgentDebate,
    BaselineSingleAgent,
}

impl std::fmt::Display for QuizMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MultiAgentDebate => write!(f, "multi_agent_debate"),
            Self::BaselineSingleAgent => write!(f, "baseline_single_agent"),
        }
    }
}

/// A multiple-choice question plus provenance. This is the JSON written to
/// the output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizArtifact {
    pub question: String,
    pub correct_answer: String,
    pub distractors: [String; DISTRACTOR_COUNT],
    pub explanation: String,
    pub topic: String,
    pub method: QuizMethod,
    pub prompt_version: String,
    pub generated_at: DateTime<Utc>,
    /// Rendered transcript lines joined by newlines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debate_transcript: Option<String>,
}

impl QuizArtifact {
    pub fn from_content(content: QuizContent, topic: &str, method: QuizMethod) -> Self {
        Self {
            question: content.question,
            correct_answer: content.correct_answer,
            distractors: content.distractors,
            explanation: content.explanation,
            topic: topic.to_string(),
            method,
            prompt_version: PROMPT_VERSION.to_string(),
            generated_at: Utc::now(),
            debate_transcript: None,
        }
    }

    /// The deterministic artifact returned when synthesis fails.
    ///
    /// Unparseable JSON gets the parse sentinel; every other failure puts the
    /// error into the question. `generated_at` is stamped on each call, so
    /// compare fallbacks with [`QuizArtifact::same_quiz`] or
    /// [`QuizArtifact::is_fallback`] rather than `==`.
    pub fn fallback(topic: &str, method: QuizMethod, failure: &SynthesisError) -> Self {
        let (question, explanation) = match failure {
            SynthesisError::Parse(_) => (
                PARSE_FAILED_QUESTION.to_string(),
                PARSE_FAILED_EXPLANATION,
            ),
            other => (format!("Error: {}", other), GENERATION_FAILED_EXPLANATION),
        };

        Self {
            question,
            correct_answer: NOT_AVAILABLE.to_string(),
            distractors: std::array::from_fn(|_| NOT_AVAILABLE.to_string()),
            explanation: explanation.to_string(),
            topic: topic.to_string(),
            method,
            prompt_version: PROMPT_VERSION.to_string(),
            generated_at: Utc::now(),
            debate_transcript: None,
        }
    }

    pub fn with_transcript(mut self, transcript: impl Into<String>) -> Self {
        self.debate_transcript = Some(transcript.into());
        self
    }

    /// Equality on everything except `generated_at`.
    pub fn same_quiz(&self, other: &Self) -> bool {
        self.question == other.question
            && self.correct_answer == other.correct_answer
            && self.distractors == other.distractors
            && self.explanation == other.explanation
            && self.topic == other.topic
            && self.method == other.method
            && self.prompt_version == other.prompt_version
            && self.debate_transcript == other.debate_transcript
    }

    /// Whether this is a sentinel artifact rather than model content.
    pub fn is_fallback(&self) -> bool {
        self.correct_answer == NOT_AVAILABLE
            && self.distractors.iter().all(|d| d == NOT_AVAILABLE)
    }

    /// Write as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Human-readable rendering for the terminal.
    pub fn render(&self) -> String {
        let rule = "=".repeat(60);
        let mut out = format!(
            "\n{rule}\nGENERATED QUIZ QUESTION\n{rule}\n\n\
             Topic: {}\n\n\
             Question: {}\n\n\
             Correct Answer: {}\n\n\
             Distractors:\n",
            self.topic, self.question, self.correct_answer
        );
        for (i, d) in self.distractors.iter().enumerate() {
            out.push_str(&format!("  {}. {}\n", i + 1, d));
        }
        out.push_str(&format!("\nExplanation: {}\n{rule}\n", self.explanation));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content() -> QuizContent {
        QuizContent {
            question: "Q?".into(),
            correct_answer: "A".into(),
            distractors: ["B".into(), "C".into(), "D".into()],
            explanation: "because".into(),
        }
    }

    #[test]
    fn test_parse_fallback_sentinels() {
        let err = SynthesisError::Parse(serde_json::from_str::<serde_json::Value>("{").unwrap_err());
        let quiz = QuizArtifact::fallback("Osmosis", QuizMethod::MultiAgentDebate, &err);
        assert_eq!(quiz.question, PARSE_FAILED_QUESTION);
        assert_eq!(quiz.explanation, PARSE_FAILED_EXPLANATION);
        assert_eq!(quiz.correct_answer, "N/A");
        assert!(quiz.is_fallback());
    }

    #[test]
    fn test_schema_fallback_carries_error() {
        let err = SynthesisError::Schema(SchemaError::DistractorCount(4));
        let quiz = QuizArtifact::fallback("Osmosis", QuizMethod::BaselineSingleAgent, &err);
        assert!(quiz.question.starts_with("Error: distractors must be a list of 3 items"));
        assert_eq!(quiz.explanation, GENERATION_FAILED_EXPLANATION);
        assert_eq!(quiz.method, QuizMethod::BaselineSingleAgent);
        assert!(quiz.is_fallback());
    }

    #[test]
    fn test_fallbacks_agree_apart_from_timestamp() {
        let err = SynthesisError::Schema(SchemaError::DistractorCount(2));
        let first = QuizArtifact::fallback("Osmosis", QuizMethod::MultiAgentDebate, &err);
        let mut second = QuizArtifact::fallback("Osmosis", QuizMethod::MultiAgentDebate, &err);
        second.generated_at = first.generated_at + chrono::Duration::seconds(1);

        assert_ne!(first, second);
        assert!(first.same_quiz(&second));
        assert!(first.is_fallback() && second.is_fallback());

        let other_topic = QuizArtifact::fallback("Diffusion", QuizMethod::MultiAgentDebate, &err);
        assert!(!first.same_quiz(&other_topic));
        assert!(!first.same_quiz(&first.clone().with_transcript("Round 1 - Proponent: x")));
    }

    #[test]
    fn test_real_content_is_not_fallback() {
        let quiz = QuizArtifact::from_content(content(), "Osmosis", QuizMethod::MultiAgentDebate);
        assert!(!quiz.is_fallback());
        assert_eq!(quiz.prompt_version, PROMPT_VERSION);
    }

    #[test]
    fn test_json_shape() {
        let quiz = QuizArtifact::from_content(content(), "Osmosis", QuizMethod::MultiAgentDebate)
            .with_transcript("Round 1 - Proponent: x");
        let value = serde_json::to_value(&quiz).unwrap();
        assert_eq!(value["method"], "multi_agent_debate");
        assert_eq!(value["distractors"].as_array().unwrap().len(), 3);
        assert_eq!(value["debate_transcript"], "Round 1 - Proponent: x");

        let bare = QuizArtifact::from_content(content(), "Osmosis", QuizMethod::BaselineSingleAgent);
        let value = serde_json::to_value(&bare).unwrap();
        assert!(value.get("debate_transcript").is_none());
    }

    #[test]
    fn test_save_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("quiz.json");
        let quiz = QuizArtifact::from_content(content(), "Osmosis", QuizMethod::MultiAgentDebate);
        quiz.save(&path).unwrap();

        let back: QuizArtifact =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, quiz);
    }

    #[test]
    fn test_render_lists_distractors() {
        let quiz = QuizArtifact::from_content(content(), "Osmosis", QuizMethod::MultiAgentDebate);
        let text = quiz.render();
        assert!(text.contains("GENERATED QUIZ QUESTION"));
        assert!(text.contains("Question: Q?"));
        assert!(text.contains("  1. B\n  2. C\n  3. D\n"));
    }
}
