//! Deterministic stand-ins for the network: scripted and failing generation
//! clients, and a keyword-count embedder with an interpretable vector space.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use debate_core::{
    Embedder, EmbeddingError, EvidenceIndex, GenerationClient, GenerationError,
};

/// A well-formed judge response.
pub const VALID_QUIZ: &str = r#"{
    "question": "Which pigment lets leaves capture light?",
    "correct_answer": "Chlorophyll",
    "distractors": ["Carotene alone", "Xylem", "Starch"],
    "explanation": "Chlorophyll absorbs red and blue light."
}"#;

/// Answers by the first matching substring rule, otherwise a default.
pub struct ScriptedClient {
    rules: Vec<(&'static str, String)>,
    default: String,
    calls: AtomicUsize,
}

impl ScriptedClient {
    pub fn new(default: &str) -> Self {
        Self {
            rules: Vec::new(),
            default: default.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn rule(mut self, needle: &'static str, response: &str) -> Self {
        self.rules.push((needle, response.to_string()));
        self
    }

    /// Debaters answer by role, the judge with `judge_response`.
    pub fn debate(judge_response: &str) -> Self {
        Self::new("unscripted")
            .rule("search query", "chlorophyll")
            .rule("Complete Debate Transcript", judge_response)
            .rule("supporting the topic", "Chlorophyll captures light energy.")
            .rule("challenging the topic", "Light alone is not sufficient.")
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationClient for ScriptedClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let response = self
            .rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle))
            .map(|(_, r)| r.clone())
            .unwrap_or_else(|| self.default.clone());
        Ok(response)
    }
}

/// Fails every call.
pub struct FailingClient;

#[async_trait]
impl GenerationClient for FailingClient {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        Err(GenerationError::RequestFailed("connection refused".to_string()))
    }
}

/// One dimension per vocabulary word, valued by occurrence count.
pub struct KeywordEmbedder {
    vocabulary: Vec<&'static str>,
}

impl KeywordEmbedder {
    pub fn new(vocabulary: &[&'static str]) -> Self {
        Self {
            vocabulary: vocabulary.to_vec(),
        }
    }

    pub fn geography() -> Self {
        Self::new(&["paris", "berlin", "capital", "france", "germany"])
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    fn model_id(&self) -> &str {
        "keyword-test"
    }

    fn dimension(&self) -> usize {
        self.vocabulary.len()
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts
            .iter()
            .map(|text| {
                let words: Vec<String> = text
                    .split(|c: char| !c.is_alphanumeric())
                    .map(str::to_lowercase)
                    .collect();
                self.vocabulary
                    .iter()
                    .map(|v| words.iter().filter(|w| w == v).count() as f32)
                    .collect()
            })
            .collect())
    }
}

/// Small photosynthesis corpus indexed with the hashing embedder.
pub async fn photosynthesis_index() -> Arc<EvidenceIndex> {
    let mut index = EvidenceIndex::new(Arc::new(debate_core::HashingEmbedder::new(128)));
    index
        .build(
            vec![
                "Chlorophyll absorbs red and blue light.".to_string(),
                "The light reactions split water and release oxygen.".to_string(),
                "The Calvin cycle fixes carbon dioxide into sugar.".to_string(),
                "Photosynthesis slows when temperatures are too high.".to_string(),
            ],
            None,
        )
        .await
        .expect("corpus should index");
    Arc::new(index)
}
