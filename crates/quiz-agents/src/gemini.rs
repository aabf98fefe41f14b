//! Gemini backends for generation and embedding, built on rig's Gemini
//! provider.

use async_trait::async_trait;
use debate_core::{Embedder, EmbeddingError, GenerationClient, GenerationError};
use rig::client::{CompletionClient, EmbeddingsClient};
use rig::completion::{CompletionError, Prompt, PromptError};
use rig::embeddings::EmbeddingModel;
use rig::providers::gemini;
use tracing::debug;

use crate::config::QuizConfig;

/// Gemini caps `batchEmbedContents` at this many requests per call.
pub const EMBED_BATCH_SIZE: usize = 100;

/// Build the shared rig client for the configured endpoint.
pub fn build_gemini_client(api_key: &str, base_url: &str) -> Result<gemini::Client, GenerationError> {
    gemini::Client::builder()
        .api_key(api_key)
        .base_url(base_url)
        .build()
        .map_err(|e| GenerationError::RequestFailed(format!("failed to build Gemini client: {e}")))
}

fn bare_model(model: &str) -> &str {
    model.strip_prefix("models/").unwrap_or(model)
}

fn map_prompt_error(err: PromptError) -> GenerationError {
    match err {
        PromptError::CompletionError(CompletionError::ProviderError(body)) => {
            GenerationError::Provider(body)
        }
        PromptError::CompletionError(CompletionError::ResponseError(msg)) => {
            debug!(reason = %msg, "Gemini returned no usable candidate");
            GenerationError::EmptyResponse
        }
        other => GenerationError::RequestFailed(other.to_string()),
    }
}

fn map_embedding_error(err: rig::embeddings::EmbeddingError) -> EmbeddingError {
    EmbeddingError::RequestFailed(err.to_string())
}

/// `generateContent` client for one model.
#[derive(Clone)]
pub struct GeminiClient {
    client: gemini::Client,
    model: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    pub fn new(client: gemini::Client, model: &str) -> Self {
        Self {
            client,
            model: bare_model(model).to_string(),
        }
    }

    pub fn from_config(config: &QuizConfig) -> Result<Self, GenerationError> {
        let client = build_gemini_client(&config.api_key, &config.api_base)?;
        Ok(Self::new(client, &config.generation_model))
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let agent = self.client.agent(&self.model).build();
        let text: String = agent.prompt(prompt).await.map_err(map_prompt_error)?;

        if text.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        debug!(model = %self.model, chars = text.len(), "generation complete");
        Ok(text)
    }
}

/// `batchEmbedContents` embedder with a fixed output dimension.
#[derive(Clone)]
pub struct GeminiEmbedder {
    client: gemini::Client,
    model: String,
    dimension: usize,
}

impl std::fmt::Debug for GeminiEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiEmbedder")
            .field("model", &self.model)
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}

impl GeminiEmbedder {
    pub fn new(client: gemini::Client, model: &str, dimension: usize) -> Self {
        Self {
            client,
            model: bare_model(model).to_string(),
            dimension,
        }
    }

    async fn embed_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let model = self
            .client
            .embedding_model_with_ndims(&self.model, self.dimension);
        let embeddings = model
            .embed_texts(batch.to_vec())
            .await
            .map_err(map_embedding_error)?;

        if embeddings.len() != batch.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: batch.len(),
                actual: embeddings.len(),
            });
        }

        embeddings
            .into_iter()
            .map(|e| {
                if e.vec.len() == self.dimension {
                    Ok(e.vec.into_iter().map(|x| x as f32).collect())
                } else {
                    Err(EmbeddingError::DimensionMismatch {
                        expected: self.dimension,
                        actual: e.vec.len(),
                    })
                }
            })
            .collect()
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for (i, batch) in texts.chunks(EMBED_BATCH_SIZE).enumerate() {
            debug!(batch = i, size = batch.len(), model = %self.model, "embedding batch");
            vectors.extend(self.embed_batch(batch).await?);
        }
        Ok(vectors)
    }
}
