//! Text generation capability shared by the debate agents and the judge.
//!
//! Every model call in the crate goes through [`GenerationClient`]. Callers
//! treat any `Err` as a generation failure and fall back locally; nothing in
//! the debate or synthesis path propagates a `GenerationError` upward.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Failure of a single generation call.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// Non-success reply from the model provider, with its body.
    #[error("provider error: {0}")]
    Provider(String),

    #[error("response contained no text")]
    EmptyResponse,

    #[error("generation timed out after {0:?}")]
    Timeout(Duration),
}

/// A stateless prompt → text capability.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Generate a completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Wraps a client with a hard per-call deadline.
///
/// A hung call would otherwise stall the whole debate, since turns are
/// strictly sequential.
pub struct TimeoutClient<C> {
    inner: C,
    timeout: Duration,
}

impl<C> TimeoutClient<C> {
    pub fn new(inner: C, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl<C: GenerationClient> GenerationClient for TimeoutClient<C> {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        match tokio::time::timeout(self.timeout, self.inner.generate(prompt)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(timeout = ?self.timeout, "generation call timed out");
                Err(GenerationError::Timeout(self.timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct HangingClient;

    #[async_trait]
    impl GenerationClient for HangingClient {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("too late".to_string())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_converts_hang_to_error() {
        let client = TimeoutClient::new(HangingClient, Duration::from_secs(5));
        let err = client.generate("anything").await.unwrap_err();
        assert!(matches!(err, GenerationError::Timeout(d) if d == Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn test_timeout_passes_through_success() {
        let mut mock = MockGenerationClient::new();
        mock.expect_generate()
            .withf(|prompt: &str| prompt == "hello")
            .times(1)
            .returning(|_| Ok("world".to_string()));

        let client = TimeoutClient::new(mock, Duration::from_secs(5));
        assert_eq!(client.generate("hello").await.unwrap(), "world");
    }

    #[tokio::test]
    async fn test_timeout_passes_through_inner_error() {
        let mut mock = MockGenerationClient::new();
        mock.expect_generate()
            .returning(|_| Err(GenerationError::EmptyResponse));

        let client = TimeoutClient::new(mock, Duration::from_secs(5));
        let err = client.generate("hello").await.unwrap_err();
        assert!(matches!(err, GenerationError::EmptyResponse));
    }

    #[test]
    fn test_generation_error_display() {
        let err = GenerationError::Provider("429 quota".to_string());
        assert_eq!(err.to_string(), "provider error: 429 quota");
        assert!(GenerationError::Timeout(Duration::from_secs(2))
            .to_string()
            .contains("timed out"));
    }
}
