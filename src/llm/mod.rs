mod ollama;
mod openai;

use crate::config::TriviaConfig;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

/// Result type for LLM operations
pub type LlmResult<T> = Result<T, LlmError>;

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Response parsing failed: {0}")]
    ParseError(String),
}

/// A single chat completion request
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Instructions sent as the system message
    pub system: String,
    /// The user message
    pub prompt: String,
    pub temperature: f32,
    /// Maximum response length in tokens
    pub max_tokens: u32,
    /// Timeout for the request
    pub timeout: Duration,
}

/// Response from an LLM provider
#[derive(Debug, Clone)]
pub struct GenerateResponse {
    /// The generated text
    pub text: String,
    pub metadata: ResponseMetadata,
}

#[derive(Debug, Clone)]
pub struct ResponseMetadata {
    /// Name of the provider (e.g., "openai", "ollama")
    pub provider: String,
    /// Model name used
    pub model: String,
    /// Tokens consumed (if available)
    pub tokens_used: Option<u32>,
    /// Latency in milliseconds
    pub latency_ms: u64,
}

/// Trait that all LLM providers must implement
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> LlmResult<GenerateResponse>;

    /// Get the name of this provider
    fn name(&self) -> &str;
}

/// Build the provider selected by the config.
///
/// An OpenAI key wins over an Ollama base URL.
pub fn build_provider(config: &TriviaConfig) -> LlmResult<Arc<dyn LlmProvider>> {
    let api_key = config.open_ai_api_key.trim();
    if !api_key.is_empty() {
        return Ok(Arc::new(OpenAiProvider::new(
            api_key.to_string(),
            config.open_ai_model.clone(),
        )));
    }

    if let Some(base_url) = &config.ollama_base_url {
        return Ok(Arc::new(OllamaProvider::new(
            base_url.clone(),
            config.open_ai_model.clone(),
        )?));
    }

    Err(LlmError::ConfigError(
        "No LLM provider configured. Set OPENAI_API_KEY or OLLAMA_BASE_URL".to_string(),
    ))
}
