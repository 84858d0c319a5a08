use super::*;
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use std::time::Instant;

/// OpenAI provider implementation
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiProvider {
    /// Create a new OpenAI provider with the given API key and model
    pub fn new(api_key: String, model: String) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        let client = Client::with_config(config);

        Self { client, model }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn generate(&self, request: GenerateRequest) -> LlmResult<GenerateResponse> {
        let start = Instant::now();

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(request.temperature)
            .max_tokens(request.max_tokens.max(1))
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(request.system.as_str())
                    .build()
                    .map_err(|e| LlmError::ApiError(e.to_string()))?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(request.prompt.as_str())
                    .build()
                    .map_err(|e| LlmError::ApiError(e.to_string()))?
                    .into(),
            ])
            .build()
            .map_err(|e| LlmError::ApiError(e.to_string()))?;

        // Execute with timeout
        let response =
            tokio::time::timeout(request.timeout, self.client.chat().create(chat_request))
                .await
                .map_err(|_| LlmError::Timeout(request.timeout))?
                .map_err(|e| LlmError::ApiError(e.to_string()))?;

        // Extract the generated text
        let text = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| LlmError::ParseError("No content in response".to_string()))?;

        let latency_ms = start.elapsed().as_millis() as u64;

        Ok(GenerateResponse {
            text: text.trim().to_string(),
            metadata: ResponseMetadata {
                provider: "openai".to_string(),
                model: self.model.clone(),
                tokens_used: response.usage.map(|u| u.total_tokens),
                latency_ms,
            },
        })
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Only run with actual API key
    async fn test_openai_generate() {
        let api_key = std::env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY not set");
        let provider = OpenAiProvider::new(api_key, "gpt-4o-mini".to_string());

        let request = GenerateRequest {
            system: "Answer in one word.".to_string(),
            prompt: "What is the capital of France?".to_string(),
            temperature: 0.0,
            max_tokens: 20,
            timeout: Duration::from_secs(30),
        };

        let response = provider.generate(request).await.unwrap();

        assert!(!response.text.is_empty());
        assert_eq!(response.metadata.provider, "openai");
        println!("Generated text: {}", response.text);
        println!("Metadata: {:?}", response.metadata);
    }
}
