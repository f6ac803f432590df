use async_trait::async_trait;

use super::{chat_completion, http_client, ClassificationProvider, ProviderError};

const API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Popular OpenRouter models offered in the picker. OpenRouter has no cheap
/// unauthenticated listing endpoint, so this mirrors their featured set.
pub const MODELS: &[&str] = &[
    "anthropic/claude-3.5-sonnet",
    "anthropic/claude-3-opus",
    "anthropic/claude-3-haiku",
    "openai/gpt-4o",
    "openai/gpt-4o-mini",
    "openai/gpt-4-turbo",
    "google/gemini-pro-1.5",
    "google/gemini-flash-1.5",
    "meta-llama/llama-3.1-405b-instruct",
    "meta-llama/llama-3.1-70b-instruct",
    "meta-llama/llama-3.1-8b-instruct",
    "mistralai/mistral-large",
    "mistralai/mistral-medium",
    "qwen/qwen-2.5-72b-instruct",
    "deepseek/deepseek-chat",
];

pub struct OpenRouterProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenRouterProvider {
    pub fn new(api_key: &str, model: &str) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client()?,
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl ClassificationProvider for OpenRouterProvider {
    async fn invoke(&self, prompt: &str) -> Result<String, ProviderError> {
        chat_completion(&self.client, API_URL, &self.api_key, &self.model, prompt).await
    }

    fn name(&self) -> &str {
        "openrouter"
    }
}
