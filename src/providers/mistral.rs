use async_trait::async_trait;

use super::{chat_completion, http_client, ClassificationProvider, ProviderError};

const API_URL: &str = "https://api.mistral.ai/v1/chat/completions";

pub const MODELS: &[&str] = &[
    "mistral-tiny",
    "mistral-small",
    "mistral-medium",
    "mistral-large-latest",
];

pub struct MistralProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl MistralProvider {
    pub fn new(api_key: &str, model: &str) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client()?,
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl ClassificationProvider for MistralProvider {
    async fn invoke(&self, prompt: &str) -> Result<String, ProviderError> {
        chat_completion(&self.client, API_URL, &self.api_key, &self.model, prompt).await
    }

    fn name(&self) -> &str {
        "mistral"
    }
}
