pub mod mistral;
pub mod ollama;
pub mod openrouter;

pub use mistral::MistralProvider;
pub use ollama::OllamaProvider;
pub use openrouter::OpenRouterProvider;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

const REQUEST_TIMEOUT_SECS: u64 = 60;
const TEMPERATURE: f64 = 0.1;
const MAX_TOKENS: u32 = 4000;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The endpoint could not be reached at the transport level: connection
    /// refused, invalid address, DNS failure. Fatal to a classification run.
    #[error("endpoint unreachable: {0}")]
    Unreachable(String),

    /// Request-level failure: timeout, non-success status, unreadable body.
    /// Recoverable per batch.
    #[error("transport error: {0}")]
    Transport(String),

    /// The endpoint answered but the payload was missing expected fields.
    #[error("unexpected response format: {0}")]
    Format(String),
}

impl ProviderError {
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }

    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_builder() {
            Self::Unreachable(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// The single capability the classification pipeline consumes: one prompt
/// in, raw model text out.
#[async_trait]
pub trait ClassificationProvider: Send + Sync {
    async fn invoke(&self, prompt: &str) -> Result<String, ProviderError>;

    fn name(&self) -> &str;
}

fn http_client() -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(ProviderError::from_reqwest)
}

/// OpenAI-style chat completion shared by the hosted backends.
async fn chat_completion(
    client: &reqwest::Client,
    url: &str,
    api_key: &str,
    model: &str,
    prompt: &str,
) -> Result<String, ProviderError> {
    let body = json!({
        "model": model,
        "messages": [{"role": "user", "content": prompt}],
        "temperature": TEMPERATURE,
        "max_tokens": MAX_TOKENS,
    });

    let response = client
        .post(url)
        .header(
            reqwest::header::AUTHORIZATION,
            format!("Bearer {api_key}"),
        )
        .json(&body)
        .send()
        .await
        .map_err(ProviderError::from_reqwest)?
        .error_for_status()
        .map_err(ProviderError::from_reqwest)?;

    let payload: serde_json::Value = response.json().await.map_err(ProviderError::from_reqwest)?;
    payload
        .pointer("/choices/0/message/content")
        .and_then(|value| value.as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            ProviderError::Format("response has no choices[0].message.content".to_string())
        })
}
