use async_trait::async_trait;
use serde_json::json;

use super::{http_client, ClassificationProvider, ProviderError};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Client for a local (or remote) Ollama server via its generate endpoint.
pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaProvider {
    pub fn new(base_url: &str, model: &str) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl ClassificationProvider for OllamaProvider {
    async fn invoke(&self, prompt: &str) -> Result<String, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?
            .error_for_status()
            .map_err(ProviderError::from_reqwest)?;

        let payload: serde_json::Value =
            response.json().await.map_err(ProviderError::from_reqwest)?;
        payload
            .get("response")
            .and_then(|value| value.as_str())
            .map(str::to_string)
            .ok_or_else(|| ProviderError::Format("reply has no `response` field".to_string()))
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Query the local Ollama install for pulled models via `ollama list`.
pub fn list_models() -> Result<Vec<String>, ProviderError> {
    let output = std::process::Command::new("ollama")
        .arg("list")
        .output()
        .map_err(|e| ProviderError::Unreachable(format!("failed to run `ollama list`: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ProviderError::Transport(stderr.trim().to_string()));
    }

    Ok(parse_model_listing(&String::from_utf8_lossy(&output.stdout)))
}

fn parse_model_listing(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty() && !line.starts_with("NAME"))
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect()
}
