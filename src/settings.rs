use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::providers::{
    mistral, ollama, openrouter, ClassificationProvider, MistralProvider, OllamaProvider,
    OpenRouterProvider,
};

pub const DEFAULT_BATCH_SIZE: usize = 15;
pub const MIN_BATCH_SIZE: usize = 1;
pub const MAX_BATCH_SIZE: usize = 100;

pub const DEFAULT_FOLDER_DEPTH: usize = 3;
pub const MIN_FOLDER_DEPTH: usize = 1;
pub const MAX_FOLDER_DEPTH: usize = 10;

/// Structure depth shown to the model during a refinement round.
pub const REFINE_FOLDER_DEPTH: usize = 6;

/// Which built-in classification prompt style to use. The two styles carry
/// different destination-folder conventions (shot-tree vs. deliverables).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemplateChoice {
    Vfx,
    Commercial,
}

impl std::fmt::Display for TemplateChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vfx => write!(f, "vfx"),
            Self::Commercial => write!(f, "commercial"),
        }
    }
}

impl std::str::FromStr for TemplateChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "vfx" => Ok(Self::Vfx),
            "commercial" => Ok(Self::Commercial),
            _ => Err(format!("unknown template choice: {s}")),
        }
    }
}

/// Per-run settings for the classification pipeline; everything the worker
/// needs travels in here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifySettings {
    pub batch_size: usize,
    pub project_root: String,
    pub folder_depth: usize,
    pub template: TemplateChoice,
}

impl Default for ClassifySettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            project_root: String::new(),
            folder_depth: DEFAULT_FOLDER_DEPTH,
            template: TemplateChoice::Vfx,
        }
    }
}

impl ClassifySettings {
    /// Clamp user-supplied values into their supported ranges.
    pub fn clamped(mut self) -> Self {
        self.batch_size = self.batch_size.clamp(MIN_BATCH_SIZE, MAX_BATCH_SIZE);
        self.folder_depth = self.folder_depth.clamp(MIN_FOLDER_DEPTH, MAX_FOLDER_DEPTH);
        self
    }
}

/// Connection settings for one classification backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum ProviderSettings {
    Ollama { base_url: String, model: String },
    OpenRouter { api_key: String, model: String },
    Mistral { api_key: String, model: String },
}

impl ProviderSettings {
    pub fn ollama_default(model: &str) -> Self {
        Self::Ollama {
            base_url: ollama::DEFAULT_BASE_URL.to_string(),
            model: model.to_string(),
        }
    }

    /// Preflight for the blocking conditions: a missing model or a missing
    /// endpoint/key aborts before any batch is dispatched.
    pub fn validate(&self) -> Result<(), AppError> {
        let model = match self {
            Self::Ollama { base_url, model } => {
                if base_url.trim().is_empty() {
                    return Err(AppError::General(
                        "Ollama server URL is empty".to_string(),
                    ));
                }
                model
            }
            Self::OpenRouter { api_key, model } => {
                if api_key.trim().is_empty() {
                    return Err(AppError::General(
                        "OpenRouter API key is empty".to_string(),
                    ));
                }
                model
            }
            Self::Mistral { api_key, model } => {
                if api_key.trim().is_empty() {
                    return Err(AppError::General("Mistral API key is empty".to_string()));
                }
                model
            }
        };
        if model.trim().is_empty() {
            return Err(AppError::NoModel);
        }
        Ok(())
    }

    pub fn build_provider(&self) -> Result<Arc<dyn ClassificationProvider>, AppError> {
        self.validate()?;
        let provider: Arc<dyn ClassificationProvider> = match self {
            Self::Ollama { base_url, model } => Arc::new(OllamaProvider::new(base_url, model)?),
            Self::OpenRouter { api_key, model } => {
                Arc::new(OpenRouterProvider::new(api_key, model)?)
            }
            Self::Mistral { api_key, model } => Arc::new(MistralProvider::new(api_key, model)?),
        };
        Ok(provider)
    }

    /// Models available for this backend: Ollama asks the local install,
    /// the hosted backends use curated lists.
    pub fn list_models(&self) -> Result<Vec<String>, AppError> {
        match self {
            Self::Ollama { .. } => Ok(ollama::list_models()?),
            Self::OpenRouter { .. } => {
                Ok(openrouter::MODELS.iter().map(|m| m.to_string()).collect())
            }
            Self::Mistral { .. } => Ok(mistral::MODELS.iter().map(|m| m.to_string()).collect()),
        }
    }
}
