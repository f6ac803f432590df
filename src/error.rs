use serde::Serialize;

use crate::providers::ProviderError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("{0}")]
    General(String),

    #[error("No valid files to classify: {0}")]
    NoValidFiles(String),

    #[error("No model selected")]
    NoModel,

    #[error("Template error: {0}")]
    Template(String),
}

impl AppError {
    /// Blocking conditions: everything else is reported on the log stream
    /// and the run continues.
    pub fn is_blocking(&self) -> bool {
        match self {
            Self::NoValidFiles(_) | Self::NoModel => true,
            Self::Provider(err) => err.is_unreachable(),
            _ => false,
        }
    }
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
