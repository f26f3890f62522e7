//! Embedding configuration types.

use docent_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Embedding configuration for the knowledge index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Provider name: "trigram", "ollama", "mock"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Provider-specific configuration (JSON object)
    pub provider_config: serde_json::Value,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            provider_config: serde_json::json!({}),
        }
    }
}

impl EmbeddingConfig {
    /// Read a string option from `provider_config`.
    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.provider_config.get(key).and_then(|v| v.as_str())
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.dimensions == 0 {
            return Err(AppError::Config(
                "Embedding dimensions must be positive".to_string(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(AppError::Config("Embedding model must be set".to_string()));
        }
        Ok(())
    }
}
