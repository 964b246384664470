pub mod ollama;

pub use ollama::{LLMHealth, OllamaClient};

use crate::error::LLMError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Model entry as reported by `GET /api/tags`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub size: Option<u64>,
    pub modified_at: Option<String>,
    pub digest: Option<String>,
    /// Fields this crate does not interpret
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Text generation backend used by the metadata generator
#[async_trait]
pub trait LLM: Send + Sync {
    /// Generate a completion for `prompt`, using the default model when `model` is `None`
    async fn complete(&self, prompt: &str, model: Option<&str>) -> Result<String, LLMError>;

    /// List models available on the backend
    async fn models(&self) -> Result<Vec<ModelInfo>, LLMError>;

    fn default_model(&self) -> &str;
}
