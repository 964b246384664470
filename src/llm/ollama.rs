use super::{ModelInfo, LLM};
use crate::config::LLMConfig;
use crate::error::LLMError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

/// Client for a local Ollama server.
///
/// Owns its HTTP connection pool; connections are released when the client is
/// dropped regardless of how earlier requests went.
pub struct OllamaClient {
    config: LLMConfig,
    base_url: Url,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

/// Reachability summary for the LLM backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMHealth {
    pub base_url: String,
    pub default_model: String,
    pub reachable: bool,
    pub models_available: usize,
}

impl OllamaClient {
    pub fn new(config: LLMConfig) -> Result<Self, LLMError> {
        let mut base_url = Url::parse(&config.base_url)?;

        // Relative joins below must keep any path prefix of the base URL
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            config,
            base_url,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Generate text, returning an empty string on any failure
    pub async fn generate(&self, prompt: &str, model: Option<&str>) -> String {
        match self.complete(prompt, model).await {
            Ok(text) => text,
            Err(e) => {
                error!("❌ Error generating text: {}", e);
                String::new()
            }
        }
    }

    /// List available models, returning an empty list on any failure
    pub async fn list_models(&self) -> Vec<ModelInfo> {
        match self.models().await {
            Ok(models) => models,
            Err(e) => {
                error!("❌ Error listing models: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn health(&self) -> LLMHealth {
        let models = self.models().await;

        LLMHealth {
            base_url: self.config.base_url.clone(),
            default_model: self.config.default_model.clone(),
            reachable: models.is_ok(),
            models_available: models.map(|m| m.len()).unwrap_or(0),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, LLMError> {
        Ok(self.base_url.join(path)?)
    }
}

#[async_trait]
impl LLM for OllamaClient {
    async fn complete(&self, prompt: &str, model: Option<&str>) -> Result<String, LLMError> {
        let url = self.endpoint("api/generate")?;
        let model = model.unwrap_or(&self.config.default_model);

        let request = GenerateRequest {
            model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.config.temperature,
                top_p: self.config.top_p,
                max_tokens: self.config.max_tokens,
            },
        };

        debug!("Sending generate request to {} (model {})", url, model);

        let response = self.client.post(url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LLMError::Status { status, body });
        }

        let generated: GenerateResponse = response.json().await?;
        Ok(generated.response.trim().to_string())
    }

    async fn models(&self) -> Result<Vec<ModelInfo>, LLMError> {
        let url = self.endpoint("api/tags")?;

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LLMError::Status { status, body });
        }

        let tags: TagsResponse = response.json().await?;
        Ok(tags.models)
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }
}
