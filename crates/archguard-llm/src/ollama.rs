//! Ollama provider for locally hosted models.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::factory::ProviderConfig;
use crate::http::send_json;
use crate::provider::{Provider, ProviderError, ProviderResult};

/// Endpoint used when no base URL is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Ollama provider (`/api/chat`, `/api/embeddings`).
pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    embedding_model: String,
    temperature: f64,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    embedding: Vec<f32>,
}

impl OllamaProvider {
    /// Create a new Ollama provider.
    #[must_use]
    pub fn new(config: &ProviderConfig) -> Self {
        let base_url = config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();
        info!(model = %config.model, base_url = %base_url, "Ollama provider initialized");
        Self {
            client: reqwest::Client::new(),
            base_url,
            model: config.model.clone(),
            embedding_model: config.embedding_model.clone(),
            temperature: config.temperature,
        }
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn create_embedding(&self, text: &str) -> ProviderResult<Vec<f32>> {
        let body = json!({
            "model": self.embedding_model,
            "prompt": text,
        });
        let url = format!("{}/api/embeddings", self.base_url);
        let response: EmbeddingResponse = send_json(self.client.post(&url).json(&body)).await?;
        if response.embedding.is_empty() {
            return Err(ProviderError::EmptyResponse {
                message: format!("ollama returned no embedding for model {}", self.embedding_model),
            });
        }
        Ok(response.embedding)
    }

    async fn chat(&self, system_prompt: &str, user_prompt: &str) -> ProviderResult<String> {
        debug!(model = %self.model, "ollama chat request");
        let body = json!({
            "model": self.model,
            "format": "json",
            "stream": false,
            "options": { "temperature": self.temperature },
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt },
            ],
        });
        let url = format!("{}/api/chat", self.base_url);
        let response: ChatResponse = send_json(self.client.post(&url).json(&body)).await?;
        Ok(response.message.content)
    }
}
