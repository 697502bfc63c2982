//! Google Gemini provider (`generateContent`, `embedContent`).
//!
//! Gemini has no separate system role on this endpoint, so the system and
//! user prompts are joined with a blank line into a single part.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::factory::ProviderConfig;
use crate::http::send_json;
use crate::provider::{Provider, ProviderError, ProviderResult};

/// Public API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini provider authenticated by API key query parameter.
pub struct GeminiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    embedding_model: String,
    temperature: f64,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: EmbedValues,
}

#[derive(Deserialize)]
struct EmbedValues {
    #[serde(default)]
    values: Vec<f32>,
}

impl GeminiProvider {
    /// Create a new Gemini provider. Requires an API key.
    pub fn new(config: &ProviderConfig) -> ProviderResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ProviderError::Auth {
                message: "ARCHGUARD_API_KEY is not set".into(),
            })?;
        let base_url = config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();
        info!(model = %config.model, base_url = %base_url, "Gemini provider initialized");
        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
            model: config.model.clone(),
            embedding_model: config.embedding_model.clone(),
            temperature: config.temperature,
        })
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/v1beta/models/{model}:{method}", self.base_url)
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn create_embedding(&self, text: &str) -> ProviderResult<Vec<f32>> {
        let body = json!({ "content": { "parts": [{ "text": text }] } });
        let request = self
            .client
            .post(self.model_url(&self.embedding_model, "embedContent"))
            .query(&[("key", self.api_key.as_str())])
            .json(&body);
        let response: EmbedResponse = send_json(request).await?;
        if response.embedding.values.is_empty() {
            return Err(ProviderError::EmptyResponse {
                message: "gemini returned no embedding values".into(),
            });
        }
        Ok(response.embedding.values)
    }

    async fn chat(&self, system_prompt: &str, user_prompt: &str) -> ProviderResult<String> {
        debug!(model = %self.model, "gemini generateContent request");
        let body = json!({
            "contents": [{ "parts": [{ "text": format!("{system_prompt}\n\n{user_prompt}") }] }],
            "generationConfig": {
                "response_mime_type": "application/json",
                "temperature": self.temperature,
            },
        });
        let request = self
            .client
            .post(self.model_url(&self.model, "generateContent"))
            .query(&[("key", self.api_key.as_str())])
            .json(&body);
        let response: GenerateResponse = send_json(request).await?;
        response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| ProviderError::EmptyResponse {
                message: "gemini returned no candidates or parts".into(),
            })
    }
}
