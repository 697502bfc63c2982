//! `OpenAI` provider (chat completions and embeddings).

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::factory::ProviderConfig;
use crate::http::send_json;
use crate::provider::{Provider, ProviderError, ProviderResult};

/// Public API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// `OpenAI` provider using JSON-object response format.
pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    embedding_model: String,
    temperature: f64,
}

#[derive(Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct EmbeddingList {
    #[serde(default)]
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAiProvider {
    /// Create a new `OpenAI` provider. Requires an API key.
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
        info!(model = %config.model, base_url = %base_url, "OpenAI provider initialized");
        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
            model: config.model.clone(),
            embedding_model: config.embedding_model.clone(),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn create_embedding(&self, text: &str) -> ProviderResult<Vec<f32>> {
        let body = json!({ "input": text, "model": self.embedding_model });
        let url = format!("{}/v1/embeddings", self.base_url);
        let list: EmbeddingList =
            send_json(self.client.post(&url).bearer_auth(&self.api_key).json(&body)).await?;
        list.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| ProviderError::EmptyResponse {
                message: "no embedding data returned".into(),
            })
    }

    async fn chat(&self, system_prompt: &str, user_prompt: &str) -> ProviderResult<String> {
        debug!(model = %self.model, "openai chat request");
        let body = json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt },
            ],
            "response_format": { "type": "json_object" },
        });
        let url = format!("{}/v1/chat/completions", self.base_url);
        let completion: ChatCompletion =
            send_json(self.client.post(&url).bearer_auth(&self.api_key).json(&body)).await?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.unwrap_or_default())
            .ok_or_else(|| ProviderError::EmptyResponse {
                message: "no choices returned".into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> ProviderConfig {
        ProviderConfig {
            base_url: Some(server.uri()),
            api_key: Some("sk-test".into()),
            ..ProviderConfig::new("gpt-4o-mini", "text-embedding-3-small")
        }
    }

    #[test]
    fn missing_api_key_is_auth_error() {
        let config = ProviderConfig::new("gpt-4o-mini", "text-embedding-3-small");
        assert_matches!(
            OpenAiProvider::new(&config).err(),
            Some(ProviderError::Auth { .. })
        );
    }

    #[tokio::test]
    async fn chat_requests_json_object() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-mini",
                "response_format": { "type": "json_object" },
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "{\"violation\": true}" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(&config_for(&server)).unwrap();
        assert_eq!(provider.chat("s", "u").await.unwrap(), "{\"violation\": true}");
    }

    #[tokio::test]
    async fn chat_without_choices_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(&config_for(&server)).unwrap();
        assert_matches!(
            provider.chat("s", "u").await,
            Err(ProviderError::EmptyResponse { .. })
        );
    }

    #[tokio::test]
    async fn embedding_reads_first_item() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .and(body_partial_json(json!({ "model": "text-embedding-3-small", "input": "adr" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "embedding": [1.0, 0.0] }]
            })))
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(&config_for(&server)).unwrap();
        assert_eq!(provider.create_embedding("adr").await.unwrap(), vec![1.0, 0.0]);
    }

    #[tokio::test]
    async fn unauthorized_maps_to_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": { "message": "Incorrect API key provided" }
            })))
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(&config_for(&server)).unwrap();
        let err = provider.create_embedding("adr").await.unwrap_err();
        assert_eq!(err.to_string(), "API error (401): Incorrect API key provided");
    }
}
