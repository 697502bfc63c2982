//! Provider selection from settings.

use std::sync::Arc;

use archguard_settings::ArchguardSettings;

use crate::gemini::GeminiProvider;
use crate::mock::MockProvider;
use crate::ollama::OllamaProvider;
use crate::openai::OpenAiProvider;
use crate::provider::{Provider, ProviderError, ProviderResult};

/// Connection parameters shared by every backend.
#[derive(Clone, Debug, PartialEq)]
pub struct ProviderConfig {
    /// Chat model.
    pub model: String,
    /// Embedding model.
    pub embedding_model: String,
    /// Endpoint override.
    pub base_url: Option<String>,
    /// Credential for cloud backends.
    pub api_key: Option<String>,
    /// Sampling temperature.
    pub temperature: f64,
    /// Size of embeddings produced by the mock backend.
    pub embedding_dim: usize,
}

impl ProviderConfig {
    /// Config with the given models and no endpoint or credential.
    pub fn new(model: impl Into<String>, embedding_model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            embedding_model: embedding_model.into(),
            base_url: None,
            api_key: None,
            temperature: 0.0,
            embedding_dim: 0,
        }
    }

    /// Config derived from loaded settings.
    pub fn from_settings(settings: &ArchguardSettings, api_key: Option<String>) -> Self {
        Self {
            model: settings.llm.model.clone(),
            embedding_model: settings.vector_store.model.clone(),
            base_url: settings.llm.base_url.clone(),
            api_key,
            temperature: settings.llm.temperature,
            embedding_dim: settings.vector_store.embedding_dim,
        }
    }
}

/// Build the backend named by `llm.provider`.
pub fn create_provider(
    settings: &ArchguardSettings,
    api_key: Option<String>,
) -> ProviderResult<Arc<dyn Provider>> {
    let config = ProviderConfig::from_settings(settings, api_key);
    create_provider_named(&settings.llm.provider, &config)
}

/// Build a backend by name (`ollama`, `openai`, `gemini`, `mock`).
pub fn create_provider_named(
    name: &str,
    config: &ProviderConfig,
) -> ProviderResult<Arc<dyn Provider>> {
    match name.trim().to_ascii_lowercase().as_str() {
        "ollama" => Ok(Arc::new(OllamaProvider::new(config))),
        "openai" => Ok(Arc::new(OpenAiProvider::new(config)?)),
        "gemini" => Ok(Arc::new(GeminiProvider::new(config)?)),
        "mock" => {
            let mut mock = MockProvider::new();
            if config.embedding_dim > 0 {
                mock = mock.with_embedding_dim(config.embedding_dim);
            }
            Ok(Arc::new(mock))
        }
        other => Err(ProviderError::Other {
            message: format!("unsupported provider: {other}"),
        }),
    }
}
