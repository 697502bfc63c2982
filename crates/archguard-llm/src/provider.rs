//! # Provider Trait
//!
//! Core abstraction for model backends. The analysis pipeline only needs two
//! capabilities: turning text into an embedding vector, and a single-turn
//! chat completion that returns the raw response text.

use async_trait::async_trait;

/// Result type alias for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors that can occur during provider operations.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Credentials are missing or were rejected before a request was made.
    #[error("Auth error: {message}")]
    Auth {
        /// Error description.
        message: String,
    },

    /// Provider returned a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error description.
        message: String,
    },

    /// Provider answered successfully but without usable content.
    #[error("empty response: {message}")]
    EmptyResponse {
        /// What was missing.
        message: String,
    },

    /// Provider-specific error.
    #[error("{message}")]
    Other {
        /// Error description.
        message: String,
    },
}

impl ProviderError {
    /// Error category string for logging.
    pub fn category(&self) -> &str {
        match self {
            Self::Http(_) => "network",
            Self::Json(_) => "parse",
            Self::Auth { .. } => "auth",
            Self::Api { .. } => "api",
            Self::EmptyResponse { .. } => "empty",
            Self::Other { .. } => "unknown",
        }
    }
}

/// Model capability consumed by index building and analysis.
///
/// Implementors must be `Send + Sync` so one instance can be shared across
/// the worker pool.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Backend identifier (e.g., `"ollama"`, `"openai"`).
    fn name(&self) -> &str;

    /// Embedding vector for `text`.
    async fn create_embedding(&self, text: &str) -> ProviderResult<Vec<f32>>;

    /// Single-turn completion; returns the raw response text.
    async fn chat(&self, system_prompt: &str, user_prompt: &str) -> ProviderResult<String>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
