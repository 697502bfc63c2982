//! In-process provider for tests and offline runs.
//!
//! Behavior is supplied as closures; without them the mock returns a unit
//! embedding and a passing verdict.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::provider::{Provider, ProviderResult};

/// Embedding size used when none is configured.
pub const DEFAULT_EMBEDDING_DIM: usize = 1536;

/// Response returned by the default chat behavior.
pub const DEFAULT_CHAT_RESPONSE: &str =
    r#"{"violation": false, "reasoning": "default mock", "quoted_code": ""}"#;

type ChatFn = Arc<dyn Fn(&str, &str) -> ProviderResult<String> + Send + Sync>;
type EmbedFn = Arc<dyn Fn(&str) -> ProviderResult<Vec<f32>> + Send + Sync>;

/// Scriptable [`Provider`] that counts calls.
#[derive(Default)]
pub struct MockProvider {
    chat_fn: Option<ChatFn>,
    embed_fn: Option<EmbedFn>,
    embedding_dim: Option<usize>,
    chat_calls: AtomicUsize,
    embed_calls: AtomicUsize,
}

impl MockProvider {
    /// Mock with default behavior.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `f(system_prompt, user_prompt)` to answer chat calls.
    #[must_use]
    pub fn with_chat<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &str) -> ProviderResult<String> + Send + Sync + 'static,
    {
        self.chat_fn = Some(Arc::new(f));
        self
    }

    /// Use `f(text)` to answer embedding calls.
    #[must_use]
    pub fn with_embedding<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> ProviderResult<Vec<f32>> + Send + Sync + 'static,
    {
        self.embed_fn = Some(Arc::new(f));
        self
    }

    /// Size of the default embedding.
    #[must_use]
    pub fn with_embedding_dim(mut self, dim: usize) -> Self {
        self.embedding_dim = Some(dim);
        self
    }

    /// Number of chat calls received.
    pub fn chat_calls(&self) -> usize {
        self.chat_calls.load(Ordering::SeqCst)
    }

    /// Number of embedding calls received.
    pub fn embed_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn create_embedding(&self, text: &str) -> ProviderResult<Vec<f32>> {
        let _ = self.embed_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(f) = &self.embed_fn {
            return f(text);
        }
        let mut v = vec![0.0; self.embedding_dim.unwrap_or(DEFAULT_EMBEDDING_DIM).max(1)];
        v[0] = 1.0;
        Ok(v)
    }

    async fn chat(&self, system_prompt: &str, user_prompt: &str) -> ProviderResult<String> {
        let _ = self.chat_calls.fetch_add(1, Ordering::SeqCst);
        match &self.chat_fn {
            Some(f) => f(system_prompt, user_prompt),
            None => Ok(DEFAULT_CHAT_RESPONSE.to_string()),
        }
    }
}
