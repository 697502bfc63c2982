//! # archguard-llm
//!
//! Everything that talks to a language model.
//!
//! - [`Provider`]: the embedding + chat capability every backend implements
//! - Backends: [`OllamaProvider`] (local), [`OpenAiProvider`], [`GeminiProvider`],
//!   and [`MockProvider`] for tests and offline runs
//! - [`create_provider`]: picks a backend from settings
//! - [`prompts`]: the auditor system prompt and the comparison template
//! - [`DriftJudge`]: formats a comparison, calls the model with retry, and
//!   parses the JSON verdict

#![deny(unsafe_code)]

pub mod factory;
pub mod gemini;
mod http;
pub mod judge;
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod prompts;
pub mod provider;

pub use factory::{ProviderConfig, create_provider, create_provider_named};
pub use gemini::GeminiProvider;
pub use judge::{AttemptError, DriftJudge, JudgeError, clean_json, parse_verdict};
pub use mock::MockProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub use provider::{Provider, ProviderError, ProviderResult};
