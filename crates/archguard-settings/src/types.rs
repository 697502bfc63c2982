//! Settings type definitions.
//!
//! Field names are snake_case to match `archguard.yaml`. Every section
//! carries `#[serde(default)]` so partial files are accepted.

use archguard_core::constants::{
    DEFAULT_CACHE_DIR, DEFAULT_INDEX_FILE, DEFAULT_MAX_CONCURRENCY, DEFAULT_MAX_TOKENS,
};
use archguard_core::retry::RetryConfig;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchguardSettings {
    /// Config schema version.
    pub version: String,
    /// Chat model used to judge drift.
    pub llm: LlmSettings,
    /// Embedding model and similarity parameters.
    pub vector_store: VectorStoreSettings,
    /// Which ADRs and files take part in analysis.
    pub analysis: AnalysisSettings,
    /// Persisted index location, relative to the repository root.
    pub index_file: String,
    /// Verdict cache directory, relative to the repository root.
    pub cache_dir: String,
    /// Judge retry policy.
    pub retry: RetryConfig,
}

impl Default for ArchguardSettings {
    fn default() -> Self {
        Self {
            version: "1".to_string(),
            llm: LlmSettings::default(),
            vector_store: VectorStoreSettings::default(),
            analysis: AnalysisSettings::default(),
            index_file: DEFAULT_INDEX_FILE.to_string(),
            cache_dir: DEFAULT_CACHE_DIR.to_string(),
            retry: RetryConfig::default(),
        }
    }
}

impl ArchguardSettings {
    /// Reject values no run could succeed with.
    pub fn validate(&self) -> Result<()> {
        let threshold = self.vector_store.similarity_threshold;
        if !(-1.0..=1.0).contains(&threshold) {
            return Err(SettingsError::InvalidValue(format!(
                "vector_store.similarity_threshold must be within [-1, 1], got {threshold}"
            )));
        }
        if self.llm.model.trim().is_empty() {
            return Err(SettingsError::InvalidValue("llm.model is empty".into()));
        }
        if self.vector_store.model.trim().is_empty() {
            return Err(SettingsError::InvalidValue(
                "vector_store.model is empty".into(),
            ));
        }
        Ok(())
    }

    /// Render as YAML, as written by `archguard init`.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Chat model settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Backend name: `ollama`, `openai`, `gemini` or `mock`.
    pub provider: String,
    /// Chat model name.
    pub model: String,
    /// Override for the provider's endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Token ceiling for file context handed to the model.
    pub max_tokens: usize,
    /// Sampling temperature.
    pub temperature: f64,
    /// Replaces the built-in auditor prompt when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: "llama3.2".to_string(),
            base_url: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: 0.0,
            system_prompt: None,
        }
    }
}

impl LlmSettings {
    /// Configured system prompt, ignoring blank values.
    pub fn custom_system_prompt(&self) -> Option<&str> {
        self.system_prompt
            .as_deref()
            .filter(|prompt| !prompt.trim().is_empty())
    }

    /// Token ceiling, with zero meaning the default.
    pub fn effective_max_tokens(&self) -> usize {
        if self.max_tokens == 0 {
            DEFAULT_MAX_TOKENS
        } else {
            self.max_tokens
        }
    }
}

/// Embedding settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    /// Storage backend; only `local` is supported.
    pub provider: String,
    /// Embedding model name.
    pub model: String,
    /// Dimensionality the index is expected to have.
    pub embedding_dim: usize,
    /// Minimum cosine similarity for an ADR to be considered.
    pub similarity_threshold: f64,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            provider: "local".to_string(),
            model: "nomic-embed-text".to_string(),
            embedding_dim: 768,
            similarity_threshold: 0.75,
        }
    }
}

/// File selection and worker settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Directory holding ADR markdown files.
    pub adr_path: String,
    /// ADR statuses that are enforced (compared case-insensitively).
    pub accepted_statuses: Vec<String>,
    /// Globs for files never analyzed.
    pub exclude_patterns: Vec<String>,
    /// Files analyzed in parallel; zero means the default.
    pub max_concurrency: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            adr_path: "./docs/arch".to_string(),
            accepted_statuses: vec!["Accepted".to_string(), "Active".to_string()],
            exclude_patterns: vec![
                "**/*_test.go".to_string(),
                "vendor/**".to_string(),
                "go.sum".to_string(),
                "README.md".to_string(),
                "bin/**".to_string(),
                "target/**".to_string(),
            ],
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

impl AnalysisSettings {
    /// Worker count, with zero meaning the default.
    pub fn effective_concurrency(&self) -> usize {
        if self.max_concurrency == 0 {
            DEFAULT_MAX_CONCURRENCY
        } else {
            self.max_concurrency
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn defaults_match_init_template() {
        let s = ArchguardSettings::default();
        assert_eq!(s.llm.provider, "ollama");
        assert_eq!(s.llm.model, "llama3.2");
        assert_eq!(s.vector_store.model, "nomic-embed-text");
        assert_eq!(s.vector_store.embedding_dim, 768);
        assert!((s.vector_store.similarity_threshold - 0.75).abs() < f64::EPSILON);
        assert_eq!(s.analysis.accepted_statuses, vec!["Accepted", "Active"]);
        assert_eq!(s.index_file, ".archguard/index.json");
        assert!(s.validate().is_ok());
    }

    #[test]
    fn zero_values_fall_back() {
        let mut s = ArchguardSettings::default();
        s.analysis.max_concurrency = 0;
        s.llm.max_tokens = 0;
        assert_eq!(s.analysis.effective_concurrency(), 5);
        assert_eq!(s.llm.effective_max_tokens(), 8000);
    }

    #[test]
    fn blank_system_prompt_is_ignored() {
        let mut llm = LlmSettings::default();
        assert_eq!(llm.custom_system_prompt(), None);
        llm.system_prompt = Some("   ".into());
        assert_eq!(llm.custom_system_prompt(), None);
        llm.system_prompt = Some("be strict".into());
        assert_eq!(llm.custom_system_prompt(), Some("be strict"));
    }

    #[test]
    fn threshold_out_of_range_rejected() {
        let mut s = ArchguardSettings::default();
        s.vector_store.similarity_threshold = 1.5;
        assert_matches!(s.validate(), Err(SettingsError::InvalidValue(_)));
    }

    #[test]
    fn yaml_omits_unset_optionals() {
        let yaml = ArchguardSettings::default().to_yaml().unwrap();
        assert!(yaml.contains("provider: ollama"));
        assert!(!yaml.contains("system_prompt"));
        assert!(!yaml.contains("base_url"));
    }
}
