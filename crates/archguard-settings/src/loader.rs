//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`ArchguardSettings::default()`]
//! 2. If `archguard.yaml` exists, deep-merge its values over defaults
//! 3. Apply `ARCHGUARD_*` environment overrides (highest priority)
//! 4. Validate the result
//!
//! Deep merge rules:
//! - Mappings are merged recursively (source overrides target per-key)
//! - Sequences and scalars are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use archguard_core::constants::CONFIG_FILE_NAME;
use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::ArchguardSettings;

/// Environment variable holding the API key for cloud providers.
pub const API_KEY_ENV: &str = "ARCHGUARD_API_KEY";

/// Path to `archguard.yaml` under a repository root.
pub fn settings_path(repo_root: &Path) -> PathBuf {
    repo_root.join(CONFIG_FILE_NAME)
}

/// Load settings for a repository root.
pub fn load_settings(repo_root: &Path) -> Result<ArchguardSettings> {
    load_settings_from_path(&settings_path(repo_root))
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file is not valid
/// YAML, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<ArchguardSettings> {
    let defaults = serde_json::to_value(ArchguardSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_yaml::from_str(&content)?;
        if user.is_null() {
            defaults
        } else {
            deep_merge(defaults, user)
        }
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: ArchguardSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Invalid values are ignored with a warning (fall back to file/default).
pub fn apply_env_overrides(settings: &mut ArchguardSettings) {
    if let Some(v) = read_env_string("ARCHGUARD_PROVIDER") {
        settings.llm.provider = v;
    }
    if let Some(v) = read_env_string("ARCHGUARD_MODEL") {
        settings.llm.model = v;
    }
    if let Some(v) = read_env_string("ARCHGUARD_BASE_URL") {
        settings.llm.base_url = Some(v);
    }
    if let Some(v) = read_env_usize("ARCHGUARD_MAX_TOKENS", 1, 2_000_000) {
        settings.llm.max_tokens = v;
    }
    if let Some(v) = read_env_string("ARCHGUARD_EMBEDDING_MODEL") {
        settings.vector_store.model = v;
    }
    if let Some(v) = read_env_f64("ARCHGUARD_SIMILARITY_THRESHOLD", -1.0, 1.0) {
        settings.vector_store.similarity_threshold = v;
    }
    if let Some(v) = read_env_usize("ARCHGUARD_MAX_CONCURRENCY", 1, 256) {
        settings.analysis.max_concurrency = v;
    }
    if let Some(v) = read_env_string("ARCHGUARD_INDEX_FILE") {
        settings.index_file = v;
    }
}

/// API key for cloud providers, if set and non-empty.
pub fn api_key_from_env() -> Option<String> {
    read_env_string(API_KEY_ENV)
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a `usize` within a range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a finite `f64` within a range.
pub fn parse_f64_range(val: &str, min: f64, max: f64) -> Option<f64> {
    let n: f64 = val.trim().parse().ok()?;
    (n.is_finite() && n >= min && n <= max).then_some(n)
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_usize(name: &str, min: usize, max: usize) -> Option<usize> {
    let val = std::env::var(name).ok()?;
    let result = parse_usize_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid usize env var, ignoring");
    }
    result
}

fn read_env_f64(name: &str, min: f64, max: f64) -> Option<f64> {
    let val = std::env::var(name).ok()?;
    let result = parse_f64_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid float env var, ignoring");
    }
    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SettingsError;
    use assert_matches::assert_matches;

    // ── deep_merge ──────────────────────────────────────────────────

    #[test]
    fn merge_nested_override() {
        let target = serde_json::json!({"llm": {"model": "a", "provider": "ollama"}});
        let source = serde_json::json!({"llm": {"model": "b"}});
        let merged = deep_merge(target, source);
        assert_eq!(merged["llm"]["model"], "b");
        assert_eq!(merged["llm"]["provider"], "ollama");
    }

    #[test]
    fn merge_sequence_replaces() {
        let target = serde_json::json!({"items": [1, 2, 3]});
        let source = serde_json::json!({"items": [4]});
        assert_eq!(deep_merge(target, source)["items"], serde_json::json!([4]));
    }

    #[test]
    fn merge_null_preserves_target() {
        let target = serde_json::json!({"a": 1});
        let source = serde_json::json!({"a": null});
        assert_eq!(deep_merge(target, source)["a"], 1);
    }

    // ── load_settings_from_path ─────────────────────────────────────

    #[test]
    fn load_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings_from_path(&dir.path().join("archguard.yaml")).unwrap();
        assert_eq!(settings.vector_store.embedding_dim, 768);
    }

    #[test]
    fn load_empty_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archguard.yaml");
        std::fs::write(&path, "").unwrap();
        let settings = load_settings_from_path(&path).unwrap();
        assert_eq!(settings.llm.model, "llama3.2");
    }

    #[test]
    fn load_partial_yaml_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archguard.yaml");
        std::fs::write(
            &path,
            "llm:\n  provider: openai\n  model: gpt-4o\nvector_store:\n  similarity_threshold: 0.5\nanalysis:\n  exclude_patterns: [\"docs/**\"]\n",
        )
        .unwrap();

        let settings = load_settings_from_path(&path).unwrap();
        assert_eq!(settings.llm.provider, "openai");
        assert_eq!(settings.llm.model, "gpt-4o");
        assert!((settings.vector_store.similarity_threshold - 0.5).abs() < f64::EPSILON);
        assert_eq!(settings.vector_store.model, "nomic-embed-text");
        assert_eq!(settings.analysis.exclude_patterns, vec!["docs/**"]);
        assert_eq!(settings.analysis.accepted_statuses, vec!["Accepted", "Active"]);
    }

    #[test]
    fn load_system_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archguard.yaml");
        std::fs::write(&path, "llm:\n  system_prompt: |\n    Be strict.\n").unwrap();
        let settings = load_settings_from_path(&path).unwrap();
        assert_eq!(settings.llm.custom_system_prompt(), Some("Be strict.\n"));
    }

    #[test]
    fn load_invalid_yaml_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archguard.yaml");
        std::fs::write(&path, "llm: [unclosed").unwrap();
        assert_matches!(load_settings_from_path(&path), Err(SettingsError::Yaml(_)));
    }

    #[test]
    fn load_wrong_type_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archguard.yaml");
        std::fs::write(&path, "analysis:\n  max_concurrency: many\n").unwrap();
        assert_matches!(load_settings_from_path(&path), Err(SettingsError::Json(_)));
    }

    #[test]
    fn load_out_of_range_threshold_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archguard.yaml");
        std::fs::write(&path, "vector_store:\n  similarity_threshold: 3\n").unwrap();
        assert_matches!(
            load_settings_from_path(&path),
            Err(SettingsError::InvalidValue(_))
        );
    }

    #[test]
    fn rendered_defaults_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archguard.yaml");
        std::fs::write(&path, ArchguardSettings::default().to_yaml().unwrap()).unwrap();
        let settings = load_settings_from_path(&path).unwrap();
        assert_eq!(settings.analysis, ArchguardSettings::default().analysis);
    }

    // ── parsing helpers ─────────────────────────────────────────────

    #[test]
    fn parse_usize_range_bounds() {
        assert_eq!(parse_usize_range("5", 1, 10), Some(5));
        assert_eq!(parse_usize_range(" 7 ", 1, 10), Some(7));
        assert_eq!(parse_usize_range("0", 1, 10), None);
        assert_eq!(parse_usize_range("abc", 1, 10), None);
    }

    #[test]
    fn parse_f64_range_bounds() {
        assert_eq!(parse_f64_range("0.5", -1.0, 1.0), Some(0.5));
        assert_eq!(parse_f64_range("1.01", -1.0, 1.0), None);
        assert_eq!(parse_f64_range("NaN", -1.0, 1.0), None);
    }

    #[test]
    fn settings_path_joins_root() {
        assert_eq!(
            settings_path(Path::new("/repo")),
            PathBuf::from("/repo/archguard.yaml")
        );
    }
}
