//! Index error types.

use std::path::PathBuf;

use archguard_llm::ProviderError;
use thiserror::Error;

/// Errors from building, loading, or validating the ADR index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Filesystem access failed.
    #[error("index I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Walking the ADR directory failed.
    #[error("failed to walk ADR directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// The index file is not valid JSON.
    #[error("failed to decode index: {0}")]
    Json(#[from] serde_json::Error),

    /// An ADR file has missing or malformed frontmatter.
    #[error("invalid frontmatter in {}: {message}", path.display())]
    Frontmatter {
        /// Offending file.
        path: PathBuf,
        /// What was wrong.
        message: String,
    },

    /// No index has been built yet.
    #[error("index not found at {} (run 'archguard index' to build it)", path.display())]
    Missing {
        /// Expected index location.
        path: PathBuf,
    },

    /// The index no longer matches configuration or ADR sources.
    #[error("index metadata mismatch:\n  {}", reasons.join("\n  "))]
    Stale {
        /// One entry per mismatching component.
        reasons: Vec<String>,
    },

    /// Embedding an ADR failed; no index is written.
    #[error("failed to embed ADR {rel_path}: {source}")]
    Embedding {
        /// ADR path relative to the ADR directory.
        rel_path: String,
        /// Provider failure.
        #[source]
        source: ProviderError,
    },

    /// An embedding had an unexpected size.
    #[error("embedding for ADR {rel_path} has {actual} dimensions, expected {expected}")]
    Dimension {
        /// ADR path relative to the ADR directory.
        rel_path: String,
        /// Configured or first-seen dimensionality.
        expected: usize,
        /// Size returned by the provider.
        actual: usize,
    },

    /// The build was cancelled.
    #[error("index build cancelled")]
    Cancelled,
}

/// Result alias for index operations.
pub type Result<T> = std::result::Result<T, IndexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_lists_every_reason() {
        let err = IndexError::Stale {
            reasons: vec![
                "Model mismatch (Saved: \"a\", Config: \"b\")".into(),
                "Dimension mismatch (Saved: 3, Config: 4)".into(),
            ],
        };
        let text = err.to_string();
        assert!(text.starts_with("index metadata mismatch:"));
        assert!(text.contains("Model mismatch"));
        assert!(text.contains("Dimension mismatch"));
    }

    #[test]
    fn missing_mentions_rebuild() {
        let err = IndexError::Missing {
            path: PathBuf::from(".archguard/index.json"),
        };
        assert!(err.to_string().contains("archguard index"));
    }
}
