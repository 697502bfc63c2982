//! Verdict and context-mode types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of comparing one file against one ADR.
///
/// Serialized with the field names the model is asked to emit, so the same
/// shape parses judge responses and persists to the result cache.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Whether the code contradicts the ADR decision.
    pub violation: bool,
    /// One-sentence explanation from the model.
    #[serde(default)]
    pub reasoning: String,
    /// Snippet of the code that breaks the rule; may be empty.
    #[serde(rename = "quoted_code", default)]
    pub quoted_excerpt: String,
}

impl Verdict {
    /// A passing verdict with the given reasoning.
    pub fn pass(reasoning: impl Into<String>) -> Self {
        Self {
            violation: false,
            reasoning: reasoning.into(),
            quoted_excerpt: String::new(),
        }
    }

    /// A violating verdict.
    pub fn violation(reasoning: impl Into<String>, quoted_excerpt: impl Into<String>) -> Self {
        Self {
            violation: true,
            reasoning: reasoning.into(),
            quoted_excerpt: quoted_excerpt.into(),
        }
    }
}

/// How the text handed to the model was derived from a file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextMode {
    /// Entire file content fits within the token budget.
    Full,
    /// Content was too large; a diff was used instead.
    Diff,
    /// Content was cut to the token budget.
    Truncated,
}

impl ContextMode {
    /// Lowercase tag used in reports.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Diff => "diff",
            Self::Truncated => "truncated",
        }
    }
}

impl fmt::Display for ContextMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_parses_model_field_names() {
        let v: Verdict = serde_json::from_str(
            r#"{"violation": true, "reasoning": "uses python", "quoted_code": "import x"}"#,
        )
        .unwrap();
        assert!(v.violation);
        assert_eq!(v.quoted_excerpt, "import x");
    }

    #[test]
    fn verdict_optional_fields_default() {
        let v: Verdict = serde_json::from_str(r#"{"violation": false}"#).unwrap();
        assert_eq!(v, Verdict::pass(""));
    }

    #[test]
    fn verdict_requires_violation_flag() {
        assert!(serde_json::from_str::<Verdict>(r#"{"reasoning": "x"}"#).is_err());
    }

    #[test]
    fn verdict_serializes_quoted_code() {
        let json = serde_json::to_value(Verdict::violation("r", "q")).unwrap();
        assert_eq!(json["quoted_code"], "q");
        assert!(json.get("quoted_excerpt").is_none());
    }

    #[test]
    fn context_mode_display() {
        assert_eq!(ContextMode::Full.to_string(), "full");
        assert_eq!(ContextMode::Diff.to_string(), "diff");
        assert_eq!(ContextMode::Truncated.to_string(), "truncated");
    }

    #[test]
    fn context_mode_serde_lowercase() {
        let json = serde_json::to_string(&ContextMode::Truncated).unwrap();
        assert_eq!(json, "\"truncated\"");
    }
}
