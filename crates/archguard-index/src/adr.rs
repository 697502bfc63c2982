//! ADR markdown parsing.
//!
//! An ADR is a markdown file that starts with a YAML frontmatter block:
//!
//! ```text
//! ---
//! title: Use Go for services
//! status: Accepted
//! scope: "services/**/*.go"
//! ---
//! ## Decision
//! All services must be Go.
//! ```
//!
//! The identifier is the file name up to its first `-` (`0001-use-go.md` → `0001`).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{IndexError, Result};

const DELIMITER: &str = "---";

/// One indexed architectural decision.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AdrRecord {
    /// Identifier used in reports and suppression markers.
    pub id: String,
    /// Frontmatter title.
    pub title: String,
    /// Frontmatter status (e.g. `Accepted`).
    pub status: String,
    /// Glob limiting which files the ADR applies to; empty means all.
    #[serde(default)]
    pub scope: String,
    /// Markdown body after the frontmatter.
    pub content: String,
    /// Embedding of [`AdrRecord::embedding_text`].
    #[serde(default)]
    pub embedding: Vec<f32>,
    /// Path relative to the ADR directory.
    pub rel_path: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Frontmatter {
    title: String,
    status: String,
    scope: String,
}

impl AdrRecord {
    /// Text embedded for similarity search.
    pub fn embedding_text(&self) -> String {
        format!(
            "Title: {}\nStatus: {}\nContent: {}",
            self.title, self.status, self.content
        )
    }

    /// Scope glob, if one is set.
    pub fn scope(&self) -> Option<&str> {
        let scope = self.scope.trim();
        (!scope.is_empty()).then_some(scope)
    }

    /// Whether the status is one of `accepted` (trimmed, case-insensitive).
    pub fn has_status_in(&self, accepted: &[String]) -> bool {
        let status = self.status.trim();
        accepted
            .iter()
            .any(|candidate| candidate.trim().eq_ignore_ascii_case(status))
    }
}

/// Read and parse the ADR at `path`; `rel_path` is recorded relative to `root`.
pub fn parse_adr(path: &Path, root: &Path) -> Result<AdrRecord> {
    let raw = std::fs::read_to_string(path)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let rel_path = path
        .strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned();
    parse_adr_source(&file_name, rel_path, &raw).map_err(|message| IndexError::Frontmatter {
        path: path.to_path_buf(),
        message,
    })
}

/// Parse ADR text. Errors are plain messages; [`parse_adr`] attaches the path.
pub fn parse_adr_source(
    file_name: &str,
    rel_path: String,
    raw: &str,
) -> std::result::Result<AdrRecord, String> {
    let Some(after_open) = raw.strip_prefix(DELIMITER) else {
        return Err("no frontmatter found".into());
    };
    let Some((yaml, content)) = split_frontmatter(after_open) else {
        return Err("unterminated frontmatter block".into());
    };

    let fm: Frontmatter = if yaml.trim().is_empty() {
        Frontmatter::default()
    } else {
        serde_yaml::from_str(yaml).map_err(|e| format!("failed to parse frontmatter: {e}"))?
    };

    let id = file_name.split('-').next().unwrap_or_default().to_string();

    Ok(AdrRecord {
        id,
        title: fm.title,
        status: fm.status,
        scope: fm.scope,
        content: content.to_string(),
        embedding: Vec::new(),
        rel_path,
    })
}

/// Split text following the opening delimiter at the closing `---` line.
fn split_frontmatter(after_open: &str) -> Option<(&str, &str)> {
    let mut offset = 0;
    for line in after_open.split_inclusive('\n') {
        if offset > 0 && line.trim_end() == DELIMITER {
            return Some((&after_open[..offset], &after_open[offset + DELIMITER.len()..]));
        }
        offset += line.len();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "---\ntitle: Use Go\nstatus: Accepted\nscope: \"services/**/*.go\"\n---\n\n## Decision\nAll services must be Go.\n";

    #[test]
    fn parses_frontmatter_and_body() {
        let adr = parse_adr_source("0001-use-go.md", "0001-use-go.md".into(), SAMPLE).unwrap();
        assert_eq!(adr.id, "0001");
        assert_eq!(adr.title, "Use Go");
        assert_eq!(adr.status, "Accepted");
        assert_eq!(adr.scope(), Some("services/**/*.go"));
        assert_eq!(adr.content, "\n\n## Decision\nAll services must be Go.\n");
        assert!(adr.embedding.is_empty());
    }

    #[test]
    fn missing_frontmatter_is_rejected() {
        let err = parse_adr_source("0002-x.md", "0002-x.md".into(), "# Just markdown\n").unwrap_err();
        assert_eq!(err, "no frontmatter found");
    }

    #[test]
    fn unterminated_frontmatter_is_rejected() {
        let err = parse_adr_source("0003-x.md", "x".into(), "---\ntitle: x\n").unwrap_err();
        assert_eq!(err, "unterminated frontmatter block");
    }

    #[test]
    fn horizontal_rule_in_body_is_kept() {
        let raw = "---\ntitle: T\nstatus: Accepted\n---\nbefore\n---\nafter\n";
        let adr = parse_adr_source("0004-t.md", "t".into(), raw).unwrap();
        assert_eq!(adr.content, "\nbefore\n---\nafter\n");
    }

    #[test]
    fn file_without_dash_uses_whole_file_name() {
        let adr = parse_adr_source("README.md", "README.md".into(), "---\n---\nbody").unwrap();
        assert_eq!(adr.id, "README.md");
        assert_eq!(adr.scope(), None);
    }

    #[test]
    fn status_matching_is_trimmed_and_case_insensitive() {
        let adr = AdrRecord {
            status: " accepted ".into(),
            ..AdrRecord::default()
        };
        assert!(adr.has_status_in(&["Accepted".into()]));
        assert!(!adr.has_status_in(&["Proposed".into()]));
    }

    #[test]
    fn embedding_text_format() {
        let adr = AdrRecord {
            title: "T".into(),
            status: "Accepted".into(),
            content: "body".into(),
            ..AdrRecord::default()
        };
        assert_eq!(adr.embedding_text(), "Title: T\nStatus: Accepted\nContent: body");
    }

    #[test]
    fn parse_adr_records_relative_path() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("platform");
        std::fs::create_dir_all(&nested).unwrap();
        let path = nested.join("0007-queues.md");
        std::fs::write(&path, SAMPLE).unwrap();
        let adr = parse_adr(&path, dir.path()).unwrap();
        assert_eq!(adr.rel_path, Path::new("platform").join("0007-queues.md").to_string_lossy());
        assert_eq!(adr.id, "0007");
    }
}
