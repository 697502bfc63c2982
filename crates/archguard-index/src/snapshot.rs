//! Persisted index snapshots.
//!
//! A snapshot is only trusted when its model name, dimensionality, and
//! source hash all match the current configuration and ADR files. Any
//! mismatch is reported as [`IndexError::Stale`] and requires a rebuild.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;
use walkdir::WalkDir;

use crate::adr::AdrRecord;
use crate::errors::{IndexError, Result};
use crate::similarity::{SimilarityHit, rank};

/// Embedded ADRs plus the metadata that decides whether they are current.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    /// Indexed records in ADR walk order.
    pub adrs: Vec<AdrRecord>,
    /// Hash of the embedding model name and all ADR sources.
    pub hash: String,
    /// Embedding model that produced the vectors.
    pub model_name: String,
    /// Embedding dimensionality.
    pub dim: usize,
}

/// What a snapshot must match to be usable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexExpectation {
    /// Configured embedding model.
    pub model_name: String,
    /// Configured embedding dimensionality.
    pub dim: usize,
    /// Hash of the ADR directory as it is now.
    pub hash: String,
}

impl IndexExpectation {
    /// Expectation for `adr_dir` under the given embedding settings.
    pub fn current(adr_dir: &Path, model_name: &str, dim: usize) -> Result<Self> {
        Ok(Self {
            model_name: model_name.to_string(),
            dim,
            hash: compute_hash(adr_dir, model_name)?,
        })
    }
}

impl IndexSnapshot {
    /// Read a snapshot without validating it.
    pub fn load(path: &Path) -> Result<Self> {
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(IndexError::Missing {
                    path: path.to_path_buf(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&data)?)
    }

    /// Read a snapshot and reject it unless it matches `expected`.
    pub fn load_validated(path: &Path, expected: &IndexExpectation) -> Result<Self> {
        let snapshot = Self::load(path)?;
        snapshot.validate(expected)?;
        debug!(path = %path.display(), adrs = snapshot.adrs.len(), "index loaded");
        Ok(snapshot)
    }

    /// Compare metadata against `expected`, listing every mismatch.
    pub fn validate(&self, expected: &IndexExpectation) -> Result<()> {
        let mut reasons = Vec::new();
        if self.model_name != expected.model_name {
            reasons.push(format!(
                "Model mismatch (Saved: {:?}, Config: {:?})",
                self.model_name, expected.model_name
            ));
        }
        if self.dim != expected.dim {
            reasons.push(format!(
                "Dimension mismatch (Saved: {}, Config: {})",
                self.dim, expected.dim
            ));
        }
        if self.hash != expected.hash {
            reasons.push(format!(
                "Hash mismatch\n    Saved:   {}\n    Current: {}",
                self.hash, expected.hash
            ));
        }
        if reasons.is_empty() {
            Ok(())
        } else {
            Err(IndexError::Stale { reasons })
        }
    }

    /// Write to `path` via a temporary file and rename, so readers never
    /// see a partial index.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let data = serde_json::to_vec_pretty(self)?;
        let tmp = tmp_path(path);
        std::fs::write(&tmp, data)?;
        std::fs::rename(&tmp, path)?;
        debug!(path = %path.display(), adrs = self.adrs.len(), "index saved");
        Ok(())
    }

    /// ADRs scoring at least `threshold` against `query`, best first, at most `top_k`.
    pub fn search(&self, query: &[f32], threshold: f64, top_k: usize) -> Vec<SimilarityHit<'_>> {
        rank(&self.adrs, query, threshold, top_k)
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Hash the embedding model name and every `.md` file under `adr_dir`
/// (file name, then bytes) in lexical walk order.
pub fn compute_hash(adr_dir: &Path, model_name: &str) -> Result<String> {
    let mut hasher = Sha256::new();
    hasher.update(model_name.as_bytes());
    for entry in WalkDir::new(adr_dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() || !is_markdown(entry.path()) {
            continue;
        }
        hasher.update(entry.file_name().to_string_lossy().as_bytes());
        hasher.update(std::fs::read(entry.path())?);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

pub(crate) fn is_markdown(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "md")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn snapshot() -> IndexSnapshot {
        IndexSnapshot {
            adrs: vec![AdrRecord {
                id: "0001".into(),
                title: "Test ADR".into(),
                status: "Accepted".into(),
                content: "Content".into(),
                embedding: vec![0.1, 0.2, 0.3],
                rel_path: "0001-test.md".into(),
                ..AdrRecord::default()
            }],
            hash: "test-hash".into(),
            model_name: "test-model".into(),
            dim: 3,
        }
    }

    fn expectation() -> IndexExpectation {
        IndexExpectation {
            model_name: "test-model".into(),
            dim: 3,
            hash: "test-hash".into(),
        }
    }

    #[test]
    fn save_is_atomic_and_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".archguard").join("index.json");
        snapshot().save(&path).unwrap();

        assert!(path.exists());
        assert!(!tmp_path(&path).exists());
        let loaded = IndexSnapshot::load_validated(&path, &expectation()).unwrap();
        assert_eq!(loaded, snapshot());
    }

    #[test]
    fn saved_json_uses_snake_case_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        snapshot().save(&path).unwrap();
        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["model_name"], "test-model");
        assert_eq!(raw["adrs"][0]["rel_path"], "0001-test.md");
    }

    #[test]
    fn missing_index_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert_matches!(
            IndexSnapshot::load(&dir.path().join("index.json")),
            Err(IndexError::Missing { .. })
        );
    }

    #[test]
    fn corrupt_index_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_matches!(IndexSnapshot::load(&path), Err(IndexError::Json(_)));
    }

    #[test]
    fn every_mismatch_is_reported() {
        let expected = IndexExpectation {
            model_name: "other-model".into(),
            dim: 768,
            hash: "new-hash".into(),
        };
        let err = snapshot().validate(&expected).unwrap_err();
        let IndexError::Stale { reasons } = err else {
            panic!("expected stale index");
        };
        assert_eq!(reasons.len(), 3);
        assert_eq!(
            reasons[0],
            "Model mismatch (Saved: \"test-model\", Config: \"other-model\")"
        );
        assert_eq!(reasons[1], "Dimension mismatch (Saved: 3, Config: 768)");
        assert!(reasons[2].starts_with("Hash mismatch"));
    }

    #[test]
    fn single_mismatch_is_stale() {
        let expected = IndexExpectation {
            hash: "changed".into(),
            ..expectation()
        };
        assert_matches!(
            snapshot().validate(&expected),
            Err(IndexError::Stale { reasons }) if reasons.len() == 1
        );
    }

    #[test]
    fn hash_tracks_model_and_markdown_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("0001-a.md"), "---\ntitle: A\n---\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let base = compute_hash(dir.path(), "nomic-embed-text").unwrap();
        assert_eq!(base.len(), 64);
        assert_eq!(base, compute_hash(dir.path(), "nomic-embed-text").unwrap());
        assert_ne!(base, compute_hash(dir.path(), "other-model").unwrap());

        std::fs::write(dir.path().join("notes.txt"), "still ignored").unwrap();
        assert_eq!(base, compute_hash(dir.path(), "nomic-embed-text").unwrap());

        std::fs::write(dir.path().join("0001-a.md"), "---\ntitle: B\n---\n").unwrap();
        assert_ne!(base, compute_hash(dir.path(), "nomic-embed-text").unwrap());
    }

    #[test]
    fn hash_sees_nested_and_renamed_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("0002-b.md"), "x").unwrap();
        let before = compute_hash(dir.path(), "m").unwrap();

        std::fs::rename(
            dir.path().join("sub").join("0002-b.md"),
            dir.path().join("sub").join("0003-b.md"),
        )
        .unwrap();
        assert_ne!(before, compute_hash(dir.path(), "m").unwrap());
    }

    #[test]
    fn hash_of_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert_matches!(
            compute_hash(&dir.path().join("nope"), "m"),
            Err(IndexError::Walk(_))
        );
    }

    #[test]
    fn search_delegates_to_ranking() {
        let snap = snapshot();
        let hits = snap.search(&[0.1, 0.2, 0.3], 0.9, 3);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].adr.id, "0001");
        assert!(snap.search(&[0.1, 0.2, 0.3], 0.0, 0).is_empty());
    }
}
