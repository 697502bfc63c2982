//! Where analyzed files come from.
//!
//! A [`ContentProvider`] lists the files to analyze and serves their content
//! and diff. Paths are relative to the repository root the provider was
//! built with.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::errors::ContentError;
use crate::git;

/// Source of files, contents, and diffs for one analysis run.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Files to analyze.
    async fn list_files(&self) -> Result<Vec<String>, ContentError>;

    /// Full content of `path`.
    async fn get_content(&self, path: &str) -> Result<String, ContentError>;

    /// Change under review for `path`; empty when there is none.
    async fn get_diff(&self, path: &str) -> Result<String, ContentError>;
}

async fn read_worktree(root: &Path, path: &str) -> Result<String, ContentError> {
    let full = root.join(path);
    tokio::fs::read_to_string(&full)
        .await
        .map_err(|source| ContentError::Read { path: full, source })
}

// ─────────────────────────────────────────────────────────────────────────────
// Git-backed providers
// ─────────────────────────────────────────────────────────────────────────────

/// Files with unstaged changes, read from the working tree.
#[derive(Clone, Debug)]
pub struct UncommittedProvider {
    root: PathBuf,
}

impl UncommittedProvider {
    /// Provider for the repository at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ContentProvider for UncommittedProvider {
    async fn list_files(&self) -> Result<Vec<String>, ContentError> {
        git::uncommitted_files(&self.root).await
    }

    async fn get_content(&self, path: &str) -> Result<String, ContentError> {
        read_worktree(&self.root, path).await
    }

    async fn get_diff(&self, path: &str) -> Result<String, ContentError> {
        git::worktree_diff(&self.root, path).await
    }
}

/// Files staged for commit, read from the git index.
#[derive(Clone, Debug)]
pub struct StagedProvider {
    root: PathBuf,
}

impl StagedProvider {
    /// Provider for the repository at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ContentProvider for StagedProvider {
    async fn list_files(&self) -> Result<Vec<String>, ContentError> {
        git::staged_files(&self.root).await
    }

    async fn get_content(&self, path: &str) -> Result<String, ContentError> {
        git::staged_content(&self.root, path).await
    }

    async fn get_diff(&self, path: &str) -> Result<String, ContentError> {
        git::staged_diff(&self.root, path).await
    }
}

/// Every tracked file, read from the working tree.
#[derive(Clone, Debug)]
pub struct TrackedProvider {
    root: PathBuf,
}

impl TrackedProvider {
    /// Provider for the repository at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ContentProvider for TrackedProvider {
    async fn list_files(&self) -> Result<Vec<String>, ContentError> {
        git::tracked_files(&self.root).await
    }

    async fn get_content(&self, path: &str) -> Result<String, ContentError> {
        read_worktree(&self.root, path).await
    }

    async fn get_diff(&self, path: &str) -> Result<String, ContentError> {
        git::worktree_diff(&self.root, path).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Single file
// ─────────────────────────────────────────────────────────────────────────────

/// One explicitly named file.
///
/// The diff comes from git when the file is inside a repository; outside
/// one (or for untracked files) it is empty.
#[derive(Clone, Debug)]
pub struct SingleFileProvider {
    root: PathBuf,
    path: String,
}

impl SingleFileProvider {
    /// Provider for `path` relative to `root`.
    pub fn new(root: impl Into<PathBuf>, path: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            path: path.into(),
        }
    }

    /// The file this provider serves.
    pub fn path(&self) -> &str {
        &self.path
    }
}

#[async_trait]
impl ContentProvider for SingleFileProvider {
    async fn list_files(&self) -> Result<Vec<String>, ContentError> {
        Ok(vec![self.path.clone()])
    }

    async fn get_content(&self, path: &str) -> Result<String, ContentError> {
        read_worktree(&self.root, path).await
    }

    async fn get_diff(&self, path: &str) -> Result<String, ContentError> {
        git::worktree_diff(&self.root, path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn single_file_lists_only_its_path() {
        let provider = SingleFileProvider::new("/repo", "src/main.go");
        assert_eq!(provider.list_files().await.unwrap(), vec!["src/main.go"]);
        assert_eq!(provider.path(), "src/main.go");
    }

    #[tokio::test]
    async fn single_file_reads_relative_to_root() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("src")).unwrap();
        std::fs::write(tmp.path().join("src/main.go"), "package main\n").unwrap();

        let provider = SingleFileProvider::new(tmp.path(), "src/main.go");
        let content = provider.get_content("src/main.go").await.unwrap();
        assert_eq!(content, "package main\n");
    }

    #[tokio::test]
    async fn missing_worktree_file_is_a_read_error() {
        let tmp = tempfile::tempdir().unwrap();
        let provider = UncommittedProvider::new(tmp.path());
        let err = provider.get_content("gone.go").await.unwrap_err();
        assert_matches!(err, ContentError::Read { ref path, .. } if path.ends_with("gone.go"));
        assert!(err.to_string().contains("gone.go"));
    }
}
