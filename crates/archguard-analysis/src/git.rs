//! Thin wrappers over the `git` binary.

use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::debug;

use crate::errors::ContentError;

/// Run `git <args>` in `dir` and return stdout.
pub async fn run(dir: &Path, args: &[&str]) -> Result<String, ContentError> {
    debug!(dir = %dir.display(), args = ?args, "running git");
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .await?;

    if !output.status.success() {
        return Err(ContentError::Git {
            command: args.join(" "),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Non-empty trimmed lines of git output.
pub fn output_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Top-level directory of the repository containing `dir`.
pub async fn repo_root(dir: &Path) -> Result<PathBuf, ContentError> {
    let out = run(dir, &["rev-parse", "--show-toplevel"]).await?;
    Ok(PathBuf::from(out.trim()))
}

/// Files staged for commit (added, copied, modified, or renamed).
pub async fn staged_files(root: &Path) -> Result<Vec<String>, ContentError> {
    run(root, &["diff", "--cached", "--name-only", "--diff-filter=ACMR"])
        .await
        .map(|out| output_lines(&out))
}

/// Files with unstaged changes (added, copied, modified, or renamed).
pub async fn uncommitted_files(root: &Path) -> Result<Vec<String>, ContentError> {
    run(root, &["diff", "--name-only", "--diff-filter=ACMR"])
        .await
        .map(|out| output_lines(&out))
}

/// Every tracked file.
pub async fn tracked_files(root: &Path) -> Result<Vec<String>, ContentError> {
    run(root, &["ls-files"]).await.map(|out| output_lines(&out))
}

/// Content of `path` as recorded in the index.
pub async fn staged_content(root: &Path, path: &str) -> Result<String, ContentError> {
    run(root, &["show", &format!(":{path}")]).await
}

/// Diff of the staged version of `path` with 100 lines of context.
pub async fn staged_diff(root: &Path, path: &str) -> Result<String, ContentError> {
    run(root, &["diff", "--cached", "--unified=100", "--", path]).await
}

/// Diff of the working-tree version of `path` with 100 lines of context.
pub async fn worktree_diff(root: &Path, path: &str) -> Result<String, ContentError> {
    run(root, &["diff", "--unified=100", "--", path]).await
}
