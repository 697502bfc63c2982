//! Analysis error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::engine::PipelineResult;

/// Errors from reading files or diffs out of a content source.
#[derive(Debug, Error)]
pub enum ContentError {
    /// A file could not be read from the working tree.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The `git` binary could not be started.
    #[error("failed to run git: {0}")]
    Spawn(#[from] std::io::Error),

    /// A git command exited unsuccessfully.
    #[error("git {command} failed: {stderr}")]
    Git {
        /// Arguments passed to git.
        command: String,
        /// Trimmed stderr output.
        stderr: String,
    },
}

/// Errors that end an analysis run.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The list of files to analyze could not be produced.
    #[error("failed to list files: {0}")]
    Files(#[source] ContentError),

    /// The run finished and found violations.
    #[error("found {} architectural violations", result.violations)]
    ViolationsFound {
        /// Totals for the run.
        result: PipelineResult,
    },

    /// The run was cancelled before every file was analyzed.
    #[error("analysis cancelled")]
    Cancelled,
}

impl AnalysisError {
    /// Violations counted by the run, zero for errors that are not a failing verdict.
    pub fn violation_count(&self) -> usize {
        match self {
            Self::ViolationsFound { result } => result.violations,
            _ => 0,
        }
    }
}

/// Convenience type alias for analysis results.
pub type Result<T> = std::result::Result<T, AnalysisError>;
