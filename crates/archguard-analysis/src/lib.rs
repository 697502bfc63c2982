//! # archguard-analysis
//!
//! The drift-analysis pipeline.
//!
//! - [`engine`]: concurrent per-file orchestration and result aggregation
//! - [`scope`]: ADR scope globs, exclusion globs, and suppression markers
//! - [`cache`]: fingerprinted on-disk verdict cache
//! - [`content`]: where files come from (staged, uncommitted, tracked, single file)
//! - [`git`]: the git commands the content providers run
//! - [`report`]: per-file report buffers and an in-memory sink

#![deny(unsafe_code)]

pub mod cache;
pub mod content;
pub mod engine;
pub mod errors;
pub mod git;
pub mod report;
pub mod scope;

pub use cache::{ResultCache, fingerprint};
pub use content::{
    ContentProvider, SingleFileProvider, StagedProvider, TrackedProvider, UncommittedProvider,
};
pub use engine::{Engine, EngineConfig, PipelineResult, find_line_number};
pub use errors::{AnalysisError, ContentError, Result};
pub use report::{FileOutcome, FileReport, ReportBuffer};
pub use scope::{ExclusionSet, Glob, ScopeSet, is_suppressed};
