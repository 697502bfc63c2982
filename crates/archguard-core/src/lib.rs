//! # archguard-core
//!
//! Foundation types shared by every archguard crate.
//!
//! - **Verdicts**: [`Verdict`] as produced by the drift judge and stored in the result cache
//! - **Context modes**: [`ContextMode`] tagging how a file's text was selected for analysis
//! - **Retry math**: [`retry::RetryConfig`] and exponential backoff calculation
//! - **Logging**: [`logging::init_subscriber`] for the global `tracing` subscriber
//! - **Constants**: well-known paths and defaults

#![deny(unsafe_code)]

pub mod constants;
pub mod logging;
pub mod retry;
pub mod verdict;

pub use verdict::{ContextMode, Verdict};
