//! # archguard-tokens
//!
//! Decides how much of a file the drift judge gets to see.
//!
//! A [`TokenBudgeter`] tokenizes file content with the model's BPE encoding
//! (falling back to `cl100k_base` for unrecognized models, then to a
//! 4-bytes-per-token estimate) and returns a [`Selection`]:
//!
//! - content within budget is passed through as [`ContextMode::Full`]
//! - oversized content is replaced by its diff when one exists ([`ContextMode::Diff`])
//! - otherwise it is cut to the budget on a line boundary ([`ContextMode::Truncated`])
//!
//! [`ContextMode::Full`]: archguard_core::ContextMode::Full
//! [`ContextMode::Diff`]: archguard_core::ContextMode::Diff
//! [`ContextMode::Truncated`]: archguard_core::ContextMode::Truncated

#![deny(unsafe_code)]

pub mod budget;

pub use budget::{BYTES_PER_TOKEN, Selection, TokenBudgeter, Tokenizer, byte_prefix};
