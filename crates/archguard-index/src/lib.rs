//! # archguard-index
//!
//! The ADR side of drift detection:
//!
//! - [`adr`]: parse ADR markdown with YAML frontmatter into [`AdrRecord`]s
//! - [`builder`]: embed accepted ADRs with bounded parallelism into an [`IndexSnapshot`]
//! - [`snapshot`]: persist, load, and validate snapshots against the current configuration
//! - [`similarity`]: cosine similarity and top-K ranking

#![deny(unsafe_code)]

pub mod adr;
pub mod builder;
pub mod errors;
pub mod similarity;
pub mod snapshot;

pub use adr::{AdrRecord, parse_adr};
pub use builder::{BuildOptions, build_index};
pub use errors::{IndexError, Result};
pub use similarity::{SimilarityHit, cosine_similarity};
pub use snapshot::{IndexExpectation, IndexSnapshot, compute_hash};
