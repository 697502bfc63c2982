//! Index build: parse, filter by status, embed, hash.

use std::path::PathBuf;

use archguard_core::constants::INDEX_BUILD_CONCURRENCY;
use archguard_llm::Provider;
use futures::{StreamExt, TryStreamExt, stream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::adr::{AdrRecord, parse_adr};
use crate::errors::{IndexError, Result};
use crate::snapshot::{IndexSnapshot, compute_hash, is_markdown};

/// Inputs for [`build_index`].
#[derive(Clone, Debug)]
pub struct BuildOptions {
    /// Directory holding ADR markdown.
    pub adr_dir: PathBuf,
    /// Statuses to index (trimmed, case-insensitive).
    pub accepted_statuses: Vec<String>,
    /// Embedding model name recorded in the snapshot.
    pub model_name: String,
    /// Required embedding size; zero accepts whatever the provider returns.
    pub expected_dim: usize,
    /// Outstanding embedding calls.
    pub concurrency: usize,
}

impl BuildOptions {
    /// Options with the default embedding concurrency.
    pub fn new(adr_dir: impl Into<PathBuf>, model_name: impl Into<String>) -> Self {
        Self {
            adr_dir: adr_dir.into(),
            accepted_statuses: Vec::new(),
            model_name: model_name.into(),
            expected_dim: 0,
            concurrency: INDEX_BUILD_CONCURRENCY,
        }
    }
}

/// Collect ADRs under `options.adr_dir` whose status is accepted.
///
/// Files that fail to parse are skipped with a warning.
pub fn collect_accepted(options: &BuildOptions) -> Result<Vec<AdrRecord>> {
    let mut accepted = Vec::new();
    for entry in WalkDir::new(&options.adr_dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() || !is_markdown(entry.path()) {
            continue;
        }
        match parse_adr(entry.path(), &options.adr_dir) {
            Ok(adr) if adr.has_status_in(&options.accepted_statuses) => accepted.push(adr),
            Ok(adr) => debug!(adr = %adr.rel_path, status = %adr.status, "ADR status not accepted"),
            Err(e) => warn!(path = %entry.path().display(), error = %e, "skipping ADR"),
        }
    }
    Ok(accepted)
}

/// Build a fresh snapshot.
///
/// Any embedding failure fails the whole build; nothing is returned for
/// partial results. The caller persists the snapshot.
pub async fn build_index(
    options: &BuildOptions,
    provider: &dyn Provider,
    cancel: &CancellationToken,
) -> Result<IndexSnapshot> {
    let mut adrs = collect_accepted(options)?;
    info!(count = adrs.len(), "embedding accepted ADRs");

    let embed_all = stream::iter(adrs.iter())
        .map(|adr| async move {
            provider
                .create_embedding(&adr.embedding_text())
                .await
                .map_err(|source| IndexError::Embedding {
                    rel_path: adr.rel_path.clone(),
                    source,
                })
        })
        .buffered(options.concurrency.max(1))
        .try_collect::<Vec<_>>();

    let embeddings = tokio::select! {
        biased;
        () = cancel.cancelled() => return Err(IndexError::Cancelled),
        result = embed_all => result?,
    };

    let expected = match (options.expected_dim, embeddings.first()) {
        (0, Some(first)) => first.len(),
        (dim, _) => dim,
    };
    for (adr, embedding) in adrs.iter_mut().zip(embeddings) {
        if embedding.len() != expected {
            return Err(IndexError::Dimension {
                rel_path: adr.rel_path.clone(),
                expected,
                actual: embedding.len(),
            });
        }
        adr.embedding = embedding;
    }

    let hash = compute_hash(&options.adr_dir, &options.model_name)?;
    info!(adrs = adrs.len(), dim = expected, "index built");
    Ok(IndexSnapshot {
        adrs,
        hash,
        model_name: options.model_name.clone(),
        dim: expected,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
