//! `archguard index` and `archguard check`.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use archguard_analysis::{
    ContentProvider, Engine, EngineConfig, ResultCache, SingleFileProvider,
    StagedProvider, TrackedProvider, UncommittedProvider,
};
use archguard_core::constants::INDEX_BUILD_CONCURRENCY;
use archguard_index::{BuildOptions, IndexExpectation, IndexSnapshot, build_index};
use archguard_llm::Provider;
use archguard_settings::{ArchguardSettings, load_settings, settings_path};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Which files `check` looks at.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CheckTarget {
    /// Explicit path; `.` means every tracked file.
    pub path: Option<String>,
    /// Staged changes only.
    pub staged: bool,
    /// Every tracked file.
    pub all: bool,
}

/// Settings from `archguard.yaml` under `root`. Unlike the loader, a
/// missing file is an error: the repository has to be initialized first.
pub fn load_project_settings(root: &Path) -> Result<ArchguardSettings> {
    let path = settings_path(root);
    if !path.exists() {
        bail!(
            "error loading config: {} not found, run 'archguard init' first",
            path.display()
        );
    }
    load_settings(root).context("error loading config")
}

/// Content source for `target`. An explicit path wins over `--staged`,
/// which wins over `--all`; the default is uncommitted changes.
pub fn content_provider(root: &Path, target: &CheckTarget) -> Arc<dyn ContentProvider> {
    match target.path.as_deref() {
        Some(".") => Arc::new(TrackedProvider::new(root)),
        Some(path) => Arc::new(SingleFileProvider::new(root, path)),
        None if target.staged => Arc::new(StagedProvider::new(root)),
        None if target.all => Arc::new(TrackedProvider::new(root)),
        None => Arc::new(UncommittedProvider::new(root)),
    }
}

/// Rebuild the ADR index and save it.
pub async fn run_index(
    root: &Path,
    settings: &ArchguardSettings,
    provider: &dyn Provider,
    cancel: &CancellationToken,
) -> Result<()> {
    let options = BuildOptions {
        adr_dir: root.join(&settings.analysis.adr_path),
        accepted_statuses: settings.analysis.accepted_statuses.clone(),
        model_name: settings.vector_store.model.clone(),
        expected_dim: settings.vector_store.embedding_dim,
        concurrency: INDEX_BUILD_CONCURRENCY,
    };
    let snapshot = build_index(&options, provider, cancel)
        .await
        .context("indexing failed")?;
    snapshot
        .save(&root.join(&settings.index_file))
        .context("failed to save index")?;
    info!(adrs = snapshot.adrs.len(), path = %settings.index_file, "index saved");
    println!("ADR Index updated successfully.");
    Ok(())
}

/// Load the index, then analyze the target files.
pub async fn run_check(
    root: &Path,
    settings: &ArchguardSettings,
    provider: Arc<dyn Provider>,
    target: &CheckTarget,
    config: EngineConfig,
    cancel: &CancellationToken,
) -> Result<()> {
    let expected = IndexExpectation::current(
        &root.join(&settings.analysis.adr_path),
        &settings.vector_store.model,
        settings.vector_store.embedding_dim,
    )
    .context("failed to calculate ADR hash")?;
    let snapshot = IndexSnapshot::load_validated(&root.join(&settings.index_file), &expected)
        .context("index mismatch or load failed (run 'archguard index' to rebuild)")?;

    if config.debug {
        println!("[DEBUG] Mode Enabled");
    }

    let mut engine = Engine::new(provider, Arc::new(snapshot), config);
    match ResultCache::open(root.join(&settings.cache_dir)) {
        Ok(cache) => engine = engine.with_cache(cache),
        Err(e) => warn!(error = %e, dir = %settings.cache_dir, "result cache disabled"),
    }

    let _ = engine
        .run(content_provider(root, target), cancel)
        .await
        .context("analysis failed")?;
    println!("No architectural violations found.");
    Ok(())
}
