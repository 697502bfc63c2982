//! # Pipeline Orchestrator
//!
//! Runs every file through context selection, ADR retrieval, filtering, and
//! judgment with bounded parallelism, then folds the per-file results into
//! one [`PipelineResult`].
//!
//! Per file:
//!
//! 1. read content and select context (full, diff, or truncated)
//! 2. under CI mode, skip truncated files with a warning
//! 3. embed the diff (or the context) and search the index
//! 4. for each hit in score order: scope check, suppression check, cache
//!    lookup, then the judge on a miss
//!
//! Reports are flushed under the same lock that updates the totals.

use std::io::Write;
use std::sync::Arc;

use archguard_core::constants::{DEFAULT_MAX_CONCURRENCY, DEFAULT_TOP_K, MAX_QUERY_BYTES};
use archguard_core::retry::RetryConfig;
use archguard_core::{ContextMode, Verdict};
use archguard_index::{AdrRecord, IndexSnapshot};
use archguard_llm::prompts::{DEFAULT_SYSTEM_PROMPT, USER_PROMPT_TEMPLATE};
use archguard_llm::{DriftJudge, JudgeError, Provider};
use archguard_settings::ArchguardSettings;
use archguard_tokens::{Selection, TokenBudgeter, byte_prefix};
use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::{ResultCache, fingerprint};
use crate::content::ContentProvider;
use crate::errors::{AnalysisError, Result};
use crate::report::{FileOutcome, FileReport};
use crate::scope::{ExclusionSet, ScopeSet, is_suppressed};

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Run-time knobs for one engine.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Emit per-step lines (mode, matched ADRs, cache hits) in the report.
    pub debug: bool,
    /// Warn-open: skip truncated files instead of judging partial context.
    pub ci: bool,
    /// Files analyzed in parallel.
    pub max_concurrency: usize,
    /// Minimum cosine similarity for an ADR to be considered.
    pub similarity_threshold: f64,
    /// ADRs retrieved per file.
    pub top_k: usize,
    /// Chat model name; selects the tokenizer and keys the cache.
    pub model: String,
    /// Token ceiling for file context.
    pub max_tokens: usize,
    /// Replacement for the built-in auditor prompt.
    pub system_prompt: Option<String>,
    /// Globs for files never analyzed.
    pub exclude_patterns: Vec<String>,
    /// Judge retry policy.
    pub retry: RetryConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debug: false,
            ci: false,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            similarity_threshold: 0.75,
            top_k: DEFAULT_TOP_K,
            model: String::new(),
            max_tokens: archguard_core::constants::DEFAULT_MAX_TOKENS,
            system_prompt: None,
            exclude_patterns: Vec::new(),
            retry: RetryConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Engine configuration derived from loaded settings.
    pub fn from_settings(settings: &ArchguardSettings, debug: bool, ci: bool) -> Self {
        Self {
            debug,
            ci,
            max_concurrency: settings.analysis.effective_concurrency(),
            similarity_threshold: settings.vector_store.similarity_threshold,
            top_k: DEFAULT_TOP_K,
            model: settings.llm.model.clone(),
            max_tokens: settings.llm.effective_max_tokens(),
            system_prompt: settings.llm.custom_system_prompt().map(str::to_string),
            exclude_patterns: settings.analysis.exclude_patterns.clone(),
            retry: settings.retry.clone(),
        }
    }

    /// Configured system prompt, or the built-in one.
    pub fn effective_system_prompt(&self) -> &str {
        self.system_prompt
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }
}

/// Totals for one run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineResult {
    /// Files that went through retrieval and judging.
    pub files_analyzed: usize,
    /// Files dropped by a read error, the CI warn-open policy, or cancellation.
    pub files_skipped: usize,
    /// Violations across all files.
    pub violations: usize,
}

struct ReportState {
    sink: Box<dyn Write + Send>,
    totals: PipelineResult,
}

// ─────────────────────────────────────────────────────────────────────────────
// Engine
// ─────────────────────────────────────────────────────────────────────────────

/// The analysis pipeline bound to one provider and one index snapshot.
#[derive(Clone)]
pub struct Engine {
    config: Arc<EngineConfig>,
    provider: Arc<dyn Provider>,
    judge: Arc<DriftJudge>,
    snapshot: Arc<IndexSnapshot>,
    budgeter: Arc<TokenBudgeter>,
    cache: Option<ResultCache>,
    exclusions: Arc<ExclusionSet>,
    scopes: Arc<ScopeSet>,
    report: Arc<Mutex<ReportState>>,
}

impl Engine {
    /// Engine writing its report to stdout, without a result cache.
    pub fn new(
        provider: Arc<dyn Provider>,
        snapshot: Arc<IndexSnapshot>,
        config: EngineConfig,
    ) -> Self {
        let judge = DriftJudge::new(Arc::clone(&provider), config.retry.clone());
        let budgeter = TokenBudgeter::for_model(&config.model, config.max_tokens);
        let exclusions = ExclusionSet::new(&config.exclude_patterns);
        let scopes = ScopeSet::new(&snapshot.adrs);
        info!(
            provider = provider.name(),
            model = %config.model,
            adrs = snapshot.adrs.len(),
            concurrency = config.max_concurrency,
            max_tokens = budgeter.max_tokens(),
            ci = config.ci,
            "analysis engine initialized"
        );
        Self {
            config: Arc::new(config),
            provider,
            judge: Arc::new(judge),
            snapshot,
            budgeter: Arc::new(budgeter),
            cache: None,
            exclusions: Arc::new(exclusions),
            scopes: Arc::new(scopes),
            report: Arc::new(Mutex::new(ReportState {
                sink: Box::new(std::io::stdout()),
                totals: PipelineResult::default(),
            })),
        }
    }

    /// Reuse verdicts from `cache`.
    #[must_use]
    pub fn with_cache(mut self, cache: ResultCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Write the report to `sink` instead of stdout.
    #[must_use]
    pub fn with_output(mut self, sink: impl Write + Send + 'static) -> Self {
        self.report = Arc::new(Mutex::new(ReportState {
            sink: Box::new(sink),
            totals: PipelineResult::default(),
        }));
        self
    }

    /// Replace the budgeter derived from the model name.
    #[must_use]
    pub fn with_budgeter(mut self, budgeter: TokenBudgeter) -> Self {
        self.budgeter = Arc::new(budgeter);
        self
    }

    /// Configuration in effect.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Analyze every file `content` lists.
    ///
    /// Returns [`AnalysisError::ViolationsFound`] when any violation was
    /// reported and [`AnalysisError::Cancelled`] when `cancel` fired before
    /// all files finished. Per-file failures are reported and skipped.
    pub async fn run(
        &self,
        content: Arc<dyn ContentProvider>,
        cancel: &CancellationToken,
    ) -> Result<PipelineResult> {
        let files = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(AnalysisError::Cancelled),
            r = content.list_files() => r.map_err(AnalysisError::Files)?,
        };

        let queued: Vec<String> = files
            .into_iter()
            .filter(|f| {
                let excluded = self.exclusions.is_excluded(f);
                if excluded {
                    debug!(file = %f, "excluded");
                }
                !excluded
            })
            .collect();
        info!(files = queued.len(), "starting analysis");

        self.report.lock().totals = PipelineResult::default();
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for path in queued {
            let engine = self.clone();
            let content = Arc::clone(&content);
            let semaphore = Arc::clone(&semaphore);
            let cancel = cancel.clone();
            let _ = tasks.spawn(async move {
                let permit = tokio::select! {
                    biased;
                    () = cancel.cancelled() => return,
                    p = semaphore.acquire_owned() => p,
                };
                let Ok(_permit) = permit else {
                    return;
                };
                let report = engine.analyze_file(content.as_ref(), &path, &cancel).await;
                engine.flush(report);
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "analysis worker panicked");
            }
        }

        let totals = std::mem::take(&mut self.report.lock().totals);
        if cancel.is_cancelled() {
            return Err(AnalysisError::Cancelled);
        }
        info!(
            analyzed = totals.files_analyzed,
            skipped = totals.files_skipped,
            violations = totals.violations,
            "analysis complete"
        );
        if totals.violations > 0 {
            return Err(AnalysisError::ViolationsFound { result: totals });
        }
        Ok(totals)
    }

    fn flush(&self, file: FileReport) {
        let mut guard = self.report.lock();
        let state = &mut *guard;
        if !file.text().is_empty() {
            let written = state
                .sink
                .write_all(file.text().as_bytes())
                .and_then(|()| state.sink.flush());
            if let Err(e) = written {
                warn!(error = %e, "failed to write report");
            }
        }
        match file.outcome() {
            FileOutcome::Analyzed => state.totals.files_analyzed += 1,
            FileOutcome::Skipped | FileOutcome::Cancelled => state.totals.files_skipped += 1,
        }
        state.totals.violations += file.violations();
    }

    async fn analyze_file(
        &self,
        content: &dyn ContentProvider,
        path: &str,
        cancel: &CancellationToken,
    ) -> FileReport {
        let mut report = FileReport::new(self.config.debug);
        report.debug(format_args!("Analyzing {path}..."));

        let full = match content.get_content(path).await {
            Ok(full) => full,
            Err(e) => {
                warn!(file = path, error = %e, "failed to read file");
                report.line(format_args!("Error reading file {path}: {e}"));
                return report.finish(FileOutcome::Skipped);
            }
        };

        let selection = self
            .budgeter
            .select(&full, || async {
                content
                    .get_diff(path)
                    .await
                    .inspect_err(|e| debug!(file = path, error = %e, "diff unavailable"))
                    .ok()
            })
            .await;
        debug!(file = path, mode = %selection.mode, "context resolved");
        report.debug(format_args!("  Context mode: {}", selection.mode));

        if self.config.ci && selection.mode == ContextMode::Truncated {
            warn!(file = path, "truncated context skipped in CI mode");
            report.line(format_args!(
                "  [WARN-OPEN] File {path} was truncated for analysis. \
                 In CI mode this is treated as a warning (no failure)."
            ));
            return report.finish(FileOutcome::Skipped);
        }

        let query = embedding_query(content, path, &selection).await;
        let embedding = tokio::select! {
            biased;
            () = cancel.cancelled() => return report.finish(FileOutcome::Cancelled),
            r = self.provider.create_embedding(&query) => r,
        };
        let embedding = match embedding {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!(file = path, error = %e, "embedding failed");
                report.line(format_args!("Error generating embedding for {path}: {e}"));
                return report.finish(FileOutcome::Analyzed);
            }
        };

        let hits = self.snapshot.search(
            &embedding,
            self.config.similarity_threshold,
            self.config.top_k,
        );
        if hits.is_empty() {
            report.debug(format_args!("  No relevant ADRs found."));
            return report.finish(FileOutcome::Analyzed);
        }

        for hit in hits {
            let adr = hit.adr;
            if !self.scopes.applies(adr, path) {
                debug!(file = path, adr = %adr.id, scope = %adr.scope, "out of scope");
                continue;
            }
            if is_suppressed(&selection.text, &adr.id) {
                info!(file = path, adr = %adr.id, "suppressed by marker");
                report.debug(format_args!("  Skipping ADR {} (Suppressed)", adr.title));
                continue;
            }
            report.debug(format_args!(
                "  Checking against ADR: {} ({:.2})",
                adr.title, hit.score
            ));

            let verdict = match self
                .verdict_for(adr, path, &selection.text, &mut report, cancel)
                .await
            {
                Ok(verdict) => verdict,
                Err(JudgeError::Cancelled) => return report.finish(FileOutcome::Cancelled),
                Err(e) => {
                    warn!(file = path, adr = %adr.id, error = %e, "judgment failed");
                    report.line(format_args!(
                        "    Warning: LLM analysis failed for ADR {} on {path}: {e}",
                        adr.id
                    ));
                    continue;
                }
            };

            if verdict.violation {
                report.add_violation();
                let line = find_line_number(&selection.text, &verdict.quoted_excerpt);
                report.line(format_args!(
                    "    [VIOLATION] {} in {path} [Line {line}]",
                    adr.title
                ));
                report.line(format_args!("    Reasoning: {}", verdict.reasoning));
                if !verdict.quoted_excerpt.is_empty() {
                    report.line(format_args!("    Code: {}", verdict.quoted_excerpt));
                }
            }
        }
        report.finish(FileOutcome::Analyzed)
    }

    async fn verdict_for(
        &self,
        adr: &AdrRecord,
        path: &str,
        context: &str,
        report: &mut FileReport,
        cancel: &CancellationToken,
    ) -> std::result::Result<Verdict, JudgeError> {
        let system_prompt = self.config.effective_system_prompt();
        let key = fingerprint(
            &self.config.model,
            &adr.content,
            context,
            system_prompt,
            USER_PROMPT_TEMPLATE,
        );

        if let Some(cache) = &self.cache {
            if let Some(verdict) = cache.get(&key) {
                debug!(file = path, adr = %adr.id, "cache hit");
                report.debug(format_args!("[DEBUG]   Cache Hit for {}", adr.title));
                return Ok(verdict);
            }
            report.debug(format_args!("[DEBUG]   Cache Miss. Calling LLM..."));
        }

        let verdict = self
            .judge
            .judge(&adr.content, context, path, system_prompt, cancel)
            .await?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(&key, &verdict) {
                warn!(file = path, adr = %adr.id, error = %e, "failed to cache verdict");
            }
        }
        Ok(verdict)
    }
}

/// Text embedded to find relevant ADRs: the file's diff when there is one,
/// otherwise the selected context, capped at [`MAX_QUERY_BYTES`].
async fn embedding_query(
    content: &dyn ContentProvider,
    path: &str,
    selection: &Selection,
) -> String {
    let source = if selection.mode == ContextMode::Diff {
        selection.text.clone()
    } else {
        match content.get_diff(path).await {
            Ok(diff) if !diff.is_empty() => diff,
            _ => selection.text.clone(),
        }
    };
    byte_prefix(&source, MAX_QUERY_BYTES).to_string()
}

/// 1-based line of the first occurrence of `excerpt` in `text`; 0 when the
/// excerpt is empty or absent.
pub fn find_line_number(text: &str, excerpt: &str) -> usize {
    let excerpt = excerpt.trim();
    if excerpt.is_empty() {
        return 0;
    }
    text.find(excerpt)
        .map_or(0, |idx| text[..idx].matches('\n').count() + 1)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
