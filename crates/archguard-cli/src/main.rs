//! # archguard
//!
//! Architectural drift detector. Commands:
//!
//! - `archguard init`: create `archguard.yaml`, an ADR directory, and local state
//! - `archguard index`: embed accepted ADRs into `.archguard/index.json`
//! - `archguard check`: judge changed files against the ADRs they relate to
//!
//! Every command runs from the git repository root; relative path arguments
//! are rewritten against it first.

#![deny(unsafe_code)]

mod commands;
mod init;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use archguard_analysis::{EngineConfig, git};
use archguard_llm::Provider;
use archguard_settings::{ArchguardSettings, api_key_from_env};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::commands::CheckTarget;

/// Architectural drift detector.
#[derive(Parser, Debug)]
#[command(name = "archguard", version, about = "ArchGuard - Architectural Drift Detector")]
struct Cli {
    /// Log level for diagnostics on stderr (overridden by `RUST_LOG`).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize ArchGuard in the current repository.
    Init,
    /// Rebuild the ADR index.
    Index,
    /// Check for architectural violations.
    Check {
        /// File to check, or `.` for every tracked file.
        path: Option<String>,
        /// Scan staged files only.
        #[arg(long)]
        staged: bool,
        /// Scan all tracked files.
        #[arg(long)]
        all: bool,
        /// Print per-file analysis details.
        #[arg(long)]
        debug: bool,
        /// CI-safe mode: truncated files warn instead of being judged.
        #[arg(long)]
        ci: bool,
    },
}

/// `arg` (relative to `cwd`) as a slash-separated path relative to `root`.
/// Paths outside the repository are returned unchanged.
fn relative_to_root(cwd: &Path, root: &Path, arg: &str) -> String {
    if arg == "." {
        return arg.to_string();
    }
    let absolute = cwd.join(arg);
    match absolute.strip_prefix(root) {
        Ok(rel) => rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => arg.to_string(),
    }
}

fn prepare(root: &Path) -> Result<(ArchguardSettings, Arc<dyn Provider>)> {
    let settings = commands::load_project_settings(root)?;
    let provider = archguard_llm::create_provider(&settings, api_key_from_env())
        .context("failed to create provider")?;
    info!(provider = provider.name(), model = %settings.llm.model, "provider ready");
    Ok((settings, provider))
}

/// Filter directives for the stderr subscriber. `check --debug` raises only
/// the workspace crates to `debug`; HTTP client internals stay at `warn`.
fn log_filter(cli: &Cli) -> String {
    match &cli.command {
        Command::Check { debug: true, .. } => "warn,archguard=debug".to_string(),
        _ => cli.log_level.clone(),
    }
}

/// Token cancelled by the first Ctrl-C.
fn cancel_on_interrupt() -> CancellationToken {
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    drop(tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, cancelling");
            on_interrupt.cancel();
        }
    }));
    cancel
}

async fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let cwd = std::fs::canonicalize(&cwd).unwrap_or(cwd);
    let root: PathBuf = git::repo_root(&cwd)
        .await
        .context("ArchGuard must be run inside a git repository")?;
    if cwd != root {
        debug!(cwd = %cwd.display(), root = %root.display(), "changing to repository root");
        std::env::set_current_dir(&root).context("error changing to git root")?;
    }

    match cli.command {
        Command::Init => {
            let stdin = std::io::stdin();
            init::run_init(&root, stdin.lock(), std::io::stdout())
        }
        Command::Index => {
            let (settings, provider) = prepare(&root)?;
            let cancel = cancel_on_interrupt();
            commands::run_index(&root, &settings, provider.as_ref(), &cancel).await
        }
        Command::Check {
            path,
            staged,
            all,
            debug,
            ci,
        } => {
            let (settings, provider) = prepare(&root)?;
            let cancel = cancel_on_interrupt();
            let target = CheckTarget {
                path: path.map(|p| relative_to_root(&cwd, &root, &p)),
                staged,
                all,
            };
            let config = EngineConfig::from_settings(&settings, debug, ci);
            commands::run_check(&root, &settings, provider, &target, config, &cancel).await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    archguard_core::logging::init_subscriber(&log_filter(&cli));

    println!("ArchGuard - Architectural Drift Detector");
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_flags_parse() {
        let cli = Cli::try_parse_from(["archguard", "check", "src/main.go", "--ci", "--debug"])
            .unwrap();
        match cli.command {
            Command::Check {
                path,
                staged,
                all,
                debug,
                ci,
            } => {
                assert_eq!(path.as_deref(), Some("src/main.go"));
                assert!(debug && ci);
                assert!(!staged && !all);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(cli.log_level, "warn");
    }

    #[test]
    fn debug_filter_is_scoped_to_workspace_crates() {
        let cli = Cli::try_parse_from(["archguard", "check", "--debug"]).unwrap();
        assert_eq!(log_filter(&cli), "warn,archguard=debug");

        let cli = Cli::try_parse_from(["archguard", "--log-level", "info", "index"]).unwrap();
        assert_eq!(log_filter(&cli), "info");
    }

    #[test]
    fn unknown_command_is_rejected() {
        assert!(Cli::try_parse_from(["archguard", "deploy"]).is_err());
    }

    #[test]
    fn relative_paths_are_rewritten_from_subdirectories() {
        let root = Path::new("/repo");
        let cwd = Path::new("/repo/services/api");
        assert_eq!(relative_to_root(cwd, root, "handler.go"), "services/api/handler.go");
        assert_eq!(relative_to_root(root, root, "main.go"), "main.go");
        assert_eq!(relative_to_root(cwd, root, "."), ".");
        assert_eq!(relative_to_root(cwd, root, "/elsewhere/x.go"), "/elsewhere/x.go");
    }
}
