//! `archguard init`: interactive project setup.

use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use archguard_core::constants::{CONFIG_FILE_NAME, DEFAULT_CACHE_DIR};
use archguard_settings::ArchguardSettings;

/// ADR directory offered when the user just presses enter.
pub const DEFAULT_ADR_PATH: &str = "./docs/arch";

const GITIGNORE_ENTRY: &str = ".archguard/";

/// Starter ADR written on request.
pub const ADR_TEMPLATE: &str = r#"---
title: "[Short, Descriptive Title]"
status: "[Accepted | Proposed | Superseded]"
scope: "[Optional: glob pattern, e.g., **/*.go]"
---

# [ADR Title]

## Context

[Describe the problem or context that requires a decision.]

## Decision

[Clearly state the decision and any rules or constraints it imposes.]

## Consequences

[Describe the expected outcomes, both positive and negative.]
"#;

struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.output, "{question}")?;
        self.output.flush()?;
        let mut line = String::new();
        let _ = self.input.read_line(&mut line).context("input error")?;
        Ok(line.trim().to_string())
    }

    fn confirm(&mut self, question: &str) -> Result<bool> {
        Ok(self.ask(question)?.eq_ignore_ascii_case("y"))
    }

    fn say(&mut self, message: &str) -> Result<()> {
        writeln!(self.output, "{message}")?;
        Ok(())
    }
}

/// Run the setup dialogue for the repository at `root`.
pub fn run_init<R: BufRead, W: Write>(root: &Path, input: R, output: W) -> Result<()> {
    let mut p = Prompter { input, output };

    let answer = p.ask(&format!("Enter ADR directory path [{DEFAULT_ADR_PATH}]: "))?;
    let adr_path = if answer.is_empty() {
        DEFAULT_ADR_PATH.to_string()
    } else {
        answer
    };

    let adr_dir = root.join(&adr_path);
    if !adr_dir.exists() {
        if p.confirm(&format!(
            "Directory '{adr_path}' does not exist. Create it now? (y/n): "
        ))? {
            std::fs::create_dir_all(&adr_dir).context("failed to create ADR directory")?;
            p.say(&format!("Created directory: {adr_path}"))?;

            if p.confirm(
                "Would you like to include a standard ADR_TEMPLATE.md to get started? (y/n): ",
            )? {
                let template = adr_dir.join("ADR_TEMPLATE.md");
                std::fs::write(&template, ADR_TEMPLATE).context("failed to create ADR template")?;
                p.say(&format!("Created template: {}", template.display()))?;
            }
        } else {
            p.say("Skipping directory creation.")?;
        }
    }

    let config_path = root.join(CONFIG_FILE_NAME);
    if config_path.exists()
        && !p.confirm(&format!(
            "{CONFIG_FILE_NAME} already exists. Overwrite with defaults? (y/n): "
        ))?
    {
        p.say("Initialization cancelled.")?;
        return Ok(());
    }

    std::fs::write(&config_path, default_config(&adr_path)?)
        .context("failed to create config file")?;
    p.say(&format!("Created config: {CONFIG_FILE_NAME}"))?;

    std::fs::create_dir_all(root.join(DEFAULT_CACHE_DIR))
        .context("failed to create .archguard directory")?;
    p.say(&format!("Created directory: {DEFAULT_CACHE_DIR}"))?;

    if ensure_gitignore(root).context("failed to update .gitignore")? {
        p.say(&format!("Added {GITIGNORE_ENTRY} to .gitignore"))?;
    }

    p.say("\nArchGuard initialized successfully!")?;
    p.say("Next steps:")?;
    p.say(&format!("  1. Add your ADR files to {adr_path}"))?;
    p.say("  2. Run: archguard index")?;
    p.say("  3. Run: archguard check")?;
    Ok(())
}

/// Default `archguard.yaml` pointing at `adr_path`.
pub fn default_config(adr_path: &str) -> Result<String> {
    let mut settings = ArchguardSettings::default();
    settings.analysis.adr_path = adr_path.to_string();
    Ok(settings.to_yaml()?)
}

/// Append `.archguard/` to the root `.gitignore` unless a line already
/// names it. Returns whether the file changed.
pub fn ensure_gitignore(root: &Path) -> std::io::Result<bool> {
    let path = root.join(".gitignore");
    let existing = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e),
    };
    if existing.lines().any(|l| l.trim() == GITIGNORE_ENTRY) {
        return Ok(false);
    }

    let mut updated = existing;
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(GITIGNORE_ENTRY);
    updated.push('\n');
    std::fs::write(&path, updated)?;
    Ok(true)
}
