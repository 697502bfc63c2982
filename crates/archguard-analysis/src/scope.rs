//! Scope and suppression filtering.
//!
//! ADR scopes and exclusion patterns are globs over repository-relative
//! paths, compiled to anchored regular expressions:
//!
//! | glob  | matches                                  |
//! |-------|------------------------------------------|
//! | `**`  | anything, separators included            |
//! | `*`   | any run of characters except `/`         |
//! | `?`   | one character except `/`                 |
//!
//! Every other character matches itself, so `services/**/*.go` needs at
//! least one directory below `services/`. Exclusion globs additionally let
//! a leading `**/` match zero directories (see [`Glob::exclusion`]).

use std::collections::HashMap;

use archguard_core::constants::{SUPPRESSION_MARKER, SUPPRESSION_SCAN_CHARS};
use archguard_index::AdrRecord;
use regex::Regex;
use tracing::warn;

/// A compiled path glob.
#[derive(Clone, Debug)]
pub struct Glob {
    regex: Regex,
}

impl Glob {
    /// Compile `pattern` exactly as written.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(&glob_to_regex(pattern))?,
        })
    }

    /// Compile an exclusion pattern. A leading `**/` also matches files at
    /// the repository root, so `**/*_test.go` excludes `main_test.go`.
    pub fn exclusion(pattern: &str) -> Result<Self, regex::Error> {
        let Some(rest) = pattern.strip_prefix("**/") else {
            return Self::new(pattern);
        };
        let mut re = String::from("^(?:.*/)?");
        translate(rest, &mut re);
        re.push('$');
        Ok(Self {
            regex: Regex::new(&re)?,
        })
    }

    /// Whether `path` matches the whole pattern.
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(&normalize(path))
    }
}

/// Translate a glob into an anchored regular expression.
pub fn glob_to_regex(pattern: &str) -> String {
    let mut re = String::with_capacity(pattern.len() * 2 + 2);
    re.push('^');
    translate(pattern, &mut re);
    re.push('$');
    re
}

fn translate(pattern: &str, re: &mut String) {
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                let _ = chars.next();
                re.push_str(".*");
            }
            '*' => re.push_str("[^/]*"),
            '?' => re.push_str("[^/]"),
            other => {
                let mut buf = [0u8; 4];
                re.push_str(&regex::escape(other.encode_utf8(&mut buf)));
            }
        }
    }
}

fn normalize(path: &str) -> String {
    let path = path.replace('\\', "/");
    match path.strip_prefix("./") {
        Some(rest) => rest.to_string(),
        None => path,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ADR scopes
// ─────────────────────────────────────────────────────────────────────────────

/// ADR scope globs, compiled once per index snapshot.
#[derive(Clone, Debug, Default)]
pub struct ScopeSet {
    /// `None` marks a scope that failed to compile.
    scopes: HashMap<String, Option<Glob>>,
}

impl ScopeSet {
    /// Compile the scope of every scoped ADR in `adrs`.
    pub fn new<'a>(adrs: impl IntoIterator<Item = &'a AdrRecord>) -> Self {
        let mut scopes = HashMap::new();
        for adr in adrs {
            let Some(scope) = adr.scope() else {
                continue;
            };
            let glob = match Glob::new(scope) {
                Ok(glob) => Some(glob),
                Err(e) => {
                    warn!(adr = %adr.id, scope, error = %e, "invalid ADR scope, ADR will be skipped");
                    None
                }
            };
            let _ = scopes.insert(adr.id.clone(), glob);
        }
        Self { scopes }
    }

    /// Whether `adr` applies to `path`. An empty scope applies everywhere;
    /// an invalid one applies nowhere.
    pub fn applies(&self, adr: &AdrRecord, path: &str) -> bool {
        match self.scopes.get(&adr.id) {
            Some(Some(glob)) => glob.is_match(path),
            Some(None) => false,
            None => adr.scope().is_none(),
        }
    }
}

/// Whether the head of `text` carries a suppression marker for `adr_id`.
///
/// Only the first [`SUPPRESSION_SCAN_CHARS`] characters are scanned. The
/// identifier is matched as a plain substring, so `archguard-ignore: 00012`
/// also suppresses ADR `0001`.
pub fn is_suppressed(text: &str, adr_id: &str) -> bool {
    let head = match text.char_indices().nth(SUPPRESSION_SCAN_CHARS) {
        Some((end, _)) => &text[..end],
        None => text,
    };
    head.contains(&format!("{SUPPRESSION_MARKER} {adr_id}"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Exclusions
// ─────────────────────────────────────────────────────────────────────────────

/// Exclusion globs applied before files reach the worker pool.
#[derive(Clone, Debug, Default)]
pub struct ExclusionSet {
    globs: Vec<Glob>,
}

impl ExclusionSet {
    /// Compile `patterns`, dropping (and logging) any that fail to compile.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        let globs = patterns
            .iter()
            .filter_map(|p| match Glob::exclusion(p.as_ref()) {
                Ok(glob) => Some(glob),
                Err(e) => {
                    warn!(pattern = p.as_ref(), error = %e, "invalid exclude pattern");
                    None
                }
            })
            .collect();
        Self { globs }
    }

    /// Whether any pattern matches `path`.
    pub fn is_excluded(&self, path: &str) -> bool {
        self.globs.iter().any(|g| g.is_match(path))
    }

    /// Number of compiled patterns.
    pub fn len(&self) -> usize {
        self.globs.len()
    }

    /// Whether no patterns are configured.
    pub fn is_empty(&self) -> bool {
        self.globs.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
