//! Token budget enforcement.

use std::future::Future;

use archguard_core::ContextMode;
use archguard_core::constants::DEFAULT_MAX_TOKENS;
use tiktoken_rs::CoreBPE;
use tracing::{debug, warn};

/// Estimated bytes per token when no tokenizer is available.
pub const BYTES_PER_TOKEN: usize = 4;

/// Model used to pick an encoding when none is configured.
const FALLBACK_MODEL: &str = "gpt-3.5-turbo";

/// Text selected for analysis plus how it was derived.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    /// Text handed to the model.
    pub text: String,
    /// How `text` relates to the file content.
    pub mode: ContextMode,
}

/// Counts tokens for a model.
pub enum Tokenizer {
    /// Byte-pair encoding from `tiktoken`.
    Bpe(Box<CoreBPE>),
    /// Length estimate used when no encoding could be loaded.
    ByteHeuristic,
}

impl Tokenizer {
    /// Encoding for `model`, falling back to `cl100k_base`, then to the
    /// byte heuristic.
    pub fn for_model(model: &str) -> Self {
        let model = if model.trim().is_empty() {
            FALLBACK_MODEL
        } else {
            model
        };
        if let Ok(bpe) = tiktoken_rs::get_bpe_from_model(model) {
            return Self::Bpe(Box::new(bpe));
        }
        debug!(model, "no model-specific tokenizer, using cl100k_base");
        match tiktoken_rs::cl100k_base() {
            Ok(bpe) => Self::Bpe(Box::new(bpe)),
            Err(e) => {
                warn!(error = %e, "tokenizer unavailable, estimating by byte length");
                Self::ByteHeuristic
            }
        }
    }
}

impl std::fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bpe(_) => f.write_str("Tokenizer::Bpe"),
            Self::ByteHeuristic => f.write_str("Tokenizer::ByteHeuristic"),
        }
    }
}

/// Fits file content into a token ceiling.
#[derive(Debug)]
pub struct TokenBudgeter {
    tokenizer: Tokenizer,
    max_tokens: usize,
}

impl TokenBudgeter {
    /// Budgeter with an explicit tokenizer. A ceiling of zero means the default.
    pub fn new(tokenizer: Tokenizer, max_tokens: usize) -> Self {
        let max_tokens = if max_tokens == 0 {
            DEFAULT_MAX_TOKENS
        } else {
            max_tokens
        };
        Self {
            tokenizer,
            max_tokens,
        }
    }

    /// Budgeter using the tokenizer for `model`.
    pub fn for_model(model: &str, max_tokens: usize) -> Self {
        Self::new(Tokenizer::for_model(model), max_tokens)
    }

    /// Token ceiling in effect.
    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    /// Select the text to analyze for a file.
    ///
    /// `fetch_diff` is only awaited when the content exceeds the ceiling; an
    /// empty or absent diff falls through to truncation. Diffs are returned
    /// verbatim even when they exceed the ceiling themselves.
    pub async fn select<F, Fut>(&self, content: &str, fetch_diff: F) -> Selection
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<String>>,
    {
        let bpe = match &self.tokenizer {
            Tokenizer::Bpe(bpe) => bpe,
            Tokenizer::ByteHeuristic => return self.select_by_bytes(content),
        };

        let tokens = bpe.encode_ordinary(content);
        if tokens.len() <= self.max_tokens {
            return Selection {
                text: content.to_string(),
                mode: ContextMode::Full,
            };
        }

        if let Some(diff) = fetch_diff().await.filter(|d| !d.is_empty()) {
            return Selection {
                text: diff,
                mode: ContextMode::Diff,
            };
        }

        // A cut through a multi-byte character decodes as invalid UTF-8, so a
        // few shorter prefixes are tried first.
        let cut = self.max_tokens.min(tokens.len());
        let mut text = (cut.saturating_sub(3)..=cut)
            .rev()
            .find_map(|len| bpe.decode(tokens[..len].to_vec()).ok())
            .unwrap_or_else(|| byte_prefix(content, cut * BYTES_PER_TOKEN).to_string());
        if let Some(idx) = text.rfind('\n') {
            text.truncate(idx + 1);
        }
        Selection {
            text,
            mode: ContextMode::Truncated,
        }
    }

    fn select_by_bytes(&self, content: &str) -> Selection {
        let limit = self.max_tokens.saturating_mul(BYTES_PER_TOKEN);
        if content.len() > limit {
            Selection {
                text: byte_prefix(content, limit).to_string(),
                mode: ContextMode::Truncated,
            }
        } else {
            Selection {
                text: content.to_string(),
                mode: ContextMode::Full,
            }
        }
    }
}

/// Longest prefix of `s` no longer than `max_bytes` that ends on a char boundary.
pub fn byte_prefix(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
