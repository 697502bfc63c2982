//! # Drift Judge
//!
//! Compares one file's context against one ADR by asking the model for a
//! JSON verdict. Failed attempts (provider errors or unparseable responses)
//! are retried with exponential backoff; a cancellation signal aborts both
//! in-flight calls and backoff waits.

use std::sync::Arc;

use archguard_core::Verdict;
use archguard_core::retry::RetryConfig;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::prompts::build_user_prompt;
use crate::provider::{Provider, ProviderError};

/// Why a single judgment attempt failed.
#[derive(Debug, thiserror::Error)]
pub enum AttemptError {
    /// The provider call failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// The response was not a verdict.
    #[error("invalid json from provider: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl AttemptError {
    /// Error category string for logging.
    pub fn category(&self) -> &str {
        match self {
            Self::Provider(e) => e.category(),
            Self::InvalidJson(_) => "parse",
        }
    }
}

/// Terminal judgment failure for one (file, ADR) pair.
#[derive(Debug, thiserror::Error)]
pub enum JudgeError {
    /// The run was cancelled before a verdict was produced.
    #[error("judgment cancelled")]
    Cancelled,
    /// Every attempt failed.
    #[error("analysis failed after {attempts} attempts: {source}")]
    Exhausted {
        /// Attempts made.
        attempts: u32,
        /// Failure of the last attempt.
        #[source]
        source: AttemptError,
    },
}

/// Slice from the first `{` to the last `}`, dropping conversational
/// wrapping such as markdown fences. Returns the trimmed input when no
/// such pair exists.
pub fn clean_json(raw: &str) -> &str {
    let trimmed = raw.trim();
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if end > start => &trimmed[start..=end],
        _ => trimmed,
    }
}

/// Parse a model response into a [`Verdict`], trying the cleaned slice
/// first and the raw text second.
pub fn parse_verdict(raw: &str) -> Result<Verdict, serde_json::Error> {
    match serde_json::from_str(clean_json(raw)) {
        Ok(verdict) => Ok(verdict),
        Err(e) => serde_json::from_str(raw).map_err(|_| e),
    }
}

/// LLM-backed violation judge.
pub struct DriftJudge {
    provider: Arc<dyn Provider>,
    retry: RetryConfig,
}

impl DriftJudge {
    /// Judge using `provider` with the given retry policy.
    pub fn new(provider: Arc<dyn Provider>, retry: RetryConfig) -> Self {
        Self { provider, retry }
    }

    /// Judge whether `file_context` contradicts `adr_text`.
    pub async fn judge(
        &self,
        adr_text: &str,
        file_context: &str,
        file_path: &str,
        system_prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<Verdict, JudgeError> {
        let user_prompt = build_user_prompt(file_path, adr_text, file_context);
        let max_attempts = self.retry.max_attempts();
        let mut attempt = 0u32;

        loop {
            let response = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(JudgeError::Cancelled),
                r = self.provider.chat(system_prompt, &user_prompt) => r,
            };

            let error = match response {
                Ok(raw) => match parse_verdict(&raw) {
                    Ok(verdict) => return Ok(verdict),
                    Err(e) => AttemptError::InvalidJson(e),
                },
                Err(e) => AttemptError::Provider(e),
            };

            attempt += 1;
            if attempt >= max_attempts {
                return Err(JudgeError::Exhausted {
                    attempts: attempt,
                    source: error,
                });
            }

            let delay = self.retry.delay_for(attempt - 1);
            warn!(
                file = file_path,
                attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                category = error.category(),
                error = %error,
                "judge attempt failed, retrying"
            );
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!(file = file_path, "judge backoff cancelled");
                    return Err(JudgeError::Cancelled);
                }
                () = tokio::time::sleep(delay) => {}
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
