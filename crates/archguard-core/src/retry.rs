//! Retry configuration and backoff calculation.
//!
//! The async retry loop lives next to its caller in `archguard-llm`; this
//! module holds the portable pieces:
//!
//! - [`RetryConfig`]: attempt count and backoff parameters
//! - [`calculate_backoff_delay`]: capped exponential backoff

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default base delay in milliseconds.
pub const DEFAULT_BASE_DELAY_MS: u64 = 2000;
/// Default maximum delay in milliseconds.
pub const DEFAULT_MAX_DELAY_MS: u64 = 60_000;

/// Configuration for retry logic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt (default: 3, so 4 attempts total).
    pub max_retries: u32,
    /// Delay before the first retry in ms (default: 2000).
    pub base_delay_ms: u64,
    /// Upper bound on any single delay in ms (default: 60000).
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
        }
    }
}

impl RetryConfig {
    /// Total attempts including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Wait before retry number `retry` (zero-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        Duration::from_millis(calculate_backoff_delay(
            retry,
            self.base_delay_ms,
            self.max_delay_ms,
        ))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Backoff calculation
// ─────────────────────────────────────────────────────────────────────────────

/// Calculate exponential backoff delay.
///
/// Formula: `min(max_delay, base_delay * 2^attempt)`, where `attempt` is the
/// zero-based retry index.
#[must_use]
pub fn calculate_backoff_delay(attempt: u32, base_delay_ms: u64, max_delay_ms: u64) -> u64 {
    base_delay_ms
        .saturating_mul(1u64 << attempt.min(31))
        .min(max_delay_ms)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_config_defaults() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.max_attempts(), 4);
        assert_eq!(config.base_delay_ms, 2000);
    }

    #[test]
    fn retry_config_partial_serde() {
        let config: RetryConfig = serde_json::from_str(r#"{"max_retries": 1}"#).unwrap();
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.base_delay_ms, 2000);
    }

    #[test]
    fn default_schedule_is_two_four_eight_seconds() {
        let config = RetryConfig::default();
        assert_eq!(config.delay_for(0), Duration::from_secs(2));
        assert_eq!(config.delay_for(1), Duration::from_secs(4));
        assert_eq!(config.delay_for(2), Duration::from_secs(8));
    }

    #[test]
    fn backoff_caps_at_max() {
        assert_eq!(calculate_backoff_delay(10, 1000, 60_000), 60_000);
    }

    #[test]
    fn backoff_high_attempt_no_overflow() {
        assert_eq!(calculate_backoff_delay(100, u64::MAX / 2, u64::MAX), u64::MAX);
    }

    proptest::proptest! {
        #[test]
        fn backoff_is_monotonic(attempt in 0u32..40, base in 1u64..10_000) {
            let a = calculate_backoff_delay(attempt, base, 600_000);
            let b = calculate_backoff_delay(attempt + 1, base, 600_000);
            proptest::prop_assert!(b >= a);
        }
    }
}
