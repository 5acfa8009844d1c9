//! Opt-in retry policy for conflicting units of work
//!
//! `Client::txn` never retries. Callers whose work races with concurrent
//! writers on an optimistic backend can use `Client::txn_with_retry`, which
//! re-runs the whole closure after a `KvError::Conflict`.

use std::time::Duration;

/// Bounded exponential backoff between attempts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Re-runs after the first attempt (0 = run once)
    pub max_retries: usize,
    /// Delay before the first re-run in milliseconds
    pub base_delay_ms: u64,
    /// Upper bound on any single delay in milliseconds
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 8,
            base_delay_ms: 1,
            max_delay_ms: 50,
        }
    }
}

impl RetryConfig {
    /// Run the work exactly once
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Set the number of re-runs
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the first delay
    pub fn with_base_delay_ms(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }

    /// Set the delay cap
    pub fn with_max_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }

    /// Delay before re-run number `attempt` (0-based), doubling each time
    pub(crate) fn delay_for(&self, attempt: usize) -> Duration {
        let factor = 1u64 << attempt.min(63);
        let delay_ms = self.base_delay_ms.saturating_mul(factor);
        Duration::from_millis(delay_ms.min(self.max_delay_ms))
    }
}
