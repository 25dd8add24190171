//! Tunables for fetching and analysis.

use std::time::Duration;

/// Retry behaviour for rate-limited requests.
///
/// Only [`TransportError::RateLimited`](crate::api::TransportError::RateLimited) is retried, always after the
/// same fixed delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. At least 1.
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Never sleeps. Useful for tests and for sources without rate limits.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerConfig {
    /// Revision IDs per API request. The MediaWiki API accepts at most 50 for regular users.
    pub batch_size: usize,
    /// Number of batches fetched concurrently.
    pub workers: usize,
    pub retry: RetryPolicy,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            workers: 4,
            retry: RetryPolicy::default(),
        }
    }
}

impl AnalyzerConfig {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = RetryPolicy::new(retry.max_attempts, retry.delay);
        self
    }

    /// Clamp fields that were set directly to their minimum of 1.
    pub fn validated(self) -> Self {
        let Self {
            batch_size,
            workers,
            retry,
        } = self;
        Self::default()
            .with_batch_size(batch_size)
            .with_workers(workers)
            .with_retry(retry)
    }
}
