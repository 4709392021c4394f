//! Client configuration types.

use nodeboot_core::BootstrapError;
use std::time::Duration;

/// Per-candidate connect timeout
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(5);

/// Overall timeout for one bootstrap HTTP exchange
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Deadline for reading the diagnostic line of an error response
pub const DETAIL_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Upper bound on bytes read for the diagnostic line of an error response
pub const DETAIL_READ_LIMIT: usize = 4096;

/// Caller-side retry policy for bootstrap attempts.
///
/// The client itself never retries; callers drive their loop with
/// [`RetryConfig::delay_for`].
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,

    /// Initial backoff duration
    pub initial_backoff: Duration,

    /// Maximum backoff duration
    pub max_backoff: Duration,

    /// Fixed wait applied while the controller is not ready yet
    pub not_ready_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryConfig {
    /// Create a new retry configuration
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_retries: 10,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            not_ready_backoff: Duration::from_secs(60),
        }
    }

    /// Set maximum retries
    #[must_use]
    pub const fn max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    /// Set initial backoff duration
    #[must_use]
    pub const fn initial_backoff(mut self, duration: Duration) -> Self {
        self.initial_backoff = duration;
        self
    }

    /// Set maximum backoff duration
    #[must_use]
    pub const fn max_backoff(mut self, duration: Duration) -> Self {
        self.max_backoff = duration;
        self
    }

    /// Set the wait used for not-ready errors
    #[must_use]
    pub const fn not_ready_backoff(mut self, duration: Duration) -> Self {
        self.not_ready_backoff = duration;
        self
    }

    /// Calculate backoff for a given attempt
    #[must_use]
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// How long to wait before retrying after `err` on `attempt`, or `None` to give up
    #[must_use]
    pub fn delay_for(&self, err: &BootstrapError, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_retries || !err.is_retryable() {
            return None;
        }
        if err.is_not_ready() {
            return Some(self.not_ready_backoff);
        }
        Some(self.backoff_for(attempt))
    }
}
