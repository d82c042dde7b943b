//! Retry with exponential backoff for chain reads.
//!
//! Reads against the node (`get_info`, `get_block`, `get_code`,
//! `get_required_keys`) go through a [`RetryExecutor`]. Pushing a signed
//! transaction never does: a failed broadcast is reported to the caller as
//! is.
//!
//! # Example
//!
//! ```rust
//! use eos_rust_sdk::{EosConfig, retry::RetryConfig};
//!
//! let retry = RetryConfig::builder()
//!     .max_retries(5)
//!     .initial_delay_ms(100)
//!     .max_delay_ms(10_000)
//!     .jitter(true)
//!     .build();
//!
//! let config = EosConfig::local().with_retry(retry);
//! assert_eq!(config.retry_config().max_retries, 5);
//! ```

use crate::error::{EosError, EosResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// Backoff settings for retried requests.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt (0 = fail fast).
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    pub initial_delay_ms: u64,
    /// Upper bound for any single delay, in milliseconds.
    pub max_delay_ms: u64,
    /// Growth factor between consecutive delays.
    pub exponential_base: f64,
    /// Whether to randomize delays.
    pub jitter: bool,
    /// Fraction of the delay used as the jitter range (0.0 to 1.0).
    pub jitter_factor: f64,
    /// HTTP status codes worth retrying.
    pub retryable_status_codes: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 100,
            max_delay_ms: 10_000,
            exponential_base: 2.0,
            jitter: true,
            jitter_factor: 0.5,
            retryable_status_codes: vec![408, 429, 500, 502, 503, 504],
        }
    }
}

impl RetryConfig {
    /// Creates a new builder.
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::default()
    }

    /// No retries at all.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Many quick retries, for a local node.
    pub fn aggressive() -> Self {
        Self {
            max_retries: 5,
            initial_delay_ms: 50,
            max_delay_ms: 5_000,
            exponential_base: 1.5,
            jitter_factor: 0.3,
            ..Default::default()
        }
    }

    /// Few, widely spaced retries, for shared public endpoints.
    pub fn conservative() -> Self {
        Self {
            initial_delay_ms: 500,
            max_delay_ms: 30_000,
            ..Default::default()
        }
    }

    /// Delay to wait before retry number `attempt` (1-based).
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
        let delay = (self.initial_delay_ms as f64 * self.exponential_base.powi(exponent))
            .min(self.max_delay_ms as f64);

        let delay = if self.jitter {
            let range = delay * self.jitter_factor;
            (delay + rand::random::<f64>() * range * 2.0 - range).max(0.0)
        } else {
            delay
        };

        Duration::from_millis(delay as u64)
    }

    /// Whether a response with this status should be retried.
    pub fn is_retryable_status(&self, status_code: u16) -> bool {
        self.retryable_status_codes.contains(&status_code)
    }

    /// Whether an error should be retried.
    pub fn is_retryable_error(&self, error: &EosError) -> bool {
        match error {
            EosError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            EosError::Api { status_code, .. } => self.is_retryable_status(*status_code),
            _ => false,
        }
    }
}

/// Builder for [`RetryConfig`].
#[derive(Debug, Clone, Default)]
pub struct RetryConfigBuilder {
    max_retries: Option<u32>,
    initial_delay_ms: Option<u64>,
    max_delay_ms: Option<u64>,
    exponential_base: Option<f64>,
    jitter: Option<bool>,
    jitter_factor: Option<f64>,
    retryable_status_codes: Option<Vec<u16>>,
}

impl RetryConfigBuilder {
    /// Sets the maximum number of retries.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Sets the first delay, in milliseconds.
    pub fn initial_delay_ms(mut self, initial_delay_ms: u64) -> Self {
        self.initial_delay_ms = Some(initial_delay_ms);
        self
    }

    /// Sets the delay cap, in milliseconds.
    pub fn max_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = Some(max_delay_ms);
        self
    }

    /// Sets the growth factor.
    pub fn exponential_base(mut self, base: f64) -> Self {
        self.exponential_base = Some(base);
        self
    }

    /// Enables or disables jitter.
    pub fn jitter(mut self, jitter: bool) -> Self {
        self.jitter = Some(jitter);
        self
    }

    /// Sets the jitter factor, clamped to `0.0..=1.0`.
    pub fn jitter_factor(mut self, factor: f64) -> Self {
        self.jitter_factor = Some(factor.clamp(0.0, 1.0));
        self
    }

    /// Replaces the retryable status codes.
    pub fn retryable_status_codes(mut self, codes: Vec<u16>) -> Self {
        self.retryable_status_codes = Some(codes);
        self
    }

    /// Builds the config, filling unset values from [`RetryConfig::default`].
    pub fn build(self) -> RetryConfig {
        let default = RetryConfig::default();
        RetryConfig {
            max_retries: self.max_retries.unwrap_or(default.max_retries),
            initial_delay_ms: self.initial_delay_ms.unwrap_or(default.initial_delay_ms),
            max_delay_ms: self.max_delay_ms.unwrap_or(default.max_delay_ms),
            exponential_base: self.exponential_base.unwrap_or(default.exponential_base),
            jitter: self.jitter.unwrap_or(default.jitter),
            jitter_factor: self.jitter_factor.unwrap_or(default.jitter_factor),
            retryable_status_codes: self
                .retryable_status_codes
                .unwrap_or(default.retryable_status_codes),
        }
    }
}

/// Runs an async operation, retrying retryable failures.
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    config: RetryConfig,
}

impl RetryExecutor {
    /// Creates an executor for the given config.
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Runs `operation` until it succeeds, fails with a non-retryable error,
    /// or runs out of retries.
    pub async fn execute<F, Fut, T>(&self, operation: F) -> EosResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = EosResult<T>>,
    {
        self.execute_with_predicate(operation, |error| {
            self.config.is_retryable_error(error)
        })
        .await
    }

    /// Like [`execute`](Self::execute), with the caller deciding which
    /// errors are retried.
    pub async fn execute_with_predicate<F, Fut, T, P>(
        &self,
        operation: F,
        should_retry: P,
    ) -> EosResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = EosResult<T>>,
        P: Fn(&EosError) -> bool,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(error) => {
                    if attempt >= self.config.max_retries || !should_retry(&error) {
                        return Err(error);
                    }
                    attempt += 1;
                    let delay = self.config.delay_for_attempt(attempt);
                    debug!(
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %error.sanitized_message(),
                        "retrying chain request"
                    );
                    if !delay.is_zero() {
                        sleep(delay).await;
                    }
                }
            }
        }
    }

    /// The config this executor applies.
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}
