//! Generic retry logic with configurable backoff
//!
//! Provides a retry mechanism for fallible async operations. The delay
//! between attempts follows either a fixed interval or an exponential
//! curve with jitter to prevent thundering herd.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// How the delay between attempts grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// Constant delay of `initial_delay_ms` between attempts
    Fixed,
    /// Delay doubles (by `multiplier`) per attempt, capped at `max_delay_ms`
    Exponential,
}

/// Configuration for retry behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Backoff strategy (default: exponential)
    #[serde(default = "default_strategy")]
    pub strategy: BackoffStrategy,

    /// Delay before the first retry in milliseconds (default: 100ms)
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    /// Maximum delay between retries in milliseconds (default: 10s)
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Maximum number of retry attempts after the first try (default: 5)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Whether to add jitter to computed delays (default: true)
    #[serde(default = "default_true")]
    pub jitter_enabled: bool,

    /// Maximum jitter factor, 0.0 to 1.0 (default: 0.1 = 10%)
    #[serde(default = "default_jitter_factor")]
    pub jitter_factor: f64,
}

const fn default_strategy() -> BackoffStrategy {
    BackoffStrategy::Exponential
}

const fn default_initial_delay() -> u64 {
    100
}

const fn default_max_delay() -> u64 {
    10_000
}

const fn default_multiplier() -> f64 {
    2.0
}

const fn default_max_retries() -> u32 {
    5
}

const fn default_true() -> bool {
    true
}

const fn default_jitter_factor() -> f64 {
    0.1
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
            multiplier: default_multiplier(),
            max_retries: default_max_retries(),
            jitter_enabled: default_true(),
            jitter_factor: default_jitter_factor(),
        }
    }
}

impl RetryConfig {
    /// Fixed-interval retries.
    #[must_use]
    pub const fn fixed(delay_ms: u64, max_retries: u32) -> Self {
        Self {
            strategy: BackoffStrategy::Fixed,
            initial_delay_ms: delay_ms,
            max_delay_ms: delay_ms,
            multiplier: 1.0,
            max_retries,
            jitter_enabled: false,
            jitter_factor: 0.0,
        }
    }

    /// Exponential backoff with jitter.
    #[must_use]
    pub const fn exponential(initial_delay_ms: u64, max_delay_ms: u64, max_retries: u32) -> Self {
        Self {
            strategy: BackoffStrategy::Exponential,
            initial_delay_ms,
            max_delay_ms,
            multiplier: 2.0,
            max_retries,
            jitter_enabled: true,
            jitter_factor: 0.1,
        }
    }

    /// Disable jitter, making delays deterministic.
    #[must_use]
    pub const fn without_jitter(mut self) -> Self {
        self.jitter_enabled = false;
        self
    }

    /// Calculate the delay for a given retry number (0-indexed).
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_wrap,
        clippy::cast_sign_loss,
        clippy::cast_possible_truncation
    )]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = match self.strategy {
            BackoffStrategy::Fixed => self.initial_delay_ms as f64,
            BackoffStrategy::Exponential => {
                (self.initial_delay_ms as f64) * self.multiplier.powi(attempt as i32)
            },
        };

        let mut delay = base.min(self.max_delay_ms as f64);
        if self.jitter_enabled {
            let spread = delay * self.jitter_factor;
            delay = (delay + rand::rng().random_range(-spread..=spread)).max(0.0);
        }

        Duration::from_millis(delay as u64)
    }
}

/// Trait for errors that can be checked for retryability
pub trait Retryable {
    /// Returns true if this error is worth retrying
    fn is_retryable(&self) -> bool;
}

impl Retryable for integration_forecast::FetchError {
    fn is_retryable(&self) -> bool {
        self.is_transient()
    }
}

/// Outcome of a retried operation plus attempt metadata.
#[derive(Debug)]
pub struct RetryResult<T, E> {
    /// The result of the final attempt
    pub result: Result<T, E>,
    /// Number of attempts made (1 = no retries)
    pub attempts: u32,
    /// Total time spent including backoff delays
    pub total_duration: Duration,
}

impl<T, E> RetryResult<T, E> {
    /// Convert to standard Result, discarding metadata.
    pub fn into_result(self) -> Result<T, E> {
        self.result
    }
}

/// Execute an async operation, retrying retryable failures.
///
/// The operation runs once and then up to `max_retries` more times, sleeping
/// the configured backoff between attempts. A non-retryable error returns
/// immediately.
#[allow(clippy::cast_possible_truncation)]
pub async fn with_retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> RetryResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + std::fmt::Display,
{
    let start = std::time::Instant::now();
    let mut attempts = 0u32;

    let result = loop {
        attempts += 1;
        let err = match operation().await {
            Ok(value) => break Ok(value),
            Err(err) => err,
        };

        if !err.is_retryable() {
            debug!(attempts, error = %err, "Giving up on non-retryable error");
            break Err(err);
        }
        // `attempts - 1` retries have happened so far.
        let retries_used = attempts - 1;
        if retries_used >= config.max_retries {
            warn!(
                attempts,
                max_retries = config.max_retries,
                error = %err,
                "Retry budget exhausted"
            );
            break Err(err);
        }

        let delay = config.delay_for_attempt(retries_used);
        debug!(
            attempt = attempts,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "Attempt failed, backing off before retry"
        );
        tokio::time::sleep(delay).await;
    };

    if result.is_ok() && attempts > 1 {
        debug!(
            attempts,
            duration_ms = start.elapsed().as_millis() as u64,
            "Succeeded after retrying"
        );
    }

    RetryResult {
        result,
        attempts,
        total_duration: start.elapsed(),
    }
}

/// Convenience wrapper around [`with_retry`] that discards metadata.
pub async fn retry<F, Fut, T, E>(config: &RetryConfig, operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + std::fmt::Display,
{
    with_retry(config, operation).await.into_result()
}
