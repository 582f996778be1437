//! Retry logic for manifest fetches

use crate::error::YtselError;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Retry configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,
    /// Initial delay between retries
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Backoff multiplier
    pub backoff_multiplier: f64,
    /// Jitter factor (0.0 to 1.0)
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

impl RetryConfig {
    /// Set maximum retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set initial delay
    pub fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    /// Set jitter factor, clamped to 0.0..=1.0
    pub fn with_jitter(mut self, jitter_factor: f64) -> Self {
        self.jitter_factor = jitter_factor.clamp(0.0, 1.0);
        self
    }

    /// Delay following `delay`, capped at `max_delay`
    pub fn next_delay(&self, delay: Duration) -> Duration {
        let next = Duration::from_millis((delay.as_millis() as f64 * self.backoff_multiplier) as u64);
        next.min(self.max_delay)
    }

    fn jitter(&self, delay: Duration) -> Duration {
        if self.jitter_factor <= 0.0 {
            return Duration::ZERO;
        }
        let range = delay.as_millis() as f64 * self.jitter_factor;
        let jitter = (rand::random::<f64>() - 0.5) * 2.0 * range;
        Duration::from_millis(jitter.abs() as u64)
    }
}

/// Retry executor with exponential backoff
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    config: RetryConfig,
}

impl RetryExecutor {
    /// Create a new retry executor
    pub fn new() -> Self {
        Self::with_config(RetryConfig::default())
    }

    /// Create a new retry executor with configuration
    pub fn with_config(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Retry configuration in use
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `func` until it succeeds or fails with a non-retryable error
    pub async fn execute<F, Fut, T>(&self, func: F) -> Result<T, YtselError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, YtselError>>,
    {
        self.execute_when(func, YtselError::is_retryable).await
    }

    /// Run `func`, retrying while `should_retry` accepts the error
    pub async fn execute_when<F, Fut, T, P>(
        &self,
        mut func: F,
        should_retry: P,
    ) -> Result<T, YtselError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, YtselError>>,
        P: Fn(&YtselError) -> bool,
    {
        let mut delay = self.config.initial_delay;
        let mut attempt = 0;

        loop {
            let error = match func().await {
                Ok(result) => return Ok(result),
                Err(error) => error,
            };

            if attempt >= self.config.max_retries || !should_retry(&error) {
                return Err(error);
            }

            attempt += 1;
            debug!(
                "Attempt {} failed: {}; retrying in {:?}",
                attempt, error, delay
            );
            tokio::time::sleep(delay + self.config.jitter(delay)).await;
            delay = self.config.next_delay(delay);
        }
    }
}
