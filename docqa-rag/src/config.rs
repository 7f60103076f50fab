//! Configuration for the question-answering pipeline.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{QaError, Result};

/// Retry policy applied to every external service call.
///
/// The default performs a single attempt. Raising `max_attempts` enables
/// exponential backoff between attempts, capped at `max_delay`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
    /// Multiplier applied to the delay after each retry.
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes up to `max_attempts` attempts with default backoff.
    pub fn with_attempts(max_attempts: u32) -> Self {
        Self { max_attempts, ..Default::default() }
    }

    /// Delay to wait after the given failed attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(attempt as i32);
        let delay_ms = self.initial_delay.as_millis() as f64 * factor;
        let capped = delay_ms.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }
}

/// Configuration parameters for the QA pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QaConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of chunks retrieved per question.
    pub top_k: usize,
    /// Sampling temperature passed to the language model.
    pub temperature: f32,
    /// Maximum number of tokens the language model may generate per call.
    pub max_new_tokens: u32,
    /// Maximum number of concurrent map-step calls.
    pub map_concurrency: usize,
    /// Maximum prompt length in characters. Context beyond it is dropped
    /// from the left.
    pub max_prompt_chars: usize,
    /// Timeout applied to each external service call.
    pub service_timeout: Duration,
    /// Retry policy for external service calls.
    pub retry: RetryPolicy,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            chunk_size: 600,
            chunk_overlap: 100,
            top_k: 2,
            temperature: 0.1,
            max_new_tokens: 512,
            map_concurrency: 4,
            max_prompt_chars: 4096,
            service_timeout: Duration::from_secs(120),
            retry: RetryPolicy::default(),
        }
    }
}

impl QaConfig {
    /// Create a new builder for constructing a [`QaConfig`].
    pub fn builder() -> QaConfigBuilder {
        QaConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`QaConfig`].
#[derive(Debug, Clone, Default)]
pub struct QaConfigBuilder {
    config: QaConfig,
}

impl QaConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of chunks retrieved per question.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the language model temperature.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = temperature;
        self
    }

    /// Set the generation budget per call.
    pub fn max_new_tokens(mut self, tokens: u32) -> Self {
        self.config.max_new_tokens = tokens;
        self
    }

    /// Set the number of map-step calls that may run concurrently.
    pub fn map_concurrency(mut self, concurrency: usize) -> Self {
        self.config.map_concurrency = concurrency;
        self
    }

    /// Set the maximum prompt length in characters.
    pub fn max_prompt_chars(mut self, chars: usize) -> Self {
        self.config.max_prompt_chars = chars;
        self
    }

    /// Set the timeout for each external service call.
    pub fn service_timeout(mut self, timeout: Duration) -> Self {
        self.config.service_timeout = timeout;
        self
    }

    /// Set the retry policy for external service calls.
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    /// Build the [`QaConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::Config`] if:
    /// - `chunk_size == 0` or `chunk_overlap >= chunk_size`
    /// - `top_k == 0` or `map_concurrency == 0`
    /// - `temperature` is negative or not finite
    /// - `retry.max_attempts == 0`
    pub fn build(self) -> Result<QaConfig> {
        let config = self.config;
        if config.chunk_size == 0 {
            return Err(QaError::Config("chunk_size must be greater than zero".to_string()));
        }
        if config.chunk_overlap >= config.chunk_size {
            return Err(QaError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }
        if config.top_k == 0 {
            return Err(QaError::Config("top_k must be greater than zero".to_string()));
        }
        if config.map_concurrency == 0 {
            return Err(QaError::Config("map_concurrency must be greater than zero".to_string()));
        }
        if !config.temperature.is_finite() || config.temperature < 0.0 {
            return Err(QaError::Config(format!(
                "temperature ({}) must be a non-negative number",
                config.temperature
            )));
        }
        if config.retry.max_attempts == 0 {
            return Err(QaError::Config("retry.max_attempts must be at least 1".to_string()));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = QaConfig::default();
        assert_eq!(config.chunk_size, 600);
        assert_eq!(config.chunk_overlap, 100);
        assert_eq!(config.top_k, 2);
        assert!((config.temperature - 0.1).abs() < f32::EPSILON);
        assert_eq!(config.max_new_tokens, 512);
        assert_eq!(config.retry.max_attempts, 1);
        assert_eq!(QaConfig::builder().build().unwrap(), config);
    }

    #[test]
    fn rejects_overlap_not_smaller_than_chunk_size() {
        let err = QaConfig::builder().chunk_size(100).chunk_overlap(100).build().unwrap_err();
        assert!(matches!(err, QaError::Config(msg) if msg.contains("chunk_overlap")));
    }

    #[test]
    fn rejects_zero_values() {
        assert!(QaConfig::builder().chunk_size(0).chunk_overlap(0).build().is_err());
        assert!(QaConfig::builder().top_k(0).build().is_err());
        assert!(QaConfig::builder().map_concurrency(0).build().is_err());
        assert!(QaConfig::builder().retry(RetryPolicy::with_attempts(0)).build().is_err());
        assert!(QaConfig::builder().temperature(f32::NAN).build().is_err());
    }

    #[test]
    fn retry_delay_grows_and_is_capped() {
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(1000),
            backoff_multiplier: 2.0,
        };
        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(800));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_millis(1000));
    }
}
