//! Timeout and bounded retry around external reasoning/embedding calls.
//!
//! [`ResilientBackend`] wraps any backend and applies, per call:
//! 1. a deadline (`timeout_secs`); expiry surfaces as [`Error::Timeout`]
//! 2. up to `max_retries` further attempts for retryable errors, sleeping
//!    with exponential backoff between attempts
//!
//! Non-retryable errors (configuration, malformed output) return immediately.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use scholia_core::{
    defaults, ChatMessage, EmbeddingBackend, Error, JsonMap, ReasoningBackend, Result, Vector,
};

use crate::config::{ConfigError, ConfigResult};

/// Retry/timeout policy for external calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResilienceConfig {
    /// Deadline for a single attempt.
    pub timeout_secs: u64,
    /// Attempts after the first one for retryable failures.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_backoff_ms: u64,
    /// Cap for any single delay.
    pub max_backoff_ms: u64,
    /// Growth factor between delays.
    pub backoff_multiplier: f64,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            timeout_secs: defaults::CALL_TIMEOUT_SECS,
            max_retries: defaults::MAX_RETRIES,
            initial_backoff_ms: defaults::INITIAL_BACKOFF_MS,
            max_backoff_ms: defaults::MAX_BACKOFF_MS,
            backoff_multiplier: defaults::BACKOFF_MULTIPLIER,
        }
    }
}

impl ResilienceConfig {
    /// No retries, same deadline.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Delay before retry number `retry` (1-based).
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1) as i32;
        let raw = self.initial_backoff_ms as f64 * self.backoff_multiplier.powi(exponent);
        let capped = raw.min(self.max_backoff_ms as f64).max(0.0);
        Duration::from_millis(capped as u64)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "resilience timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.backoff_multiplier < 1.0 {
            return Err(ConfigError::Validation(format!(
                "backoff_multiplier must be >= 1.0, got {}",
                self.backoff_multiplier
            )));
        }
        if self.initial_backoff_ms > self.max_backoff_ms {
            return Err(ConfigError::Validation(format!(
                "initial_backoff_ms ({}) exceeds max_backoff_ms ({})",
                self.initial_backoff_ms, self.max_backoff_ms
            )));
        }
        Ok(())
    }
}

/// Backend wrapper adding deadlines and retries.
pub struct ResilientBackend<B> {
    inner: B,
    config: ResilienceConfig,
}

impl<B> ResilientBackend<B> {
    pub fn new(inner: B, config: ResilienceConfig) -> Self {
        Self { inner, config }
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    pub fn config(&self) -> &ResilienceConfig {
        &self.config
    }

    async fn call<T, F, Fut>(&self, op: &'static str, mut attempt_fn: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let deadline = self.config.timeout();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let outcome = match tokio::time::timeout(deadline, attempt_fn()).await {
                Ok(result) => result,
                Err(_) => Err(Error::Timeout(format!(
                    "{} exceeded {}s",
                    op, self.config.timeout_secs
                ))),
            };

            match outcome {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(op, attempt, "Call succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if e.is_retryable() && attempt <= self.config.max_retries => {
                    let delay = self.config.backoff_for(attempt);
                    warn!(
                        subsystem = "inference",
                        component = "resilience",
                        op,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying after transient failure"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl<B: ReasoningBackend> ReasoningBackend for ResilientBackend<B> {
    async fn extract(&self, prompt: &str, text: &str, schema: &JsonValue) -> Result<JsonMap> {
        self.call("extract", move || self.inner.extract(prompt, text, schema))
            .await
    }

    async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
        self.call("generate", move || self.inner.generate(messages)).await
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

#[async_trait]
impl<B: EmbeddingBackend> EmbeddingBackend for ResilientBackend<B> {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>> {
        self.call("embed_texts", move || self.inner.embed_texts(texts))
            .await
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}
