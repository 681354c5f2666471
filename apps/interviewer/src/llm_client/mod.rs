//! LLM Client: the single point of entry for all model calls.
//!
//! ARCHITECTURAL RULE: no other module talks to the model service directly.
//! `ModelClient` owns the timeout and retry policy; the wire protocol lives
//! behind the `TextGenerator` trait so the policy can be exercised with stubs.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

pub mod gemini;
pub mod prompts;

pub use gemini::GeminiGenerator;

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(45);
const DEFAULT_BASE_BACKOFF: Duration = Duration::from_millis(1000);

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LlmError {
    /// Network failure, timeout, 5xx. Retried.
    #[error("Model service unavailable: {0}")]
    Transient(String),

    /// Authentication or rate limit. Never retried.
    #[error("Model service refused the request (status {status}): {message}")]
    Quota { status: u16, message: String },

    /// The service answered but produced no usable text. Never retried here.
    #[error("Model returned no usable text: {0}")]
    EmptyResponse(String),

    /// Any other client error. Never retried.
    #[error("Model request rejected (status {status}): {message}")]
    Rejected { status: u16, message: String },
}

impl LlmError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, LlmError::Transient(_))
    }
}

/// One raw completion round trip: prompt in, free text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, system: &str) -> Result<String, LlmError>;

    /// Model name, for logs.
    fn model(&self) -> &str;
}

/// Bounded retry with exponential backoff: base, 2×base, 4×base, ...
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: Duration,
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_backoff: DEFAULT_BASE_BACKOFF,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl RetryPolicy {
    fn backoff_before(&self, attempt: u32) -> Duration {
        self.base_backoff * (1u32 << (attempt - 1).min(16))
    }
}

/// The model client shared by every phase.
#[derive(Clone)]
pub struct ModelClient {
    generator: Arc<dyn TextGenerator>,
    policy: RetryPolicy,
}

impl ModelClient {
    pub fn new(generator: Arc<dyn TextGenerator>, policy: RetryPolicy) -> Self {
        Self { generator, policy }
    }

    pub fn model(&self) -> &str {
        self.generator.model()
    }

    /// Sends `prompt` and returns the raw text. Each attempt is bounded by the
    /// policy timeout; only `Transient` failures are retried.
    pub async fn send(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..max_attempts {
            if attempt > 0 {
                let delay = self.policy.backoff_before(attempt);
                warn!(
                    "Model call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let outcome =
                tokio::time::timeout(self.policy.timeout, self.generator.generate(prompt, system))
                    .await
                    .unwrap_or_else(|_| {
                        Err(LlmError::Transient(format!(
                            "no response within {}s",
                            self.policy.timeout.as_secs()
                        )))
                    });

            match outcome {
                Ok(text) if text.trim().is_empty() => {
                    return Err(LlmError::EmptyResponse("blank completion".to_string()));
                }
                Ok(text) => {
                    debug!(
                        "Model call succeeded on attempt {} ({} chars)",
                        attempt + 1,
                        text.len()
                    );
                    return Ok(text);
                }
                Err(e) if e.is_retryable() => {
                    warn!("Model call attempt {} hit transient error: {}", attempt + 1, e);
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            LlmError::Transient(format!("gave up after {max_attempts} attempts"))
        }))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Replays scripted outcomes in order; the last one repeats forever.
    pub struct ScriptedGenerator {
        script: Mutex<VecDeque<Result<String, LlmError>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        pub fn new(script: Vec<Result<String, LlmError>>) -> Self {
            assert!(!script.is_empty(), "script needs at least one outcome");
            Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn prompts(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, prompt: &str, _system: &str) -> Result<String, LlmError> {
            self.calls.lock().unwrap().push(prompt.to_string());
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.pop_front().unwrap()
            } else {
                script.front().cloned().unwrap()
            }
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    pub fn test_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_backoff: Duration::from_millis(1000),
            timeout: Duration::from_secs(45),
        }
    }
}
