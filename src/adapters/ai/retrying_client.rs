//! Retrying LLM Client - retries, backoff and deadline around any LlmClient.
//!
//! Transient failures ([`LlmError::is_transient`]) are retried with
//! exponential backoff until `max_attempts` attempts have been made. The
//! caller's timeout bounds the whole loop: every attempt only gets the budget
//! that is left, and a backoff that would run past the deadline ends the call.
//!
//! Each call, successful or not, is reported once to the [`UsageRecorder`].
//!
//! # Example
//!
//! ```ignore
//! let client = RetryingLlmClient::new(Arc::new(AnthropicClient::new(config)?), ledger)
//!     .with_policy(RetryPolicy::default().with_max_attempts(5));
//! ```

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::ports::{
    CallOutcome, LlmCallEvent, LlmClient, LlmError, LlmRequest, LlmResponse, ProviderInfo,
    UsageRecorder,
};

/// Backoff settings for transient failures.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_backoff: Duration,
    /// Upper bound for any single delay.
    pub max_backoff: Duration,
    /// Growth factor between consecutive delays.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_millis(8000),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Sets the total number of attempts (at least one).
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Sets the first delay.
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Sets the delay cap.
    pub fn with_max_backoff(mut self, backoff: Duration) -> Self {
        self.max_backoff = backoff;
        self
    }

    /// Sets the growth factor.
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Delay to wait after `failed_attempts` consecutive failures.
    pub fn backoff_for(&self, failed_attempts: u32) -> Duration {
        let exponent = failed_attempts.saturating_sub(1).min(i32::MAX as u32) as i32;
        let millis = self.initial_backoff.as_millis() as f64 * self.multiplier.powi(exponent);
        let capped = millis.min(self.max_backoff.as_millis() as f64).max(0.0);
        Duration::from_millis(capped as u64)
    }
}

/// LlmClient wrapper adding retries, a deadline and telemetry.
pub struct RetryingLlmClient {
    inner: Arc<dyn LlmClient>,
    policy: RetryPolicy,
    recorder: Arc<dyn UsageRecorder>,
}

impl RetryingLlmClient {
    /// Wraps a client with the default retry policy.
    pub fn new(inner: Arc<dyn LlmClient>, recorder: Arc<dyn UsageRecorder>) -> Self {
        Self {
            inner,
            policy: RetryPolicy::default(),
            recorder,
        }
    }

    /// Sets the retry policy.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Runs the attempt loop, returning the result and the attempts made.
    async fn run(
        &self,
        request: &LlmRequest,
        timeout: Duration,
        deadline: Instant,
    ) -> (Result<LlmResponse, LlmError>, u32) {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return (Err(LlmError::TimedOut { timeout }), attempt - 1);
            }

            let result = match tokio::time::timeout(
                remaining,
                self.inner.complete(request.clone(), remaining),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => return (Err(LlmError::TimedOut { timeout }), attempt),
            };

            let error = match result {
                Ok(response) => return (Ok(response), attempt),
                Err(e) if !e.is_transient() => return (Err(e), attempt),
                Err(e) => e,
            };

            if attempt >= max_attempts {
                let message = match error {
                    LlmError::Unavailable { message, .. } => message,
                    other => other.to_string(),
                };
                return (
                    Err(LlmError::Unavailable {
                        attempts: attempt,
                        message,
                    }),
                    attempt,
                );
            }

            let delay = self.policy.backoff_for(attempt);
            if Instant::now() + delay >= deadline {
                tracing::warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "LLM retry would exceed the deadline"
                );
                return (Err(LlmError::TimedOut { timeout }), attempt);
            }

            tracing::warn!(
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Retrying LLM request after transient failure"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl LlmClient for RetryingLlmClient {
    async fn complete(
        &self,
        request: LlmRequest,
        timeout: Duration,
    ) -> Result<LlmResponse, LlmError> {
        let started = Instant::now();
        let (result, attempts) = self.run(&request, timeout, started + timeout).await;
        let latency = started.elapsed();

        let info = self.inner.provider_info();
        let event = match &result {
            Ok(response) => {
                LlmCallEvent::new(&info.name, &response.model, CallOutcome::Success, attempts, latency)
                    .with_usage(response.usage)
            }
            Err(error) => LlmCallEvent::new(
                &info.name,
                &info.model,
                outcome_of(error),
                attempts,
                latency,
            ),
        };
        self.recorder.record(event);

        result
    }

    fn provider_info(&self) -> ProviderInfo {
        self.inner.provider_info()
    }
}

fn outcome_of(error: &LlmError) -> CallOutcome {
    match error {
        LlmError::Unavailable { .. } => CallOutcome::Unavailable,
        LlmError::TimedOut { .. } => CallOutcome::TimedOut,
        LlmError::Protocol { .. } => CallOutcome::ProtocolError,
        LlmError::Rejected { .. } => CallOutcome::Rejected,
    }
}
