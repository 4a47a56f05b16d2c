//! Mock LLM Client for testing and offline development.
//!
//! Provides a configurable implementation of the LlmClient port, allowing
//! tests (and `llm.provider = "mock"`) to run without calling a real API.
//!
//! # Features
//!
//! - Pre-configured responses and errors, consumed in order
//! - Echo of the last user message once the queue is empty
//! - Simulated delays for timeout and cancellation testing
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let client = MockLlmClient::new()
//!     .with_transient_failures(2)
//!     .with_response("Hello, I'm the assistant!");
//!
//! let response = client.complete(request, Duration::from_secs(5)).await;
//! assert!(response.is_err()); // first queued entry is a transient failure
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::writing::{StopReason, TokenUsage};
use crate::ports::{LlmClient, LlmError, LlmRequest, LlmResponse, MessageRole, ProviderInfo};

const MOCK_MODEL: &str = "mock-model";

/// Mock LLM client.
///
/// Clones share the response queue and call history.
#[derive(Debug, Clone)]
pub struct MockLlmClient {
    /// Pre-configured outcomes (consumed in order).
    responses: Arc<Mutex<VecDeque<Result<LlmResponse, LlmError>>>>,
    /// Simulated latency per request.
    delay: Duration,
    /// Call history for verification.
    calls: Arc<Mutex<Vec<LlmRequest>>>,
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLlmClient {
    /// Creates a new mock client with an empty queue.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Adds a successful, complete response to the queue.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.with_response_full(LlmResponse::new(
            content,
            StopReason::Complete,
            TokenUsage::new(10, 20),
            MOCK_MODEL,
        ))
    }

    /// Adds a fully specified response to the queue.
    pub fn with_response_full(self, response: LlmResponse) -> Self {
        lock(&self.responses).push_back(Ok(response));
        self
    }

    /// Adds an error to the queue.
    pub fn with_error(self, error: LlmError) -> Self {
        lock(&self.responses).push_back(Err(error));
        self
    }

    /// Queues `count` transient failures.
    pub fn with_transient_failures(self, count: usize) -> Self {
        {
            let mut responses = lock(&self.responses);
            for i in 0..count {
                responses.push_back(Err(LlmError::unavailable(format!(
                    "simulated server error {}",
                    i + 1
                ))));
            }
        }
        self
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Returns the number of calls made to this client.
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Returns all recorded calls.
    pub fn calls(&self) -> Vec<LlmRequest> {
        lock(&self.calls).clone()
    }

    /// Gets the next queued outcome, or echoes the last user message.
    fn next_response(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        lock(&self.responses).pop_front().unwrap_or_else(|| {
            let echo = request
                .messages
                .iter()
                .rev()
                .find(|m| m.role == MessageRole::User)
                .map(|m| m.content.clone())
                .unwrap_or_default();
            Ok(LlmResponse::new(
                echo,
                StopReason::Complete,
                TokenUsage::new(5, 10),
                MOCK_MODEL,
            ))
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(
        &self,
        request: LlmRequest,
        timeout: Duration,
    ) -> Result<LlmResponse, LlmError> {
        lock(&self.calls).push(request.clone());

        if !self.delay.is_zero() {
            if self.delay > timeout {
                sleep(timeout).await;
                return Err(LlmError::unavailable(format!(
                    "attempt timed out after {}ms",
                    timeout.as_millis()
                )));
            }
            sleep(self.delay).await;
        }

        self.next_response(&request)
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("mock", MOCK_MODEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(text: &str) -> LlmRequest {
        LlmRequest::new("system", 100).with_user_message(text)
    }

    #[tokio::test]
    async fn returns_queued_responses_in_order() {
        let client = MockLlmClient::new()
            .with_response("first")
            .with_error(LlmError::protocol("second"));

        let first = client.complete(request("a"), Duration::from_secs(1)).await;
        let second = client.complete(request("b"), Duration::from_secs(1)).await;

        assert_eq!(first.unwrap().content, "first");
        assert_eq!(second.unwrap_err(), LlmError::protocol("second"));
    }

    #[tokio::test]
    async fn echoes_user_message_when_queue_is_empty() {
        let client = MockLlmClient::new();
        let response = client
            .complete(request("echo me"), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(response.content, "echo me");
        assert_eq!(response.model, "mock-model");
    }

    #[tokio::test]
    async fn records_calls_across_clones() {
        let client = MockLlmClient::new();
        let clone = client.clone();

        clone.complete(request("x"), Duration::from_secs(1)).await.unwrap();

        assert_eq!(client.call_count(), 1);
        assert_eq!(client.calls()[0].messages[0].content, "x");
    }

    #[tokio::test]
    async fn delay_longer_than_timeout_fails_transiently() {
        let client = MockLlmClient::new()
            .with_response("late")
            .with_delay(Duration::from_secs(5));

        let err = client
            .complete(request("x"), Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn transient_failures_are_queued_first() {
        let client = MockLlmClient::new()
            .with_transient_failures(2)
            .with_response("ok");

        for _ in 0..2 {
            let err = client.complete(request("x"), Duration::from_secs(1)).await;
            assert!(err.unwrap_err().is_transient());
        }
        let ok = client.complete(request("x"), Duration::from_secs(1)).await;
        assert_eq!(ok.unwrap().content, "ok");
    }
}
