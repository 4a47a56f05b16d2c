//! UsageRecorder port - telemetry for LLM calls.
//!
//! Every call to the LLM client produces one [`LlmCallEvent`]. Recording is
//! synchronous and infallible so it can never slow down or fail a request.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::foundation::Timestamp;
use crate::domain::writing::TokenUsage;

/// How an LLM call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOutcome {
    Success,
    Unavailable,
    TimedOut,
    ProtocolError,
    Rejected,
}

/// Record of a single LLM call, retries included.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmCallEvent {
    /// Provider name.
    pub provider: String,
    /// Model requested or reported.
    pub model: String,
    /// How the call ended.
    pub outcome: CallOutcome,
    /// Attempts made.
    pub attempts: u32,
    /// Wall-clock time spent, retries and backoff included.
    pub latency: Duration,
    /// Token usage, present on success.
    pub usage: Option<TokenUsage>,
    /// When the call finished.
    pub occurred_at: Timestamp,
}

impl LlmCallEvent {
    /// Creates a new event stamped with the current time.
    pub fn new(
        provider: impl Into<String>,
        model: impl Into<String>,
        outcome: CallOutcome,
        attempts: u32,
        latency: Duration,
    ) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            outcome,
            attempts,
            latency,
            usage: None,
            occurred_at: Timestamp::now(),
        }
    }

    /// Attaches token usage.
    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }
}

/// Aggregated usage since process start.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSummary {
    /// Number of calls.
    pub calls: u64,
    /// Calls that returned a response.
    pub successful_calls: u64,
    /// Calls that ended in an error.
    pub failed_calls: u64,
    /// Attempts across all calls.
    pub attempts: u64,
    /// Tokens across all successful calls.
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    /// Mean latency of all calls in milliseconds.
    pub average_latency_ms: u64,
    /// Breakdown by model.
    pub by_model: Vec<ModelUsage>,
}

/// Usage breakdown by model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelUsage {
    pub provider: String,
    pub model: String,
    pub calls: u64,
    pub total_tokens: u64,
}

/// Port for recording LLM call telemetry.
pub trait UsageRecorder: Send + Sync {
    /// Records one finished call.
    fn record(&self, event: LlmCallEvent);

    /// Returns the aggregate of everything recorded so far.
    fn summary(&self) -> UsageSummary;
}
