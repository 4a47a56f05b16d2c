//! LLM Client Adapters.
//!
//! Implementations of the LlmClient and UsageRecorder ports.
//!
//! ## Available Adapters
//!
//! - `AnthropicClient` - Anthropic Claude Messages API, one attempt per call
//! - `RetryingLlmClient` - Wrapper adding retries, backoff, deadline and telemetry
//! - `MockLlmClient` - Configurable mock for testing and offline development
//! - `UsageLedger` - In-memory aggregation of LLM call telemetry

mod anthropic_client;
mod mock_client;
mod retrying_client;
mod usage_ledger;

pub use anthropic_client::{
    AnthropicClient, AnthropicConfig, DEFAULT_ANTHROPIC_BASE_URL, DEFAULT_ANTHROPIC_MODEL,
};
pub use mock_client::MockLlmClient;
pub use retrying_client::{RetryPolicy, RetryingLlmClient};
pub use usage_ledger::UsageLedger;
