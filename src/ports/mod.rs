//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `LlmClient` - Chat-completion provider
//! - `ResultStore` - Persistence gateway for assistant results
//! - `UsageRecorder` - Telemetry for LLM calls

mod llm_client;
mod result_store;
mod usage_recorder;

pub use llm_client::{
    LlmClient, LlmError, LlmRequest, LlmResponse, Message, MessageRole, ProviderInfo,
    RejectionKind,
};
pub use result_store::{ResultStore, StoreError};
pub use usage_recorder::{CallOutcome, LlmCallEvent, ModelUsage, UsageRecorder, UsageSummary};
