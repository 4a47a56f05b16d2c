//! LLM Client Port - Interface for chat-completion providers.
//!
//! This port abstracts the call to an external chat-completion API so the
//! orchestrator can generate text without coupling to a specific provider.
//!
//! # Design
//!
//! - One normalized request/response shape for every provider
//! - The caller passes a timeout that bounds the whole call, retries included
//! - Errors are split by what the caller can do about them: transient
//!   unavailability, protocol violations and provider rejections
//!
//! # Example
//!
//! ```ignore
//! use async_trait::async_trait;
//!
//! struct EchoClient;
//!
//! #[async_trait]
//! impl LlmClient for EchoClient {
//!     async fn complete(&self, request: LlmRequest, _timeout: Duration) -> Result<LlmResponse, LlmError> {
//!         Ok(LlmResponse::new(request.messages[0].content.clone(), StopReason::Complete, TokenUsage::default(), "echo"))
//!     }
//!
//!     fn provider_info(&self) -> ProviderInfo {
//!         ProviderInfo::new("echo", "echo")
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::domain::writing::{StopReason, TokenUsage};

/// Port for chat-completion calls.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generates a completion.
    ///
    /// The call, including any retries an implementation performs, must
    /// finish within `timeout`.
    async fn complete(&self, request: LlmRequest, timeout: Duration)
        -> Result<LlmResponse, LlmError>;

    /// Get provider information (name and model).
    fn provider_info(&self) -> ProviderInfo;
}

/// Request for a chat completion.
///
/// Built fresh for every call.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmRequest {
    /// System prompt guiding model behavior.
    pub system_prompt: String,
    /// Conversation messages, oldest first.
    pub messages: Vec<Message>,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: Option<f32>,
}

impl LlmRequest {
    /// Creates a request with no messages.
    pub fn new(system_prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            messages: Vec::new(),
            max_tokens,
            temperature: None,
        }
    }

    /// Adds a user message.
    pub fn with_user_message(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message::user(content));
        self
    }

    /// Sets the temperature.
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }
}

/// A message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message.
    pub role: MessageRole,
    /// Message content.
    pub content: String,
}

impl Message {
    /// Creates a new message.
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }
}

/// Role of the message sender.
///
/// System instructions travel in [`LlmRequest::system_prompt`], not as a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// Response from a chat completion.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmResponse {
    /// Generated text.
    pub content: String,
    /// Why the model stopped generating.
    pub stop_reason: StopReason,
    /// Token usage.
    pub usage: TokenUsage,
    /// Model that generated the response.
    pub model: String,
}

impl LlmResponse {
    pub fn new(
        content: impl Into<String>,
        stop_reason: StopReason,
        usage: TokenUsage,
        model: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            stop_reason,
            usage,
            model: model.into(),
        }
    }
}

/// Provider information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Provider name (e.g., "anthropic").
    pub name: String,
    /// Model identifier.
    pub model: String,
}

impl ProviderInfo {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
        }
    }
}

/// Kind of provider rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectionKind {
    /// Provider rate limit hit.
    RateLimited {
        /// Seconds until retry is allowed, when the provider says.
        retry_after_secs: Option<u64>,
    },
    /// The model refused on content-policy grounds.
    ContentPolicy,
    /// Prompt exceeds the model's context window.
    ContextTooLong,
}

impl fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionKind::RateLimited { .. } => write!(f, "rate limited"),
            RejectionKind::ContentPolicy => write!(f, "content policy"),
            RejectionKind::ContextTooLong => write!(f, "context too long"),
        }
    }
}

/// LLM client errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LlmError {
    /// The provider could not be reached or kept failing transiently.
    #[error("LLM unavailable after {attempts} attempt(s): {message}")]
    Unavailable {
        /// Attempts made before giving up.
        attempts: u32,
        /// Last failure cause.
        message: String,
    },

    /// The caller's timeout elapsed before a response arrived.
    #[error("LLM call timed out after {}ms", timeout.as_millis())]
    TimedOut { timeout: Duration },

    /// The provider answered with something we cannot use.
    #[error("LLM protocol error: {message}")]
    Protocol { message: String },

    /// The provider refused the request.
    #[error("LLM rejected the request ({kind}): {reason}")]
    Rejected { kind: RejectionKind, reason: String },
}

impl LlmError {
    /// Creates an unavailable error for a single failed attempt.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            attempts: 1,
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a rejection error.
    pub fn rejected(kind: RejectionKind, reason: impl Into<String>) -> Self {
        Self::Rejected {
            kind,
            reason: reason.into(),
        }
    }

    /// Creates a rate limit rejection.
    pub fn rate_limited(retry_after_secs: Option<u64>, reason: impl Into<String>) -> Self {
        Self::rejected(RejectionKind::RateLimited { retry_after_secs }, reason)
    }

    /// Returns true if another attempt may succeed.
    ///
    /// Rate limits are not transient; they go back to the caller together
    /// with the provider's retry-after.
    pub fn is_transient(&self) -> bool {
        matches!(self, LlmError::Unavailable { .. })
    }
}
