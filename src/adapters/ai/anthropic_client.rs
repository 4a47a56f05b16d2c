//! Anthropic Client - single-attempt LlmClient for the Claude Messages API.
//!
//! This adapter performs exactly one HTTP exchange per call and classifies the
//! outcome into [`LlmError`]. Retries, backoff and the overall deadline live
//! in [`RetryingLlmClient`](super::RetryingLlmClient), which wraps it.
//!
//! # Configuration
//!
//! ```ignore
//! let config = AnthropicConfig::new(api_key)
//!     .with_model("claude-sonnet-4-20250514")
//!     .with_base_url("https://api.anthropic.com");
//!
//! let client = AnthropicClient::new(config)?;
//! ```

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::writing::{StopReason, TokenUsage};
use crate::ports::{
    LlmClient, LlmError, LlmRequest, LlmResponse, MessageRole, ProviderInfo, RejectionKind,
};

/// Anthropic API version header value.
const ANTHROPIC_API_VERSION: &str = "2023-06-01";

/// Default model.
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";

/// Default API base URL.
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

/// Configuration for the Anthropic client.
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Model to use (e.g., "claude-sonnet-4-20250514").
    pub model: String,
    /// Base URL for the API (default: https://api.anthropic.com).
    pub base_url: String,
}

impl AnthropicConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: DEFAULT_ANTHROPIC_MODEL.to_string(),
            base_url: DEFAULT_ANTHROPIC_BASE_URL.to_string(),
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Exposes the API key (for making requests).
    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Anthropic Messages API client.
pub struct AnthropicClient {
    config: AnthropicConfig,
    client: Client,
}

impl AnthropicClient {
    /// Creates a new client with a pooled HTTP connection.
    pub fn new(config: AnthropicConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().build()?;
        Ok(Self { config, client })
    }

    /// Builds the messages endpoint URL.
    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'))
    }

    /// Converts our request to Anthropic's format.
    fn to_anthropic_request(&self, request: &LlmRequest) -> AnthropicRequest {
        let messages = request
            .messages
            .iter()
            .map(|msg| AnthropicMessage {
                role: match msg.role {
                    MessageRole::User => "user",
                    MessageRole::Assistant => "assistant",
                }
                .to_string(),
                content: msg.content.clone(),
            })
            .collect();

        AnthropicRequest {
            model: self.config.model.clone(),
            messages,
            system: Some(request.system_prompt.clone()).filter(|s| !s.is_empty()),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(
        &self,
        request: LlmRequest,
        timeout: Duration,
    ) -> Result<LlmResponse, LlmError> {
        let body = self.to_anthropic_request(&request);

        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", self.config.api_key())
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .header("Content-Type", "application/json")
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, timeout))?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());

        let text = response
            .text()
            .await
            .map_err(|e| transport_error(e, timeout))?;

        if !(200..300).contains(&status) {
            return Err(classify_error(status, retry_after, &text));
        }

        parse_response_body(&text)
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("anthropic", &self.config.model)
    }
}

/// Maps a transport-level failure to a transient error.
fn transport_error(error: reqwest::Error, timeout: Duration) -> LlmError {
    if error.is_timeout() {
        LlmError::unavailable(format!("attempt timed out after {}ms", timeout.as_millis()))
    } else if error.is_connect() {
        LlmError::unavailable(format!("connection failed: {}", error))
    } else {
        LlmError::unavailable(format!("network error: {}", error))
    }
}

/// Classifies a non-success HTTP response.
pub(crate) fn classify_error(status: u16, retry_after: Option<u64>, body: &str) -> LlmError {
    let parsed = serde_json::from_str::<AnthropicErrorBody>(body).ok();
    let error_type = parsed
        .as_ref()
        .map(|b| b.error.error_type.as_str())
        .unwrap_or_default();
    let message = parsed
        .as_ref()
        .map(|b| b.error.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("HTTP {}", status)
            } else {
                body.trim().to_string()
            }
        });

    match status {
        429 => LlmError::rate_limited(retry_after.or_else(|| parse_retry_hint(&message)), message),
        413 => LlmError::rejected(RejectionKind::ContextTooLong, message),
        400 if message.contains("prompt is too long") => {
            LlmError::rejected(RejectionKind::ContextTooLong, message)
        }
        400 => LlmError::protocol(format!("invalid request: {}", message)),
        401 | 403 => LlmError::protocol(format!("authentication failed: {}", message)),
        408 | 500..=504 | 529 => {
            LlmError::unavailable(format!("server error {} ({}): {}", status, error_type, message))
        }
        _ => LlmError::protocol(format!("unexpected status {}: {}", status, message)),
    }
}

/// Finds "try again in Ns" in a provider message.
fn parse_retry_hint(message: &str) -> Option<u64> {
    let idx = message.find("try again in ")?;
    let rest = &message[idx + "try again in ".len()..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    rest[..end].parse().ok()
}

/// Parses a successful Messages API response body.
pub(crate) fn parse_response_body(body: &str) -> Result<LlmResponse, LlmError> {
    let response: AnthropicResponse = serde_json::from_str(body)
        .map_err(|e| LlmError::protocol(format!("failed to parse response: {}", e)))?;

    let stop_reason = match response.stop_reason.as_deref() {
        Some("end_turn") | Some("stop_sequence") => StopReason::Complete,
        Some("max_tokens") => StopReason::Truncated,
        Some("refusal") => {
            return Err(LlmError::rejected(
                RejectionKind::ContentPolicy,
                "the model declined to answer",
            ))
        }
        _ => StopReason::Error,
    };

    let texts: Vec<String> = response
        .content
        .into_iter()
        .filter(|block| block.block_type == "text")
        .filter_map(|block| block.text)
        .collect();
    if texts.is_empty() {
        return Err(LlmError::protocol("response contained no text content"));
    }

    Ok(LlmResponse::new(
        texts.join(""),
        stop_reason,
        TokenUsage::new(response.usage.input_tokens, response.usage.output_tokens),
        response.model,
    ))
}

// ----- Anthropic API Types -----

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    model: String,
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    error: AnthropicErrorDetail,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorDetail {
    #[serde(rename = "type", default)]
    error_type: String,
    #[serde(default)]
    message: String,
}
