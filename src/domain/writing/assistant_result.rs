//! AssistantResult - the outcome of a completed writing request.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ResultId, Timestamp, UserId};

use super::{StopReason, TokenUsage, WritingRequest};

/// A generated, post-processed result.
///
/// Created once per successful request and never mutated afterwards. The
/// `tool_id` is always the canonical id, even when the request used an alias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantResult {
    id: ResultId,
    original_request: WritingRequest,
    output: String,
    tool_id: String,
    stop_reason: StopReason,
    usage: TokenUsage,
    created_at: Timestamp,
}

impl AssistantResult {
    /// Creates a result stamped with a fresh id and the current time.
    pub fn new(
        original_request: WritingRequest,
        tool_id: impl Into<String>,
        output: impl Into<String>,
        stop_reason: StopReason,
        usage: TokenUsage,
    ) -> Self {
        Self {
            id: ResultId::new(),
            original_request,
            output: output.into(),
            tool_id: tool_id.into(),
            stop_reason,
            usage,
            created_at: Timestamp::now(),
        }
    }

    /// Reconstitutes a result from storage.
    pub fn reconstitute(
        id: ResultId,
        original_request: WritingRequest,
        tool_id: String,
        output: String,
        stop_reason: StopReason,
        usage: TokenUsage,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            original_request,
            output,
            tool_id,
            stop_reason,
            usage,
            created_at,
        }
    }

    pub fn id(&self) -> ResultId {
        self.id
    }

    pub fn original_request(&self) -> &WritingRequest {
        &self.original_request
    }

    pub fn user_id(&self) -> &UserId {
        &self.original_request.user_id
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    /// Canonical id of the tool that produced this result.
    pub fn tool_id(&self) -> &str {
        &self.tool_id
    }

    pub fn stop_reason(&self) -> StopReason {
        self.stop_reason
    }

    pub fn usage(&self) -> TokenUsage {
        self.usage
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }
}
