//! Data transfer objects for writing HTTP endpoints.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::application::PersistenceOutcome;
use crate::domain::tools::{ToolDefinition, INPUT_PLACEHOLDER};
use crate::domain::writing::AssistantResult;

/// Largest page the history endpoint returns.
pub const MAX_HISTORY_LIMIT: u32 = 100;

// ═══════════════════════════════════════════════════════════════════════════
// Request DTOs
// ═══════════════════════════════════════════════════════════════════════════

/// Request to run a writing tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistRequest {
    pub user_id: String,
    /// Falls back to the configured default tool when absent.
    pub tool_id: Option<String>,
    pub input_text: String,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

/// Query parameters for result history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub user_id: String,
    #[serde(default = "default_history_limit")]
    pub limit: u32,
}

fn default_history_limit() -> u32 {
    20
}

// ═══════════════════════════════════════════════════════════════════════════
// Response DTOs
// ═══════════════════════════════════════════════════════════════════════════

/// A completed request: the result plus what happened when saving it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistResponse {
    #[serde(flatten)]
    pub result: AssistantResult,
    pub persistence: PersistenceOutcome,
}

/// One entry of the tool listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSummary {
    pub id: String,
    pub description: String,
    pub aliases: Vec<String>,
    /// Template options the tool reads, `input` excluded.
    pub options: Vec<String>,
    /// Options without a default; omitting one fails the request.
    pub required_options: Vec<String>,
}

impl From<&ToolDefinition> for ToolSummary {
    fn from(tool: &ToolDefinition) -> Self {
        let template = tool.prompt_template();
        Self {
            id: tool.id().to_string(),
            description: tool.description().to_string(),
            aliases: tool.aliases().to_vec(),
            options: template
                .placeholders()
                .into_iter()
                .filter(|name| *name != INPUT_PLACEHOLDER)
                .map(String::from)
                .collect(),
            required_options: template
                .required_options()
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Response listing the available tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolListResponse {
    pub default_tool: String,
    pub count: usize,
    pub tools: Vec<ToolSummary>,
}

/// Recent results for a user, newest first.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub user_id: String,
    pub count: usize,
    pub results: Vec<AssistantResult>,
}

/// Liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            message: "Writing Assistant API is running".to_string(),
        }
    }
}

/// Error body returned by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: impl ToString, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}
