//! AssistWriting command handler.
//!
//! Runs one writing request through the pipeline:
//!
//! 1. Validate the request (no LLM call for invalid input)
//! 2. Resolve the tool by id or alias
//! 3. Render the tool's prompt template
//! 4. Call the LLM under a bounded timeout, racing the caller's cancellation
//! 5. Apply the tool's post-processors in order
//! 6. Assemble the result and hand it to the result store
//!
//! Persistence is best-effort. Its outcome is reported in the `Completion`
//! but never turns a generated result into an error.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::domain::foundation::{StateMachine, ValidationError};
use crate::domain::tools::{TemplateError, ToolDefinition, ToolRegistry, UnknownTool};
use crate::domain::writing::{
    AssistantResult, FailureCause, RejectionCause, RequestStage, StopReason, WritingRequest,
    DEFAULT_MAX_INPUT_CHARS,
};
use crate::ports::{LlmClient, LlmError, LlmRequest, RejectionKind, ResultStore};

// ════════════════════════════════════════════════════════════════════════════════
// Settings
// ════════════════════════════════════════════════════════════════════════════════

/// How a completed result reaches the result store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceMode {
    /// Save before responding, bounded by the persistence budget.
    #[default]
    Awaited,
    /// Save on a background task; respond immediately.
    Detached,
}

/// Tunables for the handler.
#[derive(Debug, Clone)]
pub struct AssistantSettings {
    /// Hard bound on the whole LLM call, retries included.
    pub llm_timeout: Duration,
    /// Used when the tool does not set `max_tokens`.
    pub default_max_tokens: u32,
    /// Upper bound on input length, in characters.
    pub max_input_chars: usize,
    pub persistence_mode: PersistenceMode,
    /// Longest a save may take before it is abandoned.
    pub persistence_budget: Duration,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            llm_timeout: Duration::from_secs(30),
            default_max_tokens: 4096,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
            persistence_mode: PersistenceMode::Awaited,
            persistence_budget: Duration::from_millis(250),
        }
    }
}

impl AssistantSettings {
    pub fn with_llm_timeout(mut self, timeout: Duration) -> Self {
        self.llm_timeout = timeout;
        self
    }

    pub fn with_default_max_tokens(mut self, max_tokens: u32) -> Self {
        self.default_max_tokens = max_tokens;
        self
    }

    pub fn with_max_input_chars(mut self, max: usize) -> Self {
        self.max_input_chars = max;
        self
    }

    pub fn with_persistence_mode(mut self, mode: PersistenceMode) -> Self {
        self.persistence_mode = mode;
        self
    }

    pub fn with_persistence_budget(mut self, budget: Duration) -> Self {
        self.persistence_budget = budget;
        self
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Results and errors
// ════════════════════════════════════════════════════════════════════════════════

/// What happened to the result on its way to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum PersistenceOutcome {
    Stored,
    Failed(String),
    TimedOut,
    /// Handed to a background task; the outcome is only logged.
    Detached,
    /// No result store is configured.
    Disabled,
}

/// A successfully handled request.
#[derive(Debug, Clone)]
pub struct Completion {
    pub result: AssistantResult,
    pub persistence: PersistenceOutcome,
}

/// Errors that can occur when handling a writing request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssistWritingError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Unknown tool '{tool_id}'")]
    UnknownTool {
        tool_id: String,
        available: Vec<String>,
    },

    /// A tool's template could not be rendered with the given options.
    #[error("Template error in tool '{tool_id}': {source}")]
    Template {
        tool_id: String,
        source: TemplateError,
    },

    #[error("LLM unavailable: {message}")]
    LlmUnavailable {
        message: String,
        /// The overall timeout elapsed, as opposed to retries running out.
        timed_out: bool,
    },

    #[error("LLM protocol error: {0}")]
    LlmProtocol(String),

    #[error("LLM rejected the request ({kind}): {reason}")]
    LlmRejected { kind: RejectionKind, reason: String },

    #[error("Post-processor '{processor}' failed: {reason}")]
    PostProcessing { processor: String, reason: String },

    #[error("Request cancelled by caller")]
    Cancelled,
}

impl From<LlmError> for AssistWritingError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Unavailable { .. } => AssistWritingError::LlmUnavailable {
                message: err.to_string(),
                timed_out: false,
            },
            LlmError::TimedOut { .. } => AssistWritingError::LlmUnavailable {
                message: err.to_string(),
                timed_out: true,
            },
            LlmError::Protocol { message } => AssistWritingError::LlmProtocol(message),
            LlmError::Rejected { kind, reason } => AssistWritingError::LlmRejected { kind, reason },
        }
    }
}

impl From<UnknownTool> for AssistWritingError {
    fn from(err: UnknownTool) -> Self {
        AssistWritingError::UnknownTool {
            tool_id: err.tool_id,
            available: err.available,
        }
    }
}

impl AssistWritingError {
    /// Terminal stage a request ends in when it fails with this error.
    pub fn terminal_stage(&self) -> RequestStage {
        match self {
            AssistWritingError::Validation(_) => RequestStage::Rejected(RejectionCause::Validation),
            AssistWritingError::UnknownTool { .. } => {
                RequestStage::Rejected(RejectionCause::UnknownTool)
            }
            AssistWritingError::Template { .. } => RequestStage::Rejected(RejectionCause::Template),
            AssistWritingError::LlmUnavailable { .. } => {
                RequestStage::Failed(FailureCause::LlmUnavailable)
            }
            AssistWritingError::LlmProtocol(_) => RequestStage::Failed(FailureCause::LlmProtocol),
            AssistWritingError::LlmRejected { .. } => {
                RequestStage::Failed(FailureCause::LlmRejected)
            }
            AssistWritingError::PostProcessing { .. } => {
                RequestStage::Failed(FailureCause::PostProcessing)
            }
            AssistWritingError::Cancelled => RequestStage::Cancelled,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handler
// ════════════════════════════════════════════════════════════════════════════════

/// Handler for writing-assistance requests.
///
/// Holds only shared read-only state, so one instance serves all requests
/// concurrently.
pub struct AssistWritingHandler {
    registry: Arc<ToolRegistry>,
    llm: Arc<dyn LlmClient>,
    store: Option<Arc<dyn ResultStore>>,
    settings: AssistantSettings,
}

impl AssistWritingHandler {
    /// Creates a handler without a result store.
    pub fn new(registry: Arc<ToolRegistry>, llm: Arc<dyn LlmClient>) -> Self {
        Self {
            registry,
            llm,
            store: None,
            settings: AssistantSettings::default(),
        }
    }

    /// Persists completed results to `store`.
    pub fn with_store(mut self, store: Arc<dyn ResultStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_settings(mut self, settings: AssistantSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &AssistantSettings {
        &self.settings
    }

    /// Handles one writing request.
    ///
    /// `cancel` is tied to the caller's lifetime; cancelling it while the
    /// LLM call is in flight abandons the call.
    #[tracing::instrument(
        name = "assist_writing",
        skip(self, request, cancel),
        fields(user_id = %request.user_id, tool_id = %request.tool_id)
    )]
    pub async fn handle(
        &self,
        request: WritingRequest,
        cancel: CancellationToken,
    ) -> Result<Completion, AssistWritingError> {
        let mut stage = StageTracker::default();
        let outcome = self.run(&request, &cancel, &mut stage).await;

        match outcome {
            Ok(result) => {
                let persistence = self.persist(&result).await;
                tracing::info!(
                    result_id = %result.id(),
                    canonical_tool = %result.tool_id(),
                    output_chars = result.output().chars().count(),
                    total_tokens = result.usage().total_tokens,
                    persistence = ?persistence,
                    "Writing request completed"
                );
                Ok(Completion {
                    result,
                    persistence,
                })
            }
            Err(err) => {
                stage.advance(err.terminal_stage());
                match &err {
                    AssistWritingError::Validation(_)
                    | AssistWritingError::UnknownTool { .. }
                    | AssistWritingError::Cancelled => {
                        tracing::info!(error = %err, "Writing request not completed")
                    }
                    _ => tracing::warn!(error = %err, "Writing request failed"),
                }
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        request: &WritingRequest,
        cancel: &CancellationToken,
        stage: &mut StageTracker,
    ) -> Result<AssistantResult, AssistWritingError> {
        request.validate(self.settings.max_input_chars)?;
        stage.advance(RequestStage::Validated);

        let tool = self.registry.resolve(&request.tool_id)?;
        stage.advance(RequestStage::ToolResolved);

        let prompt = tool
            .render_prompt(&request.input_text, &request.options)
            .map_err(|source| AssistWritingError::Template {
                tool_id: tool.id().to_string(),
                source,
            })?;
        let llm_request = LlmRequest::new(tool.system_prompt(), self.max_tokens_for(tool))
            .with_user_message(prompt)
            .with_temperature(tool.temperature());
        stage.advance(RequestStage::PromptBuilt);

        stage.advance(RequestStage::LlmCallInFlight);
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AssistWritingError::Cancelled),
            response = self.llm.complete(llm_request, self.settings.llm_timeout) => response?,
        };

        match response.stop_reason {
            StopReason::Complete => {}
            StopReason::Truncated => tracing::warn!(
                model = %response.model,
                output_tokens = response.usage.output_tokens,
                "LLM output truncated at max_tokens"
            ),
            StopReason::Error => {
                return Err(AssistWritingError::LlmProtocol(format!(
                    "model {} stopped with an unrecognized stop reason",
                    response.model
                )))
            }
        }
        stage.advance(RequestStage::PostProcessing);

        let output = post_process(tool, response.content)?;
        stage.advance(RequestStage::Completed);

        Ok(AssistantResult::new(
            request.clone(),
            tool.id(),
            output,
            response.stop_reason,
            response.usage,
        ))
    }

    fn max_tokens_for(&self, tool: &ToolDefinition) -> u32 {
        tool.max_tokens().unwrap_or(self.settings.default_max_tokens)
    }

    async fn persist(&self, result: &AssistantResult) -> PersistenceOutcome {
        let Some(store) = &self.store else {
            return PersistenceOutcome::Disabled;
        };
        let budget = self.settings.persistence_budget;

        match self.settings.persistence_mode {
            PersistenceMode::Awaited => save_within(store.as_ref(), result, budget).await,
            PersistenceMode::Detached => {
                let store = store.clone();
                let result = result.clone();
                tokio::spawn(async move {
                    save_within(store.as_ref(), &result, budget).await;
                });
                PersistenceOutcome::Detached
            }
        }
    }
}

/// Runs the tool's post-processors in declared order.
///
/// A failing non-critical step passes its input through unchanged.
fn post_process(tool: &ToolDefinition, output: String) -> Result<String, AssistWritingError> {
    let mut text = output;
    for step in tool.post_processors() {
        match step.apply(&text) {
            Ok(next) => text = next,
            Err(err) if step.is_critical() => {
                return Err(AssistWritingError::PostProcessing {
                    processor: step.name().to_string(),
                    reason: err.reason,
                })
            }
            Err(err) => tracing::warn!(
                tool = tool.id(),
                processor = step.name(),
                error = %err,
                "Post-processor failed, passing its input through"
            ),
        }
    }
    Ok(text)
}

async fn save_within(
    store: &dyn ResultStore,
    result: &AssistantResult,
    budget: Duration,
) -> PersistenceOutcome {
    match tokio::time::timeout(budget, store.save(result)).await {
        Ok(Ok(())) => PersistenceOutcome::Stored,
        Ok(Err(err)) => {
            tracing::warn!(result_id = %result.id(), error = %err, "Failed to persist result");
            PersistenceOutcome::Failed(err.to_string())
        }
        Err(_) => {
            tracing::warn!(
                result_id = %result.id(),
                budget_ms = budget.as_millis() as u64,
                "Persisting result exceeded its budget"
            );
            PersistenceOutcome::TimedOut
        }
    }
}

/// Follows a request through its stages, tracing each transition.
#[derive(Debug, Default)]
struct StageTracker {
    current: RequestStage,
}

impl StageTracker {
    fn advance(&mut self, next: RequestStage) {
        match self.current.transition_to(next) {
            Ok(stage) => {
                tracing::debug!(from = ?self.current, to = ?stage, "Request stage changed");
                self.current = stage;
            }
            Err(err) => tracing::error!(error = %err, "Invalid request stage transition"),
        }
    }
}
