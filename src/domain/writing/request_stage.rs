//! Request stage state machine.
//!
//! Tracks a single writing request through the orchestration pipeline.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Why a request was rejected before reaching the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionCause {
    Validation,
    UnknownTool,
    Template,
}

/// Why a request failed after the model was involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCause {
    LlmUnavailable,
    LlmProtocol,
    LlmRejected,
    PostProcessing,
}

/// The stage a writing request has reached.
///
/// Happy path:
/// `Received → Validated → ToolResolved → PromptBuilt → LlmCallInFlight →
/// PostProcessing → Completed`.
///
/// `Rejected`, `Failed`, `Cancelled` and `Completed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RequestStage {
    #[default]
    Received,
    Validated,
    ToolResolved,
    PromptBuilt,
    LlmCallInFlight,
    PostProcessing,
    Completed,
    Rejected(RejectionCause),
    Failed(FailureCause),
    /// The caller went away while the model call was in flight.
    Cancelled,
}

impl StateMachine for RequestStage {
    fn can_transition_to(&self, target: &Self) -> bool {
        use RequestStage::*;
        matches!(
            (self, target),
            (Received, Validated)
                | (Received, Rejected(RejectionCause::Validation))
                | (Validated, ToolResolved)
                | (Validated, Rejected(RejectionCause::UnknownTool))
                | (ToolResolved, PromptBuilt)
                | (ToolResolved, Rejected(RejectionCause::Template))
                | (PromptBuilt, LlmCallInFlight)
                | (LlmCallInFlight, PostProcessing)
                | (LlmCallInFlight, Cancelled)
                | (
                    LlmCallInFlight,
                    Failed(
                        FailureCause::LlmUnavailable
                            | FailureCause::LlmProtocol
                            | FailureCause::LlmRejected
                    )
                )
                | (PostProcessing, Completed)
                | (PostProcessing, Failed(FailureCause::PostProcessing))
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use RequestStage::*;
        match self {
            Received => vec![Validated, Rejected(RejectionCause::Validation)],
            Validated => vec![ToolResolved, Rejected(RejectionCause::UnknownTool)],
            ToolResolved => vec![PromptBuilt, Rejected(RejectionCause::Template)],
            PromptBuilt => vec![LlmCallInFlight],
            LlmCallInFlight => vec![
                PostProcessing,
                Failed(FailureCause::LlmUnavailable),
                Failed(FailureCause::LlmProtocol),
                Failed(FailureCause::LlmRejected),
                Cancelled,
            ],
            PostProcessing => vec![Completed, Failed(FailureCause::PostProcessing)],
            Completed | Rejected(_) | Failed(_) | Cancelled => vec![],
        }
    }
}
