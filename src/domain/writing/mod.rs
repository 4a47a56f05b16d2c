//! Writing domain - requests, results and the request lifecycle.

mod assistant_result;
mod generation;
mod request_stage;
mod writing_request;

pub use assistant_result::AssistantResult;
pub use generation::{StopReason, TokenUsage};
pub use request_stage::{FailureCause, RejectionCause, RequestStage};
pub use writing_request::{WritingRequest, DEFAULT_MAX_INPUT_CHARS};
