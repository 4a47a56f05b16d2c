//! Application handlers.
//!
//! Command handlers that orchestrate domain operations.

pub mod assist_writing;

pub use assist_writing::{
    AssistWritingError, AssistWritingHandler, AssistantSettings, Completion, PersistenceMode,
    PersistenceOutcome,
};
