//! Writing HTTP adapter - REST API for the writing assistant.
//!
//! Provides endpoints for:
//! - Running writing tools
//! - Listing tools
//! - Reading stored results and per-user history
//! - Reading LLM usage

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;

pub use handlers::{WritingApiError, WritingAppState};
pub use routes::writing_router;
