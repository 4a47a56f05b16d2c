//! Axum router configuration for writing endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{assist, get_history, get_result, get_usage, list_tools, WritingAppState};

/// Create the writing API router.
///
/// # Routes
///
/// - `POST /assist` - Run a writing tool over the input text
/// - `GET /tools` - List available tools
/// - `GET /results/:id` - Fetch a stored result
/// - `GET /history` - Recent results for a user (query: userId, limit)
/// - `GET /usage` - Aggregated LLM usage since start
///
/// Suitable for mounting at `/api/writing`.
pub fn writing_router() -> Router<WritingAppState> {
    Router::new()
        .route("/assist", post(assist))
        .route("/tools", get(list_tools))
        .route("/results/:id", get(get_result))
        .route("/history", get(get_history))
        .route("/usage", get(get_usage))
}
