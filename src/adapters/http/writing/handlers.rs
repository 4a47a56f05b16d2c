//! HTTP handlers for writing endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::application::{AssistWritingError, AssistWritingHandler};
use crate::domain::foundation::{ErrorCode, ResultId, UserId, ValidationError};
use crate::domain::writing::{AssistantResult, WritingRequest};
use crate::ports::{RejectionKind, ResultStore, StoreError, UsageRecorder, UsageSummary};

use super::dto::{
    AssistRequest, AssistResponse, ErrorResponse, HistoryQuery, HistoryResponse, ToolListResponse,
    ToolSummary, MAX_HISTORY_LIMIT,
};

/// Non-standard status for a client that went away mid-request.
const CLIENT_CLOSED_REQUEST: u16 = 499;

// ════════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════════

/// Application state for writing endpoints.
#[derive(Clone)]
pub struct WritingAppState {
    pub handler: Arc<AssistWritingHandler>,
    /// Absent when persistence is disabled.
    pub store: Option<Arc<dyn ResultStore>>,
    pub usage: Arc<dyn UsageRecorder>,
    /// Tool used when a request names none.
    pub default_tool: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/writing/assist - Run a writing tool
///
/// The cancellation token fires when axum drops this future, which happens
/// when the client disconnects. Bodies that fail to deserialize get the same
/// JSON 400 as any other validation failure.
pub async fn assist(
    State(state): State<WritingAppState>,
    payload: Result<Json<AssistRequest>, JsonRejection>,
) -> Result<Json<AssistResponse>, WritingApiError> {
    let Json(req) = payload?;
    let user_id = UserId::new(req.user_id)?;
    let tool_id = req
        .tool_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| state.default_tool.clone());

    let mut request = WritingRequest::new(user_id, tool_id, req.input_text);
    request.options = req.options;

    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();

    let completion = state.handler.handle(request, cancel).await?;

    Ok(Json(AssistResponse {
        result: completion.result,
        persistence: completion.persistence,
    }))
}

/// GET /api/writing/tools - List available tools
pub async fn list_tools(State(state): State<WritingAppState>) -> Json<ToolListResponse> {
    let tools: Vec<ToolSummary> = state
        .handler
        .registry()
        .tools()
        .iter()
        .map(ToolSummary::from)
        .collect();

    Json(ToolListResponse {
        default_tool: state.default_tool.clone(),
        count: tools.len(),
        tools,
    })
}

/// GET /api/writing/results/:id - Fetch a stored result
pub async fn get_result(
    State(state): State<WritingAppState>,
    Path(result_id): Path<String>,
) -> Result<Json<AssistantResult>, WritingApiError> {
    let id = result_id.parse::<ResultId>()?;

    let Some(store) = &state.store else {
        return Err(WritingApiError::NotFound(result_id));
    };

    match store.find_by_id(&id).await? {
        Some(result) => Ok(Json(result)),
        None => Err(WritingApiError::NotFound(result_id)),
    }
}

/// GET /api/writing/history?userId=&limit= - Recent results for a user
pub async fn get_history(
    State(state): State<WritingAppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, WritingApiError> {
    let user_id = UserId::new(query.user_id)?;
    let limit = query.limit.clamp(1, MAX_HISTORY_LIMIT);

    let results = match &state.store {
        Some(store) => store.list_for_user(&user_id, limit).await?,
        None => Vec::new(),
    };

    Ok(Json(HistoryResponse {
        user_id: user_id.to_string(),
        count: results.len(),
        results,
    }))
}

/// GET /api/writing/usage - LLM usage since start
pub async fn get_usage(State(state): State<WritingAppState>) -> Json<UsageSummary> {
    Json(state.usage.summary())
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts application errors to HTTP responses.
#[derive(Debug)]
pub enum WritingApiError {
    Assist(AssistWritingError),
    Validation(ValidationError),
    NotFound(String),
    Storage(StoreError),
}

impl From<AssistWritingError> for WritingApiError {
    fn from(err: AssistWritingError) -> Self {
        WritingApiError::Assist(err)
    }
}

impl From<ValidationError> for WritingApiError {
    fn from(err: ValidationError) -> Self {
        WritingApiError::Validation(err)
    }
}

impl From<JsonRejection> for WritingApiError {
    fn from(rejection: JsonRejection) -> Self {
        WritingApiError::Validation(ValidationError::invalid_format("body", rejection.body_text()))
    }
}

impl From<StoreError> for WritingApiError {
    fn from(err: StoreError) -> Self {
        WritingApiError::Storage(err)
    }
}

impl IntoResponse for WritingApiError {
    fn into_response(self) -> Response {
        let (status, error, retry_after) = match self {
            WritingApiError::Assist(err) => assist_error_parts(err),
            WritingApiError::Validation(err) => (
                StatusCode::BAD_REQUEST,
                validation_error(&err),
                None,
            ),
            WritingApiError::NotFound(id) => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new(ErrorCode::NotFound, format!("Result not found: {}", id)),
                None,
            ),
            WritingApiError::Storage(err) => {
                tracing::error!(error = %err, "Result store error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(ErrorCode::StorageError, "Result storage is unavailable"),
                    None,
                )
            }
        };

        let mut response = (status, Json(error)).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

fn validation_error(err: &ValidationError) -> ErrorResponse {
    ErrorResponse::new(ErrorCode::ValidationFailed, err.to_string())
        .with_details(json!({ "field": err.field() }))
}

fn assist_error_parts(err: AssistWritingError) -> (StatusCode, ErrorResponse, Option<u64>) {
    let message = err.to_string();
    match err {
        AssistWritingError::Validation(inner) => {
            (StatusCode::BAD_REQUEST, validation_error(&inner), None)
        }
        AssistWritingError::UnknownTool { available, .. } => (
            StatusCode::BAD_REQUEST,
            ErrorResponse::new(ErrorCode::UnknownTool, message)
                .with_details(json!({ "availableTools": available })),
            None,
        ),
        AssistWritingError::Template { .. } => {
            tracing::error!(error = %message, "Tool template could not be rendered");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new(ErrorCode::TemplateError, message),
                None,
            )
        }
        AssistWritingError::LlmUnavailable { timed_out, .. } => {
            let status = if timed_out {
                StatusCode::GATEWAY_TIMEOUT
            } else {
                StatusCode::SERVICE_UNAVAILABLE
            };
            (
                status,
                ErrorResponse::new(ErrorCode::LlmUnavailable, message),
                None,
            )
        }
        AssistWritingError::LlmProtocol(_) => (
            StatusCode::BAD_GATEWAY,
            ErrorResponse::new(ErrorCode::LlmProtocolError, message),
            None,
        ),
        AssistWritingError::LlmRejected { kind, reason } => {
            let (status, retry_after) = match kind {
                RejectionKind::RateLimited { retry_after_secs } => {
                    (StatusCode::TOO_MANY_REQUESTS, retry_after_secs)
                }
                RejectionKind::ContextTooLong => (StatusCode::PAYLOAD_TOO_LARGE, None),
                RejectionKind::ContentPolicy => (StatusCode::UNPROCESSABLE_ENTITY, None),
            };
            (
                status,
                ErrorResponse::new(ErrorCode::LlmRejected, message).with_details(json!({
                    "kind": kind.to_string(),
                    "reason": reason,
                    "retryAfterSecs": retry_after,
                })),
                retry_after,
            )
        }
        AssistWritingError::PostProcessing { processor, .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorResponse::new(ErrorCode::PostProcessingFailed, message)
                .with_details(json!({ "processor": processor })),
            None,
        ),
        AssistWritingError::Cancelled => (
            StatusCode::from_u16(CLIENT_CLOSED_REQUEST).unwrap_or(StatusCode::BAD_REQUEST),
            ErrorResponse::new(ErrorCode::Cancelled, message),
            None,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tools::TemplateError;
    use axum::body::to_bytes;
    use axum::extract::FromRequest;

    fn status_of(err: AssistWritingError) -> StatusCode {
        WritingApiError::from(err).into_response().status()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn client_errors_map_to_400() {
        assert_eq!(
            status_of(AssistWritingError::Validation(ValidationError::empty_field("input_text"))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AssistWritingError::UnknownTool {
                tool_id: "haiku".into(),
                available: vec!["chat".into()],
            }),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn server_side_errors_map_to_5xx() {
        assert_eq!(
            status_of(AssistWritingError::Template {
                tool_id: "t".into(),
                source: TemplateError::MissingPlaceholder {
                    name: "tone".into()
                },
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(AssistWritingError::LlmProtocol("bad".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(AssistWritingError::PostProcessing {
                processor: "non_empty".into(),
                reason: "blank".into(),
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn unavailable_distinguishes_timeout() {
        assert_eq!(
            status_of(AssistWritingError::LlmUnavailable {
                message: "down".into(),
                timed_out: false,
            }),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(AssistWritingError::LlmUnavailable {
                message: "slow".into(),
                timed_out: true,
            }),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[test]
    fn rejections_map_by_kind() {
        let rejected = |kind| AssistWritingError::LlmRejected {
            kind,
            reason: "no".into(),
        };
        assert_eq!(
            status_of(rejected(RejectionKind::ContentPolicy)),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(rejected(RejectionKind::ContextTooLong)),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn rate_limit_sets_retry_after() {
        let response = WritingApiError::from(AssistWritingError::LlmRejected {
            kind: RejectionKind::RateLimited {
                retry_after_secs: Some(30),
            },
            reason: "slow down".into(),
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "30");
    }

    #[test]
    fn cancelled_maps_to_499() {
        assert_eq!(status_of(AssistWritingError::Cancelled).as_u16(), 499);
    }

    #[tokio::test]
    async fn unknown_tool_body_lists_available_tools() {
        let response = WritingApiError::from(AssistWritingError::UnknownTool {
            tool_id: "haiku".into(),
            available: vec!["chat".into(), "refine".into()],
        })
        .into_response();

        let body = body_json(response).await;
        assert_eq!(body["code"], "UNKNOWN_TOOL");
        assert_eq!(body["details"]["availableTools"], json!(["chat", "refine"]));
    }

    #[tokio::test]
    async fn json_rejection_is_validation_failure() {
        let rejection = axum::Json::<AssistRequest>::from_request(
            axum::http::Request::builder()
                .method("POST")
                .header(header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(r#"{"userId":"u1"}"#))
                .unwrap(),
            &(),
        )
        .await
        .unwrap_err();

        let response = WritingApiError::from(rejection).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["code"], "VALIDATION_FAILED");
        assert_eq!(body["details"]["field"], "body");
        assert!(body["message"].as_str().unwrap().contains("inputText"));
    }

    #[tokio::test]
    async fn storage_error_hides_cause() {
        let response =
            WritingApiError::from(StoreError::storage("password rejected")).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["code"], "STORAGE_ERROR");
        assert!(!body["message"].as_str().unwrap().contains("password"));
    }
}
