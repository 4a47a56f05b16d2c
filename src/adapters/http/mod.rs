//! HTTP adapters - REST API implementations.
//!
//! `app_router` assembles the full application: the health route, the
//! writing API under `/api/writing`, and the tower-http middleware stack
//! (request ids, tracing, CORS, request timeout).

pub mod writing;

pub use writing::{writing_router, WritingAppState};

use axum::{
    http::{HeaderName, HeaderValue, Method},
    routing::get,
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use writing::HealthResponse;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Builds the application router.
pub fn app_router(state: WritingAppState, server: &ServerConfig) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .route("/", get(health))
        .nest("/api/writing", writing_router())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(request_id))
                .layer(cors_layer(&server.cors_origins_list()))
                .layer(TimeoutLayer::new(server.request_timeout())),
        )
}

/// GET / - Liveness check
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockLlmClient, UsageLedger};
    use crate::application::AssistWritingHandler;
    use crate::domain::tools::{register_builtin_tools, ToolRegistry};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn router(server: &ServerConfig) -> Router {
        let mut registry = ToolRegistry::new();
        register_builtin_tools(&mut registry).unwrap();
        let handler = AssistWritingHandler::new(Arc::new(registry), Arc::new(MockLlmClient::new()));

        let state = WritingAppState {
            handler: Arc::new(handler),
            store: None,
            usage: Arc::new(UsageLedger::new()),
            default_tool: "chat".to_string(),
        };
        app_router(state, server)
    }

    #[tokio::test]
    async fn health_check_responds() {
        let response = router(&ServerConfig::default())
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["message"], "Writing Assistant API is running");
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let response = router(&ServerConfig::default())
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn incoming_request_id_is_propagated() {
        let response = router(&ServerConfig::default())
            .oneshot(
                Request::get("/")
                    .header(REQUEST_ID_HEADER, "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()[REQUEST_ID_HEADER], "abc-123");
    }

    #[tokio::test]
    async fn configured_cors_origin_is_allowed() {
        let server = ServerConfig {
            cors_origins: Some("http://localhost:5173".to_string()),
            ..Default::default()
        };
        let response = router(&server)
            .oneshot(
                Request::get("/")
                    .header(header::ORIGIN, "http://localhost:5173")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:5173"
        );
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let response = router(&ServerConfig::default())
            .oneshot(Request::get("/api/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
