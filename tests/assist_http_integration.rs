//! Integration tests for the writing HTTP API.
//!
//! These drive the fully assembled router (middleware included) with
//! in-process requests:
//! 1. Assist requests flow through registry, LLM client and post-processing
//! 2. Stored results are readable by id and through history
//! 3. Errors carry the documented status codes and error bodies
//! 4. Usage telemetry reflects calls made through the retrying client

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use writing_assistant::adapters::ai::{MockLlmClient, RetryPolicy, RetryingLlmClient, UsageLedger};
use writing_assistant::adapters::http::{app_router, WritingAppState};
use writing_assistant::adapters::storage::InMemoryResultStore;
use writing_assistant::application::{AssistWritingHandler, AssistantSettings};
use writing_assistant::config::ServerConfig;
use writing_assistant::domain::tools::{register_builtin_tools, ToolRegistry};
use writing_assistant::ports::{LlmClient, LlmError, ResultStore, UsageRecorder};

// =============================================================================
// Test Infrastructure
// =============================================================================

struct TestApp {
    router: Router,
    llm: MockLlmClient,
}

fn registry() -> Arc<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    register_builtin_tools(&mut registry).unwrap();
    Arc::new(registry)
}

fn build_app(llm: MockLlmClient, store: Option<Arc<dyn ResultStore>>) -> TestApp {
    let ledger = Arc::new(UsageLedger::new());
    let client: Arc<dyn LlmClient> = Arc::new(
        RetryingLlmClient::new(Arc::new(llm.clone()), ledger.clone()).with_policy(
            RetryPolicy::default()
                .with_initial_backoff(Duration::from_millis(1))
                .with_max_backoff(Duration::from_millis(5)),
        ),
    );

    let settings = AssistantSettings::default().with_llm_timeout(Duration::from_secs(5));
    let mut handler = AssistWritingHandler::new(registry(), client).with_settings(settings);
    if let Some(store) = &store {
        handler = handler.with_store(store.clone());
    }

    let usage: Arc<dyn UsageRecorder> = ledger;
    let state = WritingAppState {
        handler: Arc::new(handler),
        store,
        usage,
        default_tool: "chat".to_string(),
    };

    TestApp {
        router: app_router(state, &ServerConfig::default()),
        llm,
    }
}

fn app_with_store(llm: MockLlmClient) -> TestApp {
    build_app(llm, Some(Arc::new(InMemoryResultStore::new())))
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_assist(body: Value) -> Request<Body> {
    Request::post("/api/writing/assist")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

// =============================================================================
// Assist
// =============================================================================

#[tokio::test]
async fn assist_renders_tool_options_into_prompt() {
    let app = app_with_store(MockLlmClient::new());

    let (status, body) = send(
        &app.router,
        post_assist(json!({
            "userId": "user-1",
            "toolId": "rewrite",
            "inputText": "the meeting moved to friday",
            "options": { "tone": "formal" }
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["toolId"], "rewrite");
    assert_eq!(
        body["output"],
        "Rewrite in a formal tone: the meeting moved to friday"
    );
    assert_eq!(body["persistence"]["status"], "stored");

    let calls = app.llm.calls();
    assert_eq!(calls.len(), 1);
    assert!(!calls[0].system_prompt.is_empty());
}

#[tokio::test]
async fn assist_without_tool_uses_default() {
    let app = app_with_store(MockLlmClient::new().with_response("  Happy to help.  "));

    let (status, body) = send(
        &app.router,
        post_assist(json!({ "userId": "user-1", "inputText": "Any tips for my intro?" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["toolId"], "chat");
    assert_eq!(body["output"], "Happy to help.");
    assert_eq!(body["stopReason"], "complete");
}

#[tokio::test]
async fn assist_blank_tool_uses_default() {
    let app = app_with_store(MockLlmClient::new().with_response("ok"));

    let (status, body) = send(
        &app.router,
        post_assist(json!({ "userId": "user-1", "toolId": "  ", "inputText": "hi" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["toolId"], "chat");
}

#[tokio::test]
async fn unknown_tool_is_400_with_available_tools() {
    let app = app_with_store(MockLlmClient::new());

    let (status, body) = send(
        &app.router,
        post_assist(json!({ "userId": "user-1", "toolId": "haiku", "inputText": "hi" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "UNKNOWN_TOOL");
    let available = body["details"]["availableTools"].as_array().unwrap();
    assert!(available.contains(&json!("rewrite")));
    assert_eq!(app.llm.call_count(), 0);
}

#[tokio::test]
async fn empty_input_is_400_without_llm_call() {
    let app = app_with_store(MockLlmClient::new());

    let (status, body) = send(
        &app.router,
        post_assist(json!({ "userId": "user-1", "toolId": "rewrite", "inputText": "   " })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
    assert_eq!(app.llm.call_count(), 0);
}

#[tokio::test]
async fn blank_user_id_is_400() {
    let app = app_with_store(MockLlmClient::new());

    let (status, body) = send(
        &app.router,
        post_assist(json!({ "userId": "", "inputText": "hello" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn missing_input_text_is_400_json() {
    let app = app_with_store(MockLlmClient::new());

    let (status, body) = send(
        &app.router,
        post_assist(json!({ "userId": "u1", "toolId": "chat" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
    assert_eq!(body["details"]["field"], "body");
    assert_eq!(app.llm.call_count(), 0);
}

#[tokio::test]
async fn malformed_json_is_400_json() {
    let app = app_with_store(MockLlmClient::new());

    let request = Request::post("/api/writing/assist")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"userId\": \"u1\","))
        .unwrap();
    let (status, body) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn rate_limit_is_429_with_retry_after() {
    let app = app_with_store(
        MockLlmClient::new().with_error(LlmError::rate_limited(Some(12), "slow down")),
    );

    let response = app
        .router
        .clone()
        .oneshot(post_assist(
            json!({ "userId": "user-1", "inputText": "hello" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()[header::RETRY_AFTER], "12");
    assert_eq!(app.llm.call_count(), 1);
}

#[tokio::test]
async fn transient_failures_are_retried_transparently() {
    let app = app_with_store(
        MockLlmClient::new()
            .with_transient_failures(2)
            .with_response("third time lucky"),
    );

    let (status, body) = send(
        &app.router,
        post_assist(json!({ "userId": "user-1", "inputText": "hello" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["output"], "third time lucky");
    assert_eq!(app.llm.call_count(), 3);
}

#[tokio::test]
async fn exhausted_retries_are_503() {
    let app = app_with_store(MockLlmClient::new().with_transient_failures(3));

    let (status, body) = send(
        &app.router,
        post_assist(json!({ "userId": "user-1", "inputText": "hello" })),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "LLM_UNAVAILABLE");
}

// =============================================================================
// Results and History
// =============================================================================

#[tokio::test]
async fn stored_result_is_readable_by_id() {
    let app = app_with_store(MockLlmClient::new().with_response("Polished text."));

    let (_, created) = send(
        &app.router,
        post_assist(json!({ "userId": "user-1", "toolId": "rewrite", "inputText": "text" })),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let (status, fetched) = send(&app.router, get(&format!("/api/writing/results/{}", id))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], id);
    assert_eq!(fetched["output"], "Polished text.");
    assert_eq!(fetched["originalRequest"]["inputText"], "text");
}

#[tokio::test]
async fn missing_result_is_404() {
    let app = app_with_store(MockLlmClient::new());

    let (status, body) = send(
        &app.router,
        get("/api/writing/results/6f1c3e9a-2b7d-4c8e-9f0a-1b2c3d4e5f60"),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn malformed_result_id_is_400() {
    let app = app_with_store(MockLlmClient::new());

    let (status, _) = send(&app.router, get("/api/writing/results/not-a-uuid")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn history_lists_only_the_users_results() {
    let app = app_with_store(MockLlmClient::new());

    for (user, text) in [("alice", "one"), ("bob", "two"), ("alice", "three")] {
        let (status, _) = send(
            &app.router,
            post_assist(json!({ "userId": user, "inputText": text })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(&app.router, get("/api/writing/history?userId=alice")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userId"], "alice");
    assert_eq!(body["count"], 2);
    let results = body["results"].as_array().unwrap();
    assert!(results
        .iter()
        .all(|r| r["originalRequest"]["userId"] == "alice"));
}

#[tokio::test]
async fn history_respects_limit() {
    let app = app_with_store(MockLlmClient::new());

    for text in ["a", "b", "c"] {
        send(
            &app.router,
            post_assist(json!({ "userId": "carol", "inputText": text })),
        )
        .await;
    }

    let (_, body) = send(&app.router, get("/api/writing/history?userId=carol&limit=2")).await;

    assert_eq!(body["count"], 2);
}

#[tokio::test]
async fn disabled_persistence_still_answers() {
    let app = build_app(MockLlmClient::new().with_response("fine"), None);

    let (status, body) = send(
        &app.router,
        post_assist(json!({ "userId": "user-1", "inputText": "hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["persistence"]["status"], "disabled");

    let id = body["id"].as_str().unwrap();
    let (status, _) = send(&app.router, get(&format!("/api/writing/results/{}", id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, history) = send(&app.router, get("/api/writing/history?userId=user-1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history["count"], 0);
}

#[tokio::test]
async fn concurrent_requests_are_independent() {
    let app = app_with_store(MockLlmClient::new().with_delay(Duration::from_millis(20)));

    let requests = (0..8).map(|i| {
        send(
            &app.router,
            post_assist(json!({ "userId": "dave", "toolId": "rewrite", "inputText": format!("draft {}", i) })),
        )
    });
    let responses = futures::future::join_all(requests).await;

    for (i, (status, body)) in responses.into_iter().enumerate() {
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["output"],
            format!("Rewrite in a neutral tone: draft {}", i)
        );
    }

    let (_, history) = send(&app.router, get("/api/writing/history?userId=dave")).await;
    assert_eq!(history["count"], 8);
}

#[tokio::test]
async fn dropped_request_abandons_llm_call() {
    let app = app_with_store(MockLlmClient::new().with_delay(Duration::from_millis(200)));

    let in_flight = app.router.clone().oneshot(post_assist(
        json!({ "userId": "erin", "toolId": "rewrite", "inputText": "never finished" }),
    ));
    let outcome = tokio::time::timeout(Duration::from_millis(50), in_flight).await;
    assert!(outcome.is_err(), "request should still be waiting on the LLM");
    assert_eq!(app.llm.call_count(), 1);

    // Past the point where the LLM call would have returned.
    tokio::time::sleep(Duration::from_millis(400)).await;

    let (_, history) = send(&app.router, get("/api/writing/history?userId=erin")).await;
    assert_eq!(history["count"], 0);

    let (_, usage) = send(&app.router, get("/api/writing/usage")).await;
    assert_eq!(usage["calls"], 0);
}

// =============================================================================
// Tools and Usage
// =============================================================================

#[tokio::test]
async fn tools_lists_builtin_catalog() {
    let app = app_with_store(MockLlmClient::new());

    let (status, body) = send(&app.router, get("/api/writing/tools")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["defaultTool"], "chat");
    assert_eq!(body["count"], 7);
    let ids: Vec<&str> = body["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap())
        .collect();
    for expected in ["chat", "rewrite", "summarize", "proofread"] {
        assert!(ids.contains(&expected), "missing tool {}", expected);
    }
}

#[tokio::test]
async fn usage_reflects_calls_and_attempts() {
    let app = app_with_store(
        MockLlmClient::new()
            .with_transient_failures(1)
            .with_response("done"),
    );

    let (status, _) = send(
        &app.router,
        post_assist(json!({ "userId": "user-1", "inputText": "hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, usage) = send(&app.router, get("/api/writing/usage")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(usage["calls"], 1);
    assert_eq!(usage["successfulCalls"], 1);
    assert_eq!(usage["attempts"], 2);
    assert_eq!(usage["totalTokens"], 30);
}
