//! Integration tests for the showtalk API.
//!
//! Drives the full router with scripted LLM and in-memory catalog
//! collaborators, covering the decided and naive chat flows, request
//! validation, credential errors, and the SSE wire format. Each test builds
//! its own state.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use showtalk_api::create_router;
use showtalk_api::handlers::{ChatResponse, HealthResponse};
use showtalk_api::state::AppState;
use showtalk_chat::testing::{MemoryEpisodeStore, ScriptedLlm, ScriptedProvider};
use showtalk_core::config::ShowtalkConfig;
use showtalk_core::types::{GroundingStrategy, ResponseChunk, Role};
use showtalk_storage::{Database, EpisodeRepository};

// =============================================================================
// Helpers
// =============================================================================

fn wedding_store() -> Arc<MemoryEpisodeStore> {
    Arc::new(
        MemoryEpisodeStore::new()
            .with_episode("The Wedding", "Kim marries Kris.", 8.1)
            .with_episode("Kardashian Christmas", "Holiday card drama.", 7.0),
    )
}

fn chunk(text: &str) -> ResponseChunk {
    ResponseChunk {
        content: Some(text.to_string()),
        reasoning: None,
    }
}

fn config(strategy: GroundingStrategy) -> ShowtalkConfig {
    let mut config = ShowtalkConfig::default();
    config.chat.strategy = strategy;
    config
}

fn make_app(
    strategy: GroundingStrategy,
    store: Arc<MemoryEpisodeStore>,
    provider: ScriptedProvider,
) -> axum::Router {
    create_router(AppState::from_parts(
        config(strategy),
        store,
        Arc::new(provider),
    ))
}

fn post_json(uri: &str, json: &str) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(resp: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(resp).await).unwrap()
}

/// Parse the `data:` payloads of an SSE body, ignoring keep-alive comments.
async fn sse_events(resp: axum::response::Response) -> Vec<Value> {
    let text = String::from_utf8(body_bytes(resp).await).unwrap();
    text.split("\n\n")
        .filter_map(|block| {
            block
                .lines()
                .find_map(|line| line.strip_prefix("data: "))
                .map(|data| serde_json::from_str(data).unwrap())
        })
        .collect()
}

// =============================================================================
// Decided strategy
// =============================================================================

#[tokio::test]
async fn test_small_talk_skips_search_and_streams_direct_answer() {
    let llm = Arc::new(ScriptedLlm::new("NO").with_stream(vec![chunk("Hi! "), chunk("How can I help?")]));
    let store = wedding_store();
    let app = make_app(
        GroundingStrategy::Decided,
        store.clone(),
        ScriptedProvider::with_client(llm.clone()),
    );

    let resp = app
        .oneshot(post_json("/chat", r#"{"message":"Hi there"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let events = sse_events(resp).await;
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["content"], "Hi! ");
    assert_eq!(events[1]["content"], "How can I help?");

    assert!(store.queries().is_empty());
    let calls = llm.calls();
    assert_eq!(calls.len(), 2);
    assert!(!calls[0].streamed);
    let answer = &calls[1];
    assert!(answer.streamed);
    assert_eq!(answer.messages.len(), 2);
    assert_eq!(answer.messages[1].role, Role::User);
    assert_eq!(answer.messages[1].content, "Hi there");
}

#[tokio::test]
async fn test_episode_question_searches_and_grounds_answer() {
    let llm = Arc::new(
        ScriptedLlm::new("YES wedding").with_stream(vec![chunk("It was a big day.")]),
    );
    let store = wedding_store();
    let app = make_app(
        GroundingStrategy::Decided,
        store.clone(),
        ScriptedProvider::with_client(llm.clone()),
    );

    let resp = app
        .oneshot(post_json(
            "/chat",
            r#"{"message":"tell me about the wedding episode"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let events = sse_events(resp).await;
    assert_eq!(events, vec![serde_json::json!({"content": "It was a big day."})]);

    assert_eq!(store.queries(), vec!["wedding"]);
    let calls = llm.calls();
    let prompt = &calls[1].messages.last().unwrap().content;
    assert!(prompt.contains("Title: The Wedding"));
    assert!(prompt.ends_with("User question: tell me about the wedding episode"));
}

#[tokio::test]
async fn test_mid_stream_failure_is_final_error_event() {
    let llm = Arc::new(
        ScriptedLlm::new("NO")
            .with_stream(vec![chunk("Partial")])
            .failing_stream_after("connection reset"),
    );
    let app = make_app(
        GroundingStrategy::Decided,
        wedding_store(),
        ScriptedProvider::with_client(llm),
    );

    let resp = app
        .oneshot(post_json("/chat", r#"{"message":"Hello"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let events = sse_events(resp).await;
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["content"], "Partial");
    assert!(events[1]["error"]
        .as_str()
        .unwrap()
        .contains("connection reset"));
}

#[tokio::test]
async fn test_classifier_failure_is_500_before_streaming() {
    let llm = Arc::new(ScriptedLlm::new("").failing_chat("model offline"));
    let app = make_app(
        GroundingStrategy::Decided,
        wedding_store(),
        ScriptedProvider::with_client(llm),
    );

    let resp = app
        .oneshot(post_json("/chat", r#"{"message":"Who got married?"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(resp).await;
    assert!(json["error"].as_str().unwrap().contains("model offline"));
}

// =============================================================================
// Validation and configuration
// =============================================================================

#[tokio::test]
async fn test_empty_message_is_rejected_without_calls() {
    for body in [r#"{"message":""}"#, r#"{"message":"   "}"#, r#"{}"#, "not json"] {
        let llm = Arc::new(ScriptedLlm::new("NO"));
        let store = wedding_store();
        let app = make_app(
            GroundingStrategy::Decided,
            store.clone(),
            ScriptedProvider::with_client(llm.clone()),
        );

        let resp = app.oneshot(post_json("/chat", body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body: {}", body);
        let json = body_json(resp).await;
        assert_eq!(json, serde_json::json!({"error": "Message is required"}));
        assert!(llm.calls().is_empty());
        assert!(store.queries().is_empty());
    }
}

#[tokio::test]
async fn test_missing_credential_is_500_without_calls() {
    let store = wedding_store();
    let app = make_app(
        GroundingStrategy::Decided,
        store.clone(),
        ScriptedProvider::missing_key("API_KEY"),
    );

    let resp = app
        .oneshot(post_json("/chat", r#"{"message":"tell me about the wedding"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(resp).await;
    assert_eq!(
        json,
        serde_json::json!({"error": "API_KEY environment variable not set"})
    );
    assert!(store.queries().is_empty());
}

#[tokio::test]
async fn test_empty_message_wins_over_missing_credential() {
    let app = make_app(
        GroundingStrategy::Decided,
        wedding_store(),
        ScriptedProvider::missing_key("API_KEY"),
    );
    let resp = app
        .oneshot(post_json("/chat", r#"{"message":""}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Naive strategy
// =============================================================================

#[tokio::test]
async fn test_naive_returns_complete_json_reply() {
    let llm = Arc::new(ScriptedLlm::new("The Wedding aired in season 6."));
    let store = wedding_store();
    let app = make_app(
        GroundingStrategy::Naive,
        store.clone(),
        ScriptedProvider::with_client(llm.clone()),
    );

    let resp = app
        .oneshot(post_json("/chat", r#"{"message":"Wedding"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: ChatResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(body.content, "The Wedding aired in season 6.");

    assert_eq!(store.queries(), vec!["Wedding"]);
    let calls = llm.calls();
    assert_eq!(calls.len(), 1);
    assert!(!calls[0].streamed);
    assert!(calls[0]
        .messages
        .last()
        .unwrap()
        .content
        .contains("Title: The Wedding"));
}

// =============================================================================
// Catalog endpoints over SQLite
// =============================================================================

fn sqlite_app() -> axum::Router {
    let db = Arc::new(Database::in_memory().unwrap());
    let repo = EpisodeRepository::new(db);
    repo.insert_episode(1, "Kim's Fairytale Wedding", "The big day.", 6.5)
        .unwrap();
    repo.insert_episode(2, "100% Kardashian", "Percent in the title.", 7.0)
        .unwrap();
    repo.insert_episode(3, "Kardashian Christmas", "Holiday card.", 8.0)
        .unwrap();

    create_router(AppState::from_parts(
        ShowtalkConfig::default(),
        Arc::new(repo),
        Arc::new(ScriptedProvider::missing_key("API_KEY")),
    ))
}

#[tokio::test]
async fn test_episodes_search_over_sqlite() {
    let resp = sqlite_app()
        .oneshot(
            Request::get("/episodes?title=WEDDING")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(
        json,
        serde_json::json!([{
            "title": "Kim's Fairytale Wedding",
            "descr": "The big day.",
            "imdb_rating": 6.5
        }])
    );
}

#[tokio::test]
async fn test_episodes_percent_is_literal() {
    let resp = sqlite_app()
        .oneshot(Request::get("/episodes?title=100%25").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_json(resp).await;
    let list = json.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["title"], "100% Kardashian");
}

#[tokio::test]
async fn test_health_reports_catalog_size() {
    let resp = sqlite_app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let health: HealthResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(health.status, "ok");
    assert_eq!(health.episode_count, 3);
    assert_eq!(health.strategy, GroundingStrategy::Decided);
}
