use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use parley_core::llm::mock::CallKind;
use parley_core::llm::{ChatMessage, ChunkMetadata, MockProvider, ResponseChunk, ToolCallRequest, Usage};
use parley_core::{GatewayConfig, GatewayError, ResponseFacade, ToolRegistry};
use parley_server::{router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt; // for oneshot

fn app(provider: Arc<MockProvider>) -> Router {
    let cfg = GatewayConfig {
        system_prompt: "You are a helpful assistant.".into(),
        ..GatewayConfig::default()
    };
    let facade = ResponseFacade::new(provider, ToolRegistry::with_builtin_tools(), &cfg);
    router(AppState::new(facade))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_text(resp: Response) -> String {
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn content_type(resp: &Response) -> String {
    resp.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn user_message(provider: &MockProvider) -> String {
    provider.calls()[0]
        .messages
        .iter()
        .find_map(|m| match m {
            ChatMessage::User { content } => Some(content.clone()),
            _ => None,
        })
        .unwrap_or_default()
}

fn greeting_chunks() -> Vec<parley_core::Result<ResponseChunk>> {
    vec![
        Ok(ResponseChunk::text("Hello")),
        Ok(ResponseChunk::text(" there")),
        Ok(ResponseChunk::metadata_only(ChunkMetadata {
            usage: Some(Usage {
                prompt_tokens: 8,
                completion_tokens: 2,
                total_tokens: 10,
            }),
            ..Default::default()
        })),
    ]
}

#[tokio::test]
async fn generate_returns_content_json() {
    let provider = Arc::new(MockProvider::new().with_completion(ResponseChunk::text("Hello!")));
    let resp = app(provider.clone())
        .oneshot(get("/ai/generate?userInput=Greet%20me"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(content_type(&resp).starts_with("application/json"));
    let body: Value = serde_json::from_str(&body_text(resp).await).unwrap();
    assert_eq!(body, json!({"content": "Hello!"}));
    assert_eq!(user_message(&provider), "Greet me");
}

#[tokio::test]
async fn missing_user_input_uses_endpoint_default() {
    let provider = Arc::new(MockProvider::new().with_completion(ResponseChunk::text("Hi")));
    let resp = app(provider.clone()).oneshot(get("/ai/generate")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(user_message(&provider), "Say Hello to me");
}

#[tokio::test]
async fn stream_emits_one_json_string_per_line() {
    let provider = Arc::new(MockProvider::new().with_stream(greeting_chunks()));
    let resp = app(provider).oneshot(get("/ai/generate/stream")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(content_type(&resp), "application/x-ndjson");
    let lines: Vec<String> = body_text(resp)
        .await
        .lines()
        .map(|l| serde_json::from_str::<String>(l).unwrap())
        .collect();
    assert_eq!(lines, vec!["Hello", " there"]);
}

#[tokio::test]
async fn stream_failure_ends_with_error_line() {
    let provider = Arc::new(MockProvider::new().with_stream(vec![
        Ok(ResponseChunk::text("partial")),
        Err(GatewayError::Provider("connection reset".into())),
        Ok(ResponseChunk::text("never sent")),
    ]));
    let resp = app(provider).oneshot(get("/ai/generate/stream")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let text = body_text(resp).await;
    let lines: Vec<Value> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], json!("partial"));
    assert!(lines[1]["error"].as_str().unwrap().contains("connection reset"));
}

#[tokio::test]
async fn mono_matches_stream_concatenation() {
    let provider = Arc::new(
        MockProvider::new()
            .with_stream(greeting_chunks())
            .with_stream(greeting_chunks()),
    );
    let app = app(provider);

    let mono = app.clone().oneshot(get("/ai/generate/stream/mono")).await.unwrap();
    assert_eq!(mono.status(), StatusCode::OK);
    assert!(content_type(&mono).starts_with("text/plain"));
    let mono = body_text(mono).await;

    let stream = app.oneshot(get("/ai/generate/stream")).await.unwrap();
    let joined: String = body_text(stream)
        .await
        .lines()
        .map(|l| serde_json::from_str::<String>(l).unwrap())
        .collect();

    assert_eq!(mono, "Hello there");
    assert_eq!(joined, mono);
}

#[tokio::test]
async fn chunks_include_metadata() {
    let provider = Arc::new(MockProvider::new().with_stream(greeting_chunks()));
    let resp = app(provider).oneshot(get("/ai/generate/stream/chunks")).await.unwrap();

    let chunks: Vec<ResponseChunk> = body_text(resp)
        .await
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[2].metadata.as_ref().unwrap().usage.unwrap().total_tokens, 10);
}

#[tokio::test]
async fn math_resolves_tool_call() {
    let provider = Arc::new(
        MockProvider::new()
            .with_completion(ResponseChunk::with_tool_calls(vec![ToolCallRequest {
                id: Some("call_1".into()),
                name: "add".into(),
                arguments: json!({"a": 2, "b": 2}).as_object().cloned().unwrap(),
            }]))
            .with_completion(ResponseChunk::text("4")),
    );
    let resp = app(provider.clone()).oneshot(get("/ai/math")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "4");
    assert_eq!(user_message(&provider), "add 2 and 2");
    assert!(provider.calls().iter().all(|c| c.kind == CallKind::CallWithTools));
}

#[tokio::test]
async fn math_tool_failure_is_unprocessable() {
    let provider = Arc::new(MockProvider::new().with_completion(ResponseChunk::with_tool_calls(
        vec![ToolCallRequest {
            id: Some("call_1".into()),
            name: "squareRoot".into(),
            arguments: json!({"number": -4}).as_object().cloned().unwrap(),
        }],
    )));
    let resp = app(provider)
        .oneshot(get("/ai/math?userInput=square%20root%20of%20-4"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = serde_json::from_str(&body_text(resp).await).unwrap();
    assert!(body["error"].as_str().unwrap().contains("squareRoot"));
}

#[tokio::test]
async fn unknown_tool_is_server_error() {
    let provider = Arc::new(MockProvider::new().with_completion(ResponseChunk::with_tool_calls(
        vec![ToolCallRequest {
            id: Some("call_1".into()),
            name: "teleport".into(),
            arguments: Default::default(),
        }],
    )));
    let resp = app(provider).oneshot(get("/ai/math")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn structured_returns_entity() {
    let provider = Arc::new(MockProvider::new().with_completion(ResponseChunk::text(
        "```json\n{\"entries\": {\"Countries\": [\"France\", \"Japan\"], \"Capitals\": [\"Paris\", \"Tokyo\"]}}\n```",
    )));
    let resp = app(provider.clone()).oneshot(get("/ai/generate/structured")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_text(resp).await).unwrap();
    assert_eq!(body["entries"]["Capitals"], json!(["Paris", "Tokyo"]));
    assert!(user_message(&provider).starts_with("name 10 countries with their capital cities"));
}

#[tokio::test]
async fn structured_decode_failure_is_bad_gateway() {
    let provider = Arc::new(
        MockProvider::new().with_completion(ResponseChunk::text("Sure! France: Paris.")),
    );
    let resp = app(provider).oneshot(get("/ai/generate/structured")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn provider_failure_is_bad_gateway() {
    let provider = Arc::new(
        MockProvider::new().with_failure(GatewayError::Provider("status=503".into())),
    );
    let resp = app(provider).oneshot(get("/ai/generate")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body: Value = serde_json::from_str(&body_text(resp).await).unwrap();
    assert!(body["error"].as_str().unwrap().contains("503"));
}
