use futures::StreamExt;
use parley_core::llm::{ChatMessage, ChatProvider, LlmClient, LlmClientConfig};
use parley_core::tools::ToolSpec;
use parley_core::{Aggregator, GatewayError, Prompt, Result};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> LlmClient {
    let cfg = LlmClientConfig {
        base_url: format!("{}/v1", server.uri()),
        model: "test-model".to_string(),
        api_key: Some("sk-test".to_string()),
        request_timeout_ms: 5_000,
        temperature: 0.7,
        max_tokens: None,
    };
    LlmClient::new(cfg).unwrap()
}

fn messages(user: &str) -> Vec<ChatMessage> {
    Prompt::new("You are a helpful assistant.", user).to_chat_messages()
}

#[test]
fn client_creation_succeeds() -> Result<()> {
    let cfg = LlmClientConfig {
        base_url: "http://localhost:8000/v1".to_string(),
        model: "test".to_string(),
        api_key: None,
        request_timeout_ms: 10_000,
        temperature: 0.7,
        max_tokens: Some(256),
    };
    let client = LlmClient::new(cfg.clone())?;
    assert_eq!(client.config(), &cfg);
    Ok(())
}

#[tokio::test]
async fn call_posts_messages_and_reads_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "messages": [
                {"role": "system", "content": "You are a helpful assistant."},
                {"role": "user", "content": "Say Hello to me"}
            ]
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-ratelimit-remaining-requests", "99")
                .set_body_json(json!({
                    "model": "test-model",
                    "choices": [{
                        "message": {"role": "assistant", "content": "Hello there!"},
                        "finish_reason": "stop"
                    }],
                    "usage": {"prompt_tokens": 10, "completion_tokens": 3, "total_tokens": 13}
                })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let response = client_for(&server).call(&messages("Say Hello to me")).await.unwrap();

    let result = response.result.unwrap();
    assert_eq!(result.output_text.as_deref(), Some("Hello there!"));
    assert_eq!(result.finish_reason.as_deref(), Some("stop"));
    let meta = response.metadata.unwrap();
    assert_eq!(meta.usage.unwrap().total_tokens, 13);
    assert_eq!(meta.rate_limit.unwrap().requests_remaining, Some(99));
    assert!(response.tool_calls.is_empty());
}

#[tokio::test]
async fn call_with_tools_parses_tool_calls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({
            "tool_choice": "auto",
            "tools": [{"type": "function", "function": {"name": "add"}}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {"name": "add", "arguments": "{\"a\": 2, \"b\": 2}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        })))
        .mount(&server)
        .await;

    let tools = vec![ToolSpec {
        name: "add".into(),
        description: "Add two numbers".into(),
        parameters: json!({"type": "object", "properties": {"a": {"type": "number"}, "b": {"type": "number"}}}),
    }];
    let response = client_for(&server)
        .call_with_tools(&messages("add 2 and 2"), &tools)
        .await
        .unwrap();

    assert!(response.has_pending_tool_calls());
    let tc = &response.tool_calls[0];
    assert_eq!(tc.id.as_deref(), Some("call_abc"));
    assert_eq!(tc.name, "add");
    assert_eq!(tc.arguments["a"], json!(2));
}

#[tokio::test]
async fn stream_decodes_sse_deltas() {
    let server = MockServer::start().await;
    let body = concat!(
        "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
        ": keep-alive\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"lo!\"},\"finish_reason\":\"stop\"}]}\n\n",
        "data: {\"choices\":[],\"usage\":{\"prompt_tokens\":5,\"completion_tokens\":2,\"total_tokens\":7}}\n\n",
        "data: [DONE]\n\n",
    );
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"stream": true, "stream_options": {"include_usage": true}})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let chunks: Vec<_> = client
        .stream(&messages("Say Hello to me"))
        .await
        .unwrap()
        .collect()
        .await;
    assert_eq!(chunks.len(), 4);
    let last = chunks[3].as_ref().unwrap();
    assert!(last.result.is_none());
    assert_eq!(last.metadata.as_ref().unwrap().usage.unwrap().total_tokens, 7);

    let text = Aggregator::new()
        .fold(client.stream(&messages("Say Hello to me")).await.unwrap())
        .await
        .unwrap();
    assert_eq!(text, "Hello!");
}

async fn mount_stream(server: &MockServer, body: &'static str) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn mid_stream_error_event_fails_the_fold() {
    let server = MockServer::start().await;
    mount_stream(
        &server,
        concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
            "data: {\"error\":{\"message\":\"The server had an error\",\"type\":\"server_error\"}}\n\n",
        ),
    )
    .await;
    let client = client_for(&server);

    let err = Aggregator::new()
        .fold(client.stream(&messages("Say Hello to me")).await.unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Provider(ref m) if m.contains("The server had an error")));

    let live: Vec<_> = Aggregator::new()
        .pass_through(client.stream(&messages("Say Hello to me")).await.unwrap())
        .collect()
        .await;
    assert_eq!(live.len(), 2);
    assert_eq!(live[0].as_deref().unwrap(), "Hel");
    assert!(live[1].is_err());
}

#[tokio::test]
async fn truncated_stream_fails_the_fold() {
    let server = MockServer::start().await;
    mount_stream(
        &server,
        concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}",
        ),
    )
    .await;

    let err = Aggregator::new()
        .fold(client_for(&server).stream(&messages("hi")).await.unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Provider(_)));
}

#[tokio::test]
async fn non_success_status_is_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.call(&messages("hi")).await.unwrap_err();
    match err {
        GatewayError::Provider(msg) => {
            assert!(msg.contains("429"));
            assert!(msg.contains("slow down"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert!(matches!(
        client.stream(&messages("hi")).await,
        Err(GatewayError::Provider(_))
    ));
}

#[tokio::test]
async fn unreachable_backend_is_provider_error() {
    let cfg = LlmClientConfig {
        base_url: "http://127.0.0.1:9/v1".to_string(),
        model: "test".to_string(),
        api_key: None,
        request_timeout_ms: 1_000,
        temperature: 0.0,
        max_tokens: None,
    };
    let err = LlmClient::new(cfg).unwrap().call(&messages("hi")).await.unwrap_err();
    assert!(matches!(err, GatewayError::Provider(_)));
}
