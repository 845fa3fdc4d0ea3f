use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error};

use crate::tools::ToolSpec;
use crate::{GatewayError, Result};

use super::adapter::{chat_messages_to_payload, tool_specs_to_payload};
use super::provider::ChatProvider;
use super::stream::into_chunk_stream;
use super::types::{ChatMessage, ChunkStream, CompletionResponse};
use super::wire::{completion_to_chunk, rate_limit_from_headers, ChatCompletion};

/// Configuration for LlmClient loaded from environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct LlmClientConfig {
    pub base_url: String, // e.g., https://api.openai.com/v1
    pub model: String,    // e.g., gpt-4o-mini
    pub api_key: Option<String>,
    pub request_timeout_ms: u64,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl Default for LlmClientConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("LLM_BASE_URL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            model: std::env::var("LLM_MODEL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "gpt-4o-mini".to_string()),
            api_key: std::env::var("LLM_API_KEY")
                .ok()
                .filter(|s| !s.is_empty())
                .or_else(|| std::env::var("OPENAI_API_KEY").ok().filter(|s| !s.is_empty())),
            request_timeout_ms: std::env::var("LLM_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60_000),
            temperature: std::env::var("LLM_TEMPERATURE")
                .ok()
                .and_then(|v| v.parse::<f32>().ok())
                .unwrap_or(0.7),
            max_tokens: std::env::var("LLM_MAX_TOKENS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok()),
        }
    }
}

/// HTTP client for OpenAI-compatible Chat Completions backends
#[derive(Clone)]
pub struct LlmClient {
    http: Client,
    cfg: LlmClientConfig,
}

impl LlmClient {
    pub fn new(cfg: LlmClientConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(cfg.request_timeout_ms))
            .build()
            .map_err(|e| GatewayError::Provider(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { http, cfg })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(LlmClientConfig::default())
    }

    pub fn config(&self) -> &LlmClientConfig {
        &self.cfg
    }

    fn body(&self, messages: &[ChatMessage], tools: &[ToolSpec], stream: bool) -> Value {
        let mut body = json!({
            "model": self.cfg.model,
            "messages": chat_messages_to_payload(messages),
            "temperature": self.cfg.temperature,
        });
        if let Some(max) = self.cfg.max_tokens {
            body["max_tokens"] = json!(max);
        }
        if !tools.is_empty() {
            body["tools"] = Value::Array(tool_specs_to_payload(tools));
            body["tool_choice"] = json!("auto");
        }
        if stream {
            body["stream"] = json!(true);
            body["stream_options"] = json!({"include_usage": true});
        }
        body
    }

    /// POST to chat/completions; non-2xx is a provider failure
    async fn post(&self, body: &Value) -> Result<reqwest::Response> {
        let url = format!(
            "{}/chat/completions",
            self.cfg.base_url.trim_end_matches('/')
        );
        debug!(target: "llm_client", "POST {}", url);

        let mut req = self
            .http
            .post(&url)
            .header("content-type", "application/json");
        if let Some(key) = &self.cfg.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::Provider(format!("Chat Completions HTTP error: {e}")))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            error!(target: "llm_client", %status, body = %text, "Chat Completions error");
            return Err(GatewayError::Provider(format!(
                "Chat Completions error: status={} body={}",
                status, text
            )));
        }
        Ok(resp)
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<CompletionResponse> {
        let resp = self.post(&self.body(messages, tools, false)).await?;
        let rate_limit = rate_limit_from_headers(resp.headers());
        let completion: ChatCompletion = resp.json().await.map_err(|e| {
            GatewayError::Provider(format!("Failed to parse Chat Completions JSON: {e}"))
        })?;
        Ok(completion_to_chunk(completion, Some(&rate_limit)))
    }
}

#[async_trait]
impl ChatProvider for LlmClient {
    async fn call(&self, messages: &[ChatMessage]) -> Result<CompletionResponse> {
        self.complete(messages, &[]).await
    }

    async fn call_with_tools(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<CompletionResponse> {
        self.complete(messages, tools).await
    }

    async fn stream(&self, messages: &[ChatMessage]) -> Result<ChunkStream> {
        let resp = self.post(&self.body(messages, &[], true)).await?;
        let rate_limit = rate_limit_from_headers(resp.headers());
        Ok(into_chunk_stream(resp, rate_limit))
    }
}
