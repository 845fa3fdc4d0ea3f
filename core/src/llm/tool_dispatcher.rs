use std::time::Instant;

use serde_json::Value;
use tracing::{debug, info, warn, Span};

use crate::prompt::Prompt;
use crate::tools::{ToolError, ToolRegistry};
use crate::{GatewayError, Result};

use super::provider::ChatProvider;
use super::types::{ChatMessage, CompletionResponse, ToolCallRequest};

/// Dispatcher options controlling the tool loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherOptions {
    /// Rounds of tool execution allowed before the request fails
    pub max_rounds: usize,
}

impl Default for DispatcherOptions {
    fn default() -> Self {
        Self { max_rounds: 8 }
    }
}

/// Final answer surfaced to the caller
#[derive(Debug, Clone)]
pub struct FinalAnswer {
    /// The response that carried no pending tool call
    pub response: CompletionResponse,
    /// Every tool call executed, in order
    pub tool_calls: Vec<ToolCallRequest>,
    pub rounds: usize,
}

/// Resolves model tool calls against the registry and resumes the call
/// with the results until the model stops asking for tools.
#[derive(Clone)]
pub struct ToolDispatcher {
    registry: ToolRegistry,
    options: DispatcherOptions,
}

impl ToolDispatcher {
    pub fn new(registry: ToolRegistry, options: DispatcherOptions) -> Self {
        Self { registry, options }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Run the prompt with every registered tool exposed.
    /// Contract:
    /// - Input: Prompt
    /// - Output: FinalAnswer whose response has no pending tool calls
    /// - Error: provider failure, unresolvable tool, tool failure, round limit
    #[tracing::instrument(name = "tool_dispatcher.run", skip(self, provider, prompt), fields(tool_count, rounds))]
    pub async fn run(&self, provider: &dyn ChatProvider, prompt: &Prompt) -> Result<FinalAnswer> {
        let tools = self.registry.specs();
        Span::current().record("tool_count", tools.len());

        let mut messages = prompt.to_chat_messages();
        let mut executed = Vec::new();
        let mut round = 0usize;

        loop {
            let started = Instant::now();
            let response = provider.call_with_tools(&messages, &tools).await?;
            let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
            debug!(target: "tool_dispatcher", round, calls = response.tool_calls.len(), latency_ms = %elapsed_ms, "Model turn finished");

            if !response.has_pending_tool_calls() {
                Span::current().record("rounds", round);
                return Ok(FinalAnswer {
                    response,
                    tool_calls: executed,
                    rounds: round,
                });
            }
            if round >= self.options.max_rounds {
                warn!(target: "tool_dispatcher", max_rounds = self.options.max_rounds, "Tool loop did not settle");
                return Err(GatewayError::ToolRoundsExceeded(self.options.max_rounds));
            }
            round += 1;

            let calls: Vec<ToolCallRequest> = response
                .tool_calls
                .into_iter()
                .map(|mut c| {
                    c.id.get_or_insert_with(new_call_id);
                    c
                })
                .collect();
            let content = response
                .result
                .and_then(|g| g.output_text)
                .filter(|s| !s.is_empty());
            messages.push(ChatMessage::Assistant {
                content,
                tool_calls: calls.clone(),
            });

            // Invoke tools sequentially, in the order the model listed them
            for call in calls {
                let output = self.dispatch(&call).await?;
                messages.push(ChatMessage::Tool {
                    call_id: call.id.clone().unwrap_or_default(),
                    content: render_output(&output),
                });
                executed.push(call);
            }
        }
    }

    /// Execute one tool call. Unknown names fail without invoking anything;
    /// tool failures are surfaced unchanged.
    pub async fn dispatch(&self, call: &ToolCallRequest) -> Result<Value> {
        let started = Instant::now();
        let result = self
            .registry
            .call(&call.name, Value::Object(call.arguments.clone()))
            .await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        match result {
            Ok(v) => {
                info!(target: "tool_dispatcher", tool = %call.name, latency_ms = %elapsed_ms, "Tool invocation finished");
                Ok(v)
            }
            Err(ToolError::NotFound(name)) => {
                warn!(target: "tool_dispatcher", tool = %name, "Model requested an unregistered tool");
                Err(GatewayError::UnresolvableTool(name))
            }
            Err(source) => Err(GatewayError::ToolExecution {
                tool: call.name.clone(),
                source,
            }),
        }
    }
}

fn render_output(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn new_call_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("call_{:x}", now)
}
