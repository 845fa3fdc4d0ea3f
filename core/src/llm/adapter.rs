use serde_json::{json, Value};

use crate::tools::ToolSpec;

use super::types::{ChatMessage, ToolCallRequest};

/// Convert conversation entries into Chat Completions `messages`
pub fn chat_messages_to_payload(messages: &[ChatMessage]) -> Vec<Value> {
    messages
        .iter()
        .map(|m| match m {
            ChatMessage::System { content } => json!({"role": "system", "content": content}),
            ChatMessage::User { content } => json!({"role": "user", "content": content}),
            ChatMessage::Assistant {
                content,
                tool_calls,
            } => {
                let mut msg = json!({"role": "assistant", "content": content});
                if !tool_calls.is_empty() {
                    msg["tool_calls"] =
                        Value::Array(tool_calls.iter().map(tool_call_to_payload).collect());
                }
                msg
            }
            ChatMessage::Tool { call_id, content } => {
                json!({"role": "tool", "tool_call_id": call_id, "content": content})
            }
        })
        .collect()
}

/// Convert tool specs into the Chat Completions `tools` array
pub fn tool_specs_to_payload(tools: &[ToolSpec]) -> Vec<Value> {
    tools
        .iter()
        .map(|t| {
            json!({
                "type": "function",
                "function": {
                    "name": t.name,
                    "description": t.description,
                    "parameters": t.parameters,
                }
            })
        })
        .collect()
}

fn tool_call_to_payload(call: &ToolCallRequest) -> Value {
    // Arguments travel as a JSON-encoded string
    let arguments = Value::Object(call.arguments.clone()).to_string();
    json!({
        "id": call.id.clone().unwrap_or_default(),
        "type": "function",
        "function": {"name": call.name, "arguments": arguments},
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    #[test]
    fn renders_tool_round_trip_messages() {
        let mut args = Map::new();
        args.insert("a".into(), json!(2));
        args.insert("b".into(), json!(2));
        let msgs = vec![
            ChatMessage::System {
                content: "sys".into(),
            },
            ChatMessage::User {
                content: "add 2 and 2".into(),
            },
            ChatMessage::Assistant {
                content: None,
                tool_calls: vec![ToolCallRequest {
                    id: Some("call_1".into()),
                    name: "add".into(),
                    arguments: args,
                }],
            },
            ChatMessage::Tool {
                call_id: "call_1".into(),
                content: "4.0".into(),
            },
        ];

        let payload = chat_messages_to_payload(&msgs);
        assert_eq!(payload.len(), 4);
        assert_eq!(payload[0]["role"], "system");
        assert_eq!(payload[1]["content"], "add 2 and 2");
        assert_eq!(payload[2]["content"], Value::Null);
        assert_eq!(payload[2]["tool_calls"][0]["function"]["name"], "add");
        assert_eq!(
            payload[2]["tool_calls"][0]["function"]["arguments"],
            r#"{"a":2,"b":2}"#
        );
        assert_eq!(payload[3]["tool_call_id"], "call_1");
    }

    #[test]
    fn renders_function_tools() {
        let tools = vec![ToolSpec {
            name: "add".into(),
            description: "Adds two numbers".into(),
            parameters: json!({"type": "object"}),
        }];
        let payload = tool_specs_to_payload(&tools);
        assert_eq!(payload[0]["type"], "function");
        assert_eq!(payload[0]["function"]["name"], "add");
    }
}
