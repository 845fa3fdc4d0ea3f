use crate::tools::{Tool, ToolResult};
use async_trait::async_trait;
use serde_json::{json, Value};

use super::args;

pub struct ToUpperCaseTool;

#[async_trait]
impl Tool for ToUpperCaseTool {
    fn name(&self) -> String {
        "toUpperCase".to_string()
    }

    fn description(&self) -> String {
        "Put the text to upper case".to_string()
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "input": {
                    "type": "string",
                    "description": "Text to convert"
                }
            },
            "required": ["input"]
        })
    }

    async fn call(&self, arguments: Value) -> ToolResult<Value> {
        let input = args::string(&arguments, "input")?;
        Ok(Value::String(input.to_uppercase()))
    }
}
