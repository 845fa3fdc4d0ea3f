//! Structured output: one non-streamed call decoded into a typed entity.
//!
//! The entity's JSON Schema (via [`schemars`]) is appended to the user
//! message as format instructions; the complete reply is then decoded with
//! serde. Anything that does not deserialize is a
//! [`GatewayError::Decode`], never a partial entity.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::llm::ChatProvider;
use crate::prompt::Prompt;
use crate::{GatewayError, Result};

use super::extractor::extract_text;

/// Sample entity: each key maps to the list of values produced for it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ResponseModels {
    pub entries: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct StructuredDecoder {
    instruction: String,
}

impl StructuredDecoder {
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
        }
    }

    /// System instruction plus the user text with format instructions for `T`
    pub fn prompt_for<T: JsonSchema>(&self, user_text: &str) -> Result<Prompt> {
        let user = format!("{}\n\n{}", user_text, format_instructions::<T>()?);
        Ok(Prompt::new(self.instruction.clone(), user))
    }

    #[tracing::instrument(name = "structured.decode", skip(self, provider))]
    pub async fn decode<T>(&self, provider: &dyn ChatProvider, user_text: &str) -> Result<T>
    where
        T: DeserializeOwned + JsonSchema,
    {
        let prompt = self.prompt_for::<T>(user_text)?;
        let response = provider.call(&prompt.to_chat_messages()).await?;
        decode_document(extract_text(&response))
    }
}

/// Instructions asking the model for a bare JSON document matching `T`
pub fn format_instructions<T: JsonSchema>() -> Result<String> {
    let schema = schemars::schema_for!(T);
    let schema = serde_json::to_string_pretty(&schema)
        .map_err(|e| GatewayError::Decode(format!("Failed to render JSON Schema: {e}")))?;
    Ok(format!(
        "Your response must be a single RFC 8259 compliant JSON document and nothing else. \
         Do not add explanations or markdown code fences. \
         The document must conform to this JSON Schema:\n{schema}"
    ))
}

/// Decode a complete reply, tolerating surrounding whitespace and a
/// markdown code fence
pub fn decode_document<T: DeserializeOwned>(text: &str) -> Result<T> {
    let body = strip_code_fence(text);
    if body.is_empty() {
        warn!(target: "structured", "Structured response was empty");
        return Err(GatewayError::Decode("empty response".into()));
    }
    serde_json::from_str(body).map_err(|e| {
        debug!(target: "structured", error = %e, body = %body, "Structured response did not match");
        GatewayError::Decode(e.to_string())
    })
}

fn strip_code_fence(text: &str) -> &str {
    let t = text.trim();
    let Some(rest) = t.strip_prefix("```") else {
        return t;
    };
    // Drop the info string (e.g. "json") on the opening line
    let rest = match rest.find('\n') {
        Some(nl) => &rest[nl + 1..],
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
