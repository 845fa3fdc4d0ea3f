//! Coercion of model-supplied JSON arguments into typed parameters.
//!
//! Models are loose with types: numbers may arrive as strings and integers as
//! whole floats. These helpers accept those forms and reject the rest with
//! [`ToolError::InvalidArguments`].

use serde_json::Value;

use crate::tools::{ToolError, ToolResult};

fn field<'a>(args: &'a Value, key: &str) -> ToolResult<&'a Value> {
    args.get(key)
        .filter(|v| !v.is_null())
        .ok_or_else(|| ToolError::InvalidArguments(format!("missing '{key}'")))
}

fn to_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

pub fn number(args: &Value, key: &str) -> ToolResult<f64> {
    let v = field(args, key)?;
    to_f64(v).ok_or_else(|| ToolError::InvalidArguments(format!("'{key}' is not a number: {v}")))
}

pub fn integer(args: &Value, key: &str) -> ToolResult<i64> {
    let v = field(args, key)?;
    let bad = || ToolError::InvalidArguments(format!("'{key}' is not an integer: {v}"));
    if let Some(i) = v.as_i64() {
        return Ok(i);
    }
    let f = to_f64(v).ok_or_else(bad)?;
    if f.fract() != 0.0 || f < i64::MIN as f64 || f > i64::MAX as f64 {
        return Err(bad());
    }
    Ok(f as i64)
}

/// A list of numbers; a missing key is an empty list
pub fn numbers(args: &Value, key: &str) -> ToolResult<Vec<f64>> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| {
                to_f64(v).ok_or_else(|| {
                    ToolError::InvalidArguments(format!("'{key}' holds a non-number: {v}"))
                })
            })
            .collect(),
        Some(v) => to_f64(v)
            .map(|f| vec![f])
            .ok_or_else(|| ToolError::InvalidArguments(format!("'{key}' is not a list: {v}"))),
    }
}

pub fn string(args: &Value, key: &str) -> ToolResult<String> {
    match field(args, key)? {
        Value::String(s) => Ok(s.clone()),
        other => Ok(other.to_string()),
    }
}
