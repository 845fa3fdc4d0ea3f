use crate::tools::{Tool, ToolError, ToolResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use super::args;

pub fn add(a: f64, b: f64) -> f64 {
    a + b
}

pub fn subtract(a: f64, b: f64) -> f64 {
    a - b
}

pub fn multiply(a: f64, b: f64) -> f64 {
    a * b
}

pub fn divide(a: f64, b: f64) -> ToolResult<f64> {
    if b == 0.0 {
        return Err(ToolError::Domain("Division by zero".into()));
    }
    Ok(a / b)
}

pub fn power(base: f64, exponent: f64) -> f64 {
    base.powf(exponent)
}

pub fn square_root(number: f64) -> ToolResult<f64> {
    if number < 0.0 {
        return Err(ToolError::Domain(
            "Cannot calculate square root of negative number".into(),
        ));
    }
    Ok(number.sqrt())
}

/// `n!` for `0 <= n <= 20`; larger inputs overflow `u64` and fail.
pub fn factorial(n: i64) -> ToolResult<u64> {
    if n < 0 {
        return Err(ToolError::Domain(
            "Cannot calculate factorial of negative number".into(),
        ));
    }
    (2..=n as u64).try_fold(1u64, |acc, k| {
        acc.checked_mul(k)
            .ok_or_else(|| ToolError::Domain(format!("Factorial of {n} overflows u64")))
    })
}

pub fn min(numbers: &[f64]) -> ToolResult<f64> {
    numbers
        .iter()
        .copied()
        .reduce(f64::min)
        .ok_or_else(|| ToolError::Domain("Empty array".into()))
}

pub fn max(numbers: &[f64]) -> ToolResult<f64> {
    numbers
        .iter()
        .copied()
        .reduce(f64::max)
        .ok_or_else(|| ToolError::Domain("Empty array".into()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    SquareRoot,
    Factorial,
    Min,
    Max,
}

impl MathOp {
    pub const ALL: [MathOp; 9] = [
        MathOp::Add,
        MathOp::Subtract,
        MathOp::Multiply,
        MathOp::Divide,
        MathOp::Power,
        MathOp::SquareRoot,
        MathOp::Factorial,
        MathOp::Min,
        MathOp::Max,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MathOp::Add => "add",
            MathOp::Subtract => "subtract",
            MathOp::Multiply => "multiply",
            MathOp::Divide => "divide",
            MathOp::Power => "power",
            MathOp::SquareRoot => "squareRoot",
            MathOp::Factorial => "factorial",
            MathOp::Min => "min",
            MathOp::Max => "max",
        }
    }

    fn description(self) -> &'static str {
        match self {
            MathOp::Add => "Adds two numbers",
            MathOp::Subtract => "Subtracts second number from first number",
            MathOp::Multiply => "Multiplies two numbers",
            MathOp::Divide => "Divides first number by second number",
            MathOp::Power => "Raises base number to the given exponent",
            MathOp::SquareRoot => "Calculates square root of a number",
            MathOp::Factorial => "Calculates factorial of a non-negative integer",
            MathOp::Min => "Finds minimum value among given numbers",
            MathOp::Max => "Finds maximum value among given numbers",
        }
    }

    fn parameters(self) -> Value {
        let num = |d: &str| json!({"type": "number", "description": d});
        match self {
            MathOp::Add | MathOp::Subtract | MathOp::Multiply | MathOp::Divide => json!({
                "type": "object",
                "properties": {"a": num("First operand"), "b": num("Second operand")},
                "required": ["a", "b"]
            }),
            MathOp::Power => json!({
                "type": "object",
                "properties": {"base": num("Base"), "exponent": num("Exponent")},
                "required": ["base", "exponent"]
            }),
            MathOp::SquareRoot => json!({
                "type": "object",
                "properties": {"number": num("Non-negative number")},
                "required": ["number"]
            }),
            MathOp::Factorial => json!({
                "type": "object",
                "properties": {"n": {"type": "integer", "description": "Non-negative integer"}},
                "required": ["n"]
            }),
            MathOp::Min | MathOp::Max => json!({
                "type": "object",
                "properties": {
                    "numbers": {"type": "array", "items": {"type": "number"}, "description": "Numbers to compare"}
                },
                "required": ["numbers"]
            }),
        }
    }

    /// Coerce arguments and evaluate
    pub fn apply(self, arguments: &Value) -> ToolResult<Value> {
        let binary = |f: fn(f64, f64) -> f64| -> ToolResult<f64> {
            Ok(f(args::number(arguments, "a")?, args::number(arguments, "b")?))
        };
        let result = match self {
            MathOp::Add => binary(add)?,
            MathOp::Subtract => binary(subtract)?,
            MathOp::Multiply => binary(multiply)?,
            MathOp::Divide => divide(args::number(arguments, "a")?, args::number(arguments, "b")?)?,
            MathOp::Power => power(
                args::number(arguments, "base")?,
                args::number(arguments, "exponent")?,
            ),
            MathOp::SquareRoot => square_root(args::number(arguments, "number")?)?,
            MathOp::Factorial => {
                let n = args::integer(arguments, "n")?;
                let r = factorial(n)?;
                debug!(target: "math_tools", "Factorial operation: {}! = {}", n, r);
                return Ok(json!(r));
            }
            MathOp::Min => min(&args::numbers(arguments, "numbers")?)?,
            MathOp::Max => max(&args::numbers(arguments, "numbers")?)?,
        };
        if !result.is_finite() {
            return Err(ToolError::Domain(format!(
                "{} produced a non-finite result",
                self.name()
            )));
        }
        debug!(target: "math_tools", op = self.name(), result, "Math operation");
        Ok(json!(result))
    }
}

/// One arithmetic operation exposed as a tool
pub struct MathTool {
    op: MathOp,
}

impl MathTool {
    pub fn new(op: MathOp) -> Self {
        Self { op }
    }
}

#[async_trait]
impl Tool for MathTool {
    fn name(&self) -> String {
        self.op.name().to_string()
    }

    fn description(&self) -> String {
        self.op.description().to_string()
    }

    fn parameters(&self) -> Value {
        self.op.parameters()
    }

    async fn call(&self, arguments: Value) -> ToolResult<Value> {
        self.op.apply(&arguments)
    }
}

/// Every arithmetic tool, one per operation
pub fn math_tools() -> Vec<Arc<dyn Tool>> {
    MathOp::ALL
        .into_iter()
        .map(|op| Arc::new(MathTool::new(op)) as Arc<dyn Tool>)
        .collect()
}
