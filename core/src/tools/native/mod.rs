pub mod args;
pub mod math;
pub mod text;

pub use math::{math_tools, MathOp, MathTool};
pub use text::ToUpperCaseTool;
