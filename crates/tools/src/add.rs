//! `add`: sum of two numbers.
//!
//! Integer inputs give an integer result; any float input makes the result a
//! float.

use async_trait::async_trait;
use planloop_core::error::ToolError;
use planloop_core::tool::Tool;
use planloop_core::{Arguments, Value};

use crate::binding::Args;

pub struct AddTool;

#[async_trait]
impl Tool for AddTool {
    fn name(&self) -> &str {
        "add"
    }

    fn description(&self) -> &str {
        "Add two numbers. Arguments: a (number), b (number)."
    }

    async fn execute(&self, arguments: &Arguments) -> Result<Value, ToolError> {
        let args = Args::bind(self.name(), arguments)?;

        if let (Some(Value::Int(a)), Some(Value::Int(b))) = (args.get("a"), args.get("b")) {
            return a
                .checked_add(*b)
                .map(Value::Int)
                .ok_or_else(|| ToolError::ExecutionFailed {
                    tool_name: self.name().into(),
                    reason: format!("{a} + {b} overflows"),
                });
        }

        Ok(Value::Float(args.f64("a")? + args.f64("b")?))
    }
}
