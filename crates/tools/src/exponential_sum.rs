//! `int_list_to_exponential_sum`: sum of e^x over a list of integers.

use async_trait::async_trait;
use planloop_core::error::ToolError;
use planloop_core::tool::Tool;
use planloop_core::{Arguments, Value};

use crate::binding::Args;

pub struct ExponentialSumTool;

#[async_trait]
impl Tool for ExponentialSumTool {
    fn name(&self) -> &str {
        "int_list_to_exponential_sum"
    }

    fn description(&self) -> &str {
        "Return the sum of e raised to each integer in a list. Arguments: input.int_list (list of integers)."
    }

    async fn execute(&self, arguments: &Arguments) -> Result<Value, ToolError> {
        let args = Args::bind(self.name(), arguments)?;
        let items = args.list("input.int_list")?;

        let mut sum = 0.0_f64;
        for (i, item) in items.iter().enumerate() {
            let n = item.as_i64().ok_or_else(|| {
                ToolError::InvalidArguments(format!(
                    "{}: input.int_list[{i}] must be an integer, got {}",
                    self.name(),
                    item.kind()
                ))
            })?;
            sum += (n as f64).exp();
        }

        if !sum.is_finite() {
            return Err(ToolError::ExecutionFailed {
                tool_name: self.name().into(),
                reason: "result is too large to represent".into(),
            });
        }
        Ok(Value::Float(sum))
    }
}
