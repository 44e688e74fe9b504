//! `get_current_time`: local wall-clock time.

use async_trait::async_trait;
use planloop_core::error::ToolError;
use planloop_core::tool::Tool;
use planloop_core::{Arguments, Value};

pub struct CurrentTimeTool;

#[async_trait]
impl Tool for CurrentTimeTool {
    fn name(&self) -> &str {
        "get_current_time"
    }

    fn description(&self) -> &str {
        "Returns the current time in a human-readable format."
    }

    async fn execute(&self, _arguments: &Arguments) -> Result<Value, ToolError> {
        Ok(Value::Str(
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        ))
    }
}
