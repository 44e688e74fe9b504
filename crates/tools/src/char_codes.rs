//! `strings_to_chars_to_int`: character codes of a string.

use async_trait::async_trait;
use planloop_core::error::ToolError;
use planloop_core::tool::Tool;
use planloop_core::{Arguments, Value};

use crate::binding::Args;

pub struct CharCodesTool;

#[async_trait]
impl Tool for CharCodesTool {
    fn name(&self) -> &str {
        "strings_to_chars_to_int"
    }

    fn description(&self) -> &str {
        "Return the Unicode code point of each character in a string. Arguments: input.string (string)."
    }

    async fn execute(&self, arguments: &Arguments) -> Result<Value, ToolError> {
        let args = Args::bind(self.name(), arguments)?;
        let text = args.text("input.string")?;
        Ok(Value::List(
            text.chars().map(|c| Value::Int(i64::from(u32::from(c)))).collect(),
        ))
    }
}
