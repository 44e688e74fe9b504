//! Headline stubs: `get_market_news` and `get_political_news`.

use async_trait::async_trait;
use planloop_core::error::ToolError;
use planloop_core::tool::Tool;
use planloop_core::{Arguments, Value};

pub struct MarketNewsTool;

#[async_trait]
impl Tool for MarketNewsTool {
    fn name(&self) -> &str {
        "get_market_news"
    }

    fn description(&self) -> &str {
        "Returns the latest market news."
    }

    async fn execute(&self, _arguments: &Arguments) -> Result<Value, ToolError> {
        Ok(Value::from(
            "The latest market news is: Stock prices are rising.",
        ))
    }
}

pub struct PoliticalNewsTool;

#[async_trait]
impl Tool for PoliticalNewsTool {
    fn name(&self) -> &str {
        "get_political_news"
    }

    fn description(&self) -> &str {
        "Returns the latest political news."
    }

    async fn execute(&self, _arguments: &Arguments) -> Result<Value, ToolError> {
        Ok(Value::from(
            "The latest political news is: Elections are coming up.",
        ))
    }
}
