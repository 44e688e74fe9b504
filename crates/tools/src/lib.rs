//! Tools for planloop.
//!
//! Built-in tools run in-process behind a [`LocalRegistry`]. The agent
//! normally reaches them through a tool host process: [`host::ToolHost`]
//! serves a registry over JSON-RPC on stdio, and [`stdio::StdioRegistry`] is
//! the client side, implementing `ToolRegistry` for the agent loop.

pub mod add;
pub mod binding;
pub mod char_codes;
pub mod current_time;
pub mod exponential_sum;
pub mod host;
pub mod news;
pub mod restaurants;
pub mod rpc;
pub mod stdio;
pub mod weather;

use planloop_core::tool::LocalRegistry;

pub use host::ToolHost;
pub use stdio::StdioRegistry;

/// Create a registry with all built-in tools.
pub fn default_registry() -> LocalRegistry {
    let mut registry = LocalRegistry::new();
    registry.register(Box::new(add::AddTool));
    registry.register(Box::new(char_codes::CharCodesTool));
    registry.register(Box::new(exponential_sum::ExponentialSumTool));
    registry.register(Box::new(current_time::CurrentTimeTool));
    registry.register(Box::new(weather::WeatherTool));
    registry.register(Box::new(restaurants::RestaurantsTool));
    registry.register(Box::new(news::MarketNewsTool));
    registry.register(Box::new(news::PoliticalNewsTool));
    registry
}
