//! `planloop tools`: list what the tool host advertises.

use planloop_config::AppConfig;
use planloop_core::tool::{ToolDescriptor, ToolRegistry};
use std::process::ExitCode;

use super::connect_tool_host;

pub async fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let registry = connect_tool_host(&config).await?;

    let listed = registry.list_tools().await;
    registry.shutdown().await;
    let tools = listed?;

    if tools.is_empty() {
        println!("No tools available.");
    } else {
        println!("{}", ToolDescriptor::render_list(&tools));
    }
    Ok(ExitCode::SUCCESS)
}
