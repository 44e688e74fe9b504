//! `planloop serve-tools`: the built-in tool host.

use planloop_tools::{ToolHost, default_registry};
use std::process::ExitCode;
use tokio::io::BufReader;

pub async fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let host = ToolHost::new(default_registry());
    host.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;
    Ok(ExitCode::SUCCESS)
}
