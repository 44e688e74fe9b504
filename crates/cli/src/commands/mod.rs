pub mod config_cmd;
pub mod run;
pub mod serve_tools;
pub mod tools;

use planloop_config::AppConfig;
use planloop_tools::StdioRegistry;
use std::time::Duration;

/// Start the configured tool host, or this binary's own `serve-tools` when
/// none is configured, and complete the handshake.
pub async fn connect_tool_host(
    config: &AppConfig,
) -> Result<StdioRegistry, Box<dyn std::error::Error>> {
    let (command, args) = tool_host_command(config)?;
    let timeout = Duration::from_secs(config.tool_host.timeout_secs);

    let registry = StdioRegistry::spawn(&command, &args, &config.tool_host.env, timeout)
        .await
        .map_err(|e| format!("Failed to start tool host: {e}"))?;
    Ok(registry)
}

fn tool_host_command(
    config: &AppConfig,
) -> Result<(String, Vec<String>), Box<dyn std::error::Error>> {
    match &config.tool_host.command {
        Some(command) => Ok((command.clone(), config.tool_host.args.clone())),
        None => {
            let exe = std::env::current_exe()?;
            Ok((
                exe.to_string_lossy().into_owned(),
                vec!["serve-tools".to_string()],
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_command_wins() {
        let mut config = AppConfig::default();
        config.tool_host.command = Some("python".into());
        config.tool_host.args = vec!["tools.py".into()];

        let (command, args) = tool_host_command(&config).unwrap();
        assert_eq!(command, "python");
        assert_eq!(args, vec!["tools.py"]);
    }

    #[test]
    fn falls_back_to_self_hosting() {
        let (_, args) = tool_host_command(&AppConfig::default()).unwrap();
        assert_eq!(args, vec!["serve-tools"]);
    }
}
