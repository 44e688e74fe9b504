//! `planloop config`: configuration management commands.

use planloop_config::AppConfig;
use std::path::Path;
use std::process::ExitCode;

pub fn show() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    println!("{}", render_redacted(&config)?);
    Ok(ExitCode::SUCCESS)
}

pub fn path() -> Result<ExitCode, Box<dyn std::error::Error>> {
    println!("{}", AppConfig::config_path().display());
    Ok(ExitCode::SUCCESS)
}

pub fn init() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let path = AppConfig::config_path();
    if write_default(&path)? {
        println!("Created {}", path.display());
        println!("Add your API key there, or export GEMINI_API_KEY.");
    } else {
        println!("Config already exists at {}", path.display());
    }
    Ok(ExitCode::SUCCESS)
}

/// Write the default config to `path` unless a file is already there.
/// Returns whether a file was written.
fn write_default(path: &Path) -> std::io::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, AppConfig::default_toml())?;
    Ok(true)
}

/// TOML with every credential and tool-host env value masked.
fn render_redacted(config: &AppConfig) -> Result<String, toml::ser::Error> {
    let mut config = config.clone();
    let mask = |key: &mut Option<String>| {
        if key.is_some() {
            *key = Some("[REDACTED]".into());
        }
    };
    mask(&mut config.api_key);
    for provider in config.providers.values_mut() {
        mask(&mut provider.api_key);
    }
    for value in config.tool_host.env.values_mut() {
        *value = "[REDACTED]".into();
    }
    toml::to_string_pretty(&config)
}
