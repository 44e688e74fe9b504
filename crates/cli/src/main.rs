//! planloop CLI, the main entry point.
//!
//! Commands:
//! - `run`: answer one query with the agent loop
//! - `tools`: list the tools the tool host advertises
//! - `serve-tools`: serve the built-in tools over JSON-RPC on stdio
//! - `config`: show, locate or create the config file
//!
//! Logs always go to stderr. Stdout carries only the final determination
//! (or, for `serve-tools`, only protocol messages).

use clap::{Parser, Subcommand, ValueEnum};
use std::process::ExitCode;

mod commands;

#[derive(Parser)]
#[command(
    name = "planloop",
    about = "planloop: perceive, decide, act",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log line format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the agent on one query
    Run {
        /// The query to answer
        message: String,

        /// Override the step budget
        #[arg(long)]
        max_steps: Option<usize>,

        /// Print the full run report as JSON instead of the final line
        #[arg(long)]
        json: bool,
    },

    /// List the tools the tool host advertises
    Tools,

    /// Serve the built-in tools over JSON-RPC on stdin/stdout
    ServeTools,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (secrets redacted)
    Show,
    /// Print the config file path
    Path,
    /// Write a default config file if none exists
    Init,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    match cli.log_format {
        LogFormat::Text => subscriber.init(),
        LogFormat::Json => subscriber.json().init(),
    }

    let code = match cli.command {
        Commands::Run {
            message,
            max_steps,
            json,
        } => commands::run::run(&message, max_steps, json).await?,
        Commands::Tools => commands::tools::run().await?,
        Commands::ServeTools => commands::serve_tools::run().await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show()?,
            ConfigAction::Path => commands::config_cmd::path()?,
            ConfigAction::Init => commands::config_cmd::init()?,
        },
    };

    Ok(code)
}
