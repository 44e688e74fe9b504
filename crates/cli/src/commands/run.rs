//! `planloop run`: answer one query.

use planloop_agent::{AgentLoop, LlmDecision, LlmPerception, RunOutcome, RunReport};
use planloop_config::AppConfig;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::error;

use super::connect_tool_host;

pub async fn run(
    message: &str,
    max_steps: Option<usize>,
    json: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    // Check for a credential early so the error is clear
    if !credential_available(&config) {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    export GEMINI_API_KEY=...       (default provider)");
        eprintln!("    export OPENROUTER_API_KEY=...   (with PLANLOOP_PROVIDER=openrouter)");
        eprintln!("    export PLANLOOP_API_KEY=...     (generic)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_path().display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    // Build provider from config
    let router = planloop_providers::build_from_config(&config);
    let provider = router.default().ok_or("No default provider configured")?;
    let model = planloop_providers::model_for(&config, &config.default_provider);

    let perception = LlmPerception::new(provider.clone(), &model)
        .with_temperature(config.default_temperature)
        .with_max_tokens(config.default_max_tokens);
    let decision = LlmDecision::new(provider, &model)
        .with_temperature(config.default_temperature)
        .with_max_tokens(config.default_max_tokens);

    let report = match connect_tool_host(&config).await {
        Ok(registry) => {
            let registry = Arc::new(registry);
            let agent = AgentLoop::new(Arc::new(perception), Arc::new(decision), registry.clone())
                .with_max_steps(max_steps.unwrap_or(config.agent.max_steps));

            let report = agent.run(message).await;
            registry.shutdown().await;
            report
        }
        Err(e) => {
            error!(error = %e, "Tool host unavailable");
            RunReport::unstarted(e.to_string())
        }
    };

    eprint!("{}", render_trace(&report));
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.outcome);
    }

    Ok(exit_code(&report.outcome))
}

/// Local servers need no key.
fn credential_available(config: &AppConfig) -> bool {
    config.has_api_key()
        || config.default_provider == "ollama"
        || config
            .providers
            .get(&config.default_provider)
            .is_some_and(|p| p.api_key.is_some())
}

/// 0 final, 1 errored, 2 exhausted.
pub fn exit_code(outcome: &RunOutcome) -> ExitCode {
    match outcome {
        RunOutcome::Final(_) => ExitCode::SUCCESS,
        RunOutcome::Errored { .. } => ExitCode::from(1),
        RunOutcome::Exhausted { .. } => ExitCode::from(2),
    }
}

/// The step-by-step trace printed to stderr after a run.
pub fn render_trace(report: &RunReport) -> String {
    let mut out = String::new();
    for record in &report.trace {
        out.push_str(&format!("  [step {}] query:    {}\n", record.step, record.query));
        if let Some(intent) = &record.intent {
            out.push_str(&format!("           intent:   {intent}\n"));
        }
        if let Some(entities) = &record.entities {
            out.push_str(&format!("           entities: {}\n", entities.join(", ")));
        }
        out.push_str(&format!("           decision: {}\n", record.decision));
        if let Some(observation) = &record.observation {
            out.push_str(&format!("           result:   {observation}\n"));
        }
    }
    out.push_str(&format!(
        "  [{}] after {} step(s)\n",
        report.outcome.status(),
        report.steps
    ));
    out
}
