//! End-to-end tests for the planloop pipeline.
//!
//! These drive the real collaborators (LLM perception and decision, the
//! dispatcher, and the built-in tools, both in-process and behind the JSON-RPC
//! tool host) with a scripted model in place of a network provider.

use std::sync::Arc;
use std::time::Duration;

use planloop_agent::{AgentLoop, FailureKind, LlmDecision, LlmPerception, RunOutcome};
use planloop_core::error::ProviderError;
use planloop_core::provider::{Provider, ProviderRequest, ProviderResponse};
use planloop_core::tool::ToolRegistry;
use planloop_core::Value;
use planloop_tools::{StdioRegistry, ToolHost, default_registry};
use tokio::io::BufReader;

// ── Mock Provider ────────────────────────────────────────────────────────

/// A mock provider that returns scripted responses in sequence.
struct ScriptedProvider {
    responses: Vec<String>,
    prompts: std::sync::Mutex<Vec<String>>,
}

impl ScriptedProvider {
    fn new(responses: &[&str]) -> Self {
        Self {
            responses: responses.iter().map(|r| r.to_string()).collect(),
            prompts: std::sync::Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut prompts = self.prompts.lock().unwrap();
        let count = prompts.len();
        if count >= self.responses.len() {
            panic!(
                "ScriptedProvider exhausted: call #{}, have {}",
                count,
                self.responses.len()
            );
        }
        prompts.push(request.prompt);
        Ok(ProviderResponse {
            text: self.responses[count].clone(),
            model: "mock-model".into(),
            total_tokens: Some(15),
        })
    }
}

const ARITHMETIC: &str = "{'user_intent': 'arithmetic', 'entities': ['5', '3']}";

fn agent(provider: Arc<ScriptedProvider>, registry: Arc<dyn ToolRegistry>) -> AgentLoop {
    AgentLoop::new(
        Arc::new(LlmPerception::new(provider.clone(), "mock-model")),
        Arc::new(LlmDecision::new(provider, "mock-model")),
        registry,
    )
}

/// A tool host on one end of in-memory pipes, a connected client on the other.
async fn hosted_registry() -> Arc<StdioRegistry> {
    let (client_out, host_in) = tokio::io::duplex(64 * 1024);
    let (host_out, client_in) = tokio::io::duplex(64 * 1024);

    tokio::spawn(async move {
        let host = ToolHost::new(default_registry());
        host.serve(BufReader::new(host_in), host_out).await
    });

    let registry = StdioRegistry::from_streams(client_in, client_out, Duration::from_secs(5));
    registry.initialize().await.unwrap();
    Arc::new(registry)
}

// ── Scenarios ────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_then_answer_in_process() {
    let provider = Arc::new(ScriptedProvider::new(&[
        ARITHMETIC,
        "FUNCTION_CALL: add|a=5|b=3",
        "{'user_intent': 'arithmetic_result', 'entities': ['8']}",
        "FINAL_ANSWER: [8]",
    ]));
    let report = agent(provider.clone(), Arc::new(default_registry()))
        .run("What is 5 plus 3?")
        .await;

    assert_eq!(report.outcome, RunOutcome::Final("[8]".into()));
    assert_eq!(report.steps, 2);
    assert_eq!(provider.calls(), 4);
    assert_eq!(report.tool_calls[0].result, Value::Int(8));
    assert_eq!(report.trace[1].query, "8");

    // The second decision sees the tool result as the user input
    let prompts = provider.prompts();
    assert!(prompts[3].contains("- User Input: 8"));
    assert!(prompts[1].contains("- add: "));
}

#[tokio::test]
async fn chained_tools_over_the_tool_host() {
    let provider = Arc::new(ScriptedProvider::new(&[
        "{'user_intent': 'string_to_ascii_exponential_sum', 'entities': ['INDIA']}",
        "FUNCTION_CALL: strings_to_chars_to_int|input.string=INDIA",
        "{'user_intent': 'list_processing', 'entities': None}",
        "FUNCTION_CALL: int_list_to_exponential_sum|input.int_list=[73,78,68,73,65]",
        "```json\n{\"user_intent\": \"report\", \"entities\": []}\n```",
        "FINAL_ANSWER: [done]",
    ]));
    let registry = hosted_registry().await;
    let report = agent(provider.clone(), registry.clone())
        .run("Find the ASCII values of INDIA and sum their exponentials")
        .await;

    assert_eq!(report.outcome, RunOutcome::Final("[done]".into()));
    assert_eq!(report.steps, 3);

    let codes = &report.tool_calls[0];
    assert_eq!(codes.tool_name, "strings_to_chars_to_int");
    assert_eq!(codes.arguments["input.string"], Value::from("INDIA"));
    assert_eq!(
        codes.result,
        Value::List([73, 78, 68, 73, 65].into_iter().map(Value::Int).collect())
    );
    assert_eq!(report.trace[1].query, "[73, 78, 68, 73, 65]");

    let sum = &report.tool_calls[1];
    assert!(matches!(sum.result, Value::Float(f) if f.is_finite() && f > 0.0));
    assert!(report.trace[1].entities.is_none());
}

#[tokio::test]
async fn malformed_decision_errors_at_step_one() {
    let provider = Arc::new(ScriptedProvider::new(&[ARITHMETIC, "banana"]));
    let report = agent(provider.clone(), Arc::new(default_registry()))
        .run("What is 5 plus 3?")
        .await;

    match &report.outcome {
        RunOutcome::Errored { kind, message } => {
            assert_eq!(*kind, FailureKind::MalformedProtocol);
            assert!(message.contains("banana"));
        }
        other => panic!("expected Errored, got {other:?}"),
    }
    assert_eq!(report.steps, 1);
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn budget_exhausts_after_three_steps() {
    let provider = Arc::new(ScriptedProvider::new(&[
        ARITHMETIC,
        "FUNCTION_CALL: get_current_time",
        ARITHMETIC,
        "FUNCTION_CALL: get_current_time",
        ARITHMETIC,
        "FUNCTION_CALL: get_current_time",
    ]));
    let registry = hosted_registry().await;
    let report = agent(provider.clone(), registry)
        .with_max_steps(3)
        .run("What time is it?")
        .await;

    assert_eq!(report.outcome, RunOutcome::Exhausted { steps: 3 });
    assert_eq!(report.tool_calls.len(), 3);
    assert_eq!(provider.calls(), 6);
    assert_eq!(
        report.outcome.to_string(),
        "exhausted step budget after 3 steps"
    );
}

#[tokio::test]
async fn unknown_tool_over_the_tool_host() {
    let provider = Arc::new(ScriptedProvider::new(&[
        ARITHMETIC,
        "FUNCTION_CALL: multiply|a=2|b=3",
    ]));
    let registry = hosted_registry().await;
    let report = agent(provider, registry).run("2 times 3").await;

    assert_eq!(
        report.outcome,
        RunOutcome::Errored {
            kind: FailureKind::ToolNotFound,
            message: "tool not found: multiply".into()
        }
    );
}

#[tokio::test]
async fn tool_failure_detail_reaches_the_outcome() {
    let provider = Arc::new(ScriptedProvider::new(&[ARITHMETIC, "FUNCTION_CALL: add|a=5"]));
    let registry = hosted_registry().await;
    let report = agent(provider, registry).run("5 plus what?").await;

    match &report.outcome {
        RunOutcome::Errored { kind, message } => {
            assert_eq!(*kind, FailureKind::ToolExecutionFailed);
            assert!(message.contains("missing argument 'b'"));
        }
        other => panic!("expected Errored, got {other:?}"),
    }
}

#[tokio::test]
async fn unreadable_perception_does_not_stop_the_run() {
    let provider = Arc::new(ScriptedProvider::new(&[
        "It's about arithmetic, I think.",
        "FINAL_ANSWER: [42]",
    ]));
    let report = agent(provider.clone(), Arc::new(default_registry()))
        .run("What is 6 times 7?")
        .await;

    assert_eq!(report.outcome, RunOutcome::Final("[42]".into()));
    assert!(report.trace[0].intent.is_none());
    assert!(provider.prompts()[1].contains("- User Intent: None"));
}
