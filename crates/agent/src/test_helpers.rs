//! Scripted collaborators shared by the agent tests.

use async_trait::async_trait;
use planloop_core::decision::{Decision, StepContext};
use planloop_core::error::{Error, ProviderError, ToolError};
use planloop_core::perception::{Perception, PerceptionOutput};
use planloop_core::provider::{Provider, ProviderRequest, ProviderResponse};
use planloop_core::tool::{LocalRegistry, Tool, ToolDescriptor, ToolRegistry};
use planloop_core::{Arguments, Value};
use std::sync::Mutex;

/// A mock provider that returns a sequence of scripted responses.
///
/// Each call to `complete` returns the next response in the queue.
/// Panics if more calls are made than responses provided.
pub struct SequentialMockProvider {
    responses: Mutex<Vec<Result<ProviderResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn single_text(text: &str) -> Self {
        Self::texts(&[text])
    }

    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(make_text_response(t))).collect())
    }

    /// A provider whose only call fails with a network error.
    pub fn failing() -> Self {
        Self::new(vec![Err(ProviderError::Network("connection refused".into()))])
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        let count = requests.len();

        if count >= responses.len() {
            panic!(
                "SequentialMockProvider: no more responses (call #{}, have {})",
                count,
                responses.len()
            );
        }

        requests.push(request);
        responses[count].clone()
    }
}

pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        text: text.to_string(),
        model: "mock-model".into(),
        total_tokens: Some(15),
    }
}

/// Returns the same classification for every query and records the queries.
#[derive(Default)]
pub struct FixedPerception {
    output: PerceptionOutput,
    queries: Mutex<Vec<String>>,
}

impl FixedPerception {
    pub fn new(intent: &str) -> Self {
        Self {
            output: PerceptionOutput {
                intent: Some(intent.to_string()),
                entities: None,
            },
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Perception for FixedPerception {
    async fn classify(&self, text: &str) -> planloop_core::Result<PerceptionOutput> {
        self.queries.lock().unwrap().push(text.to_string());
        Ok(self.output.clone())
    }
}

pub struct FailingPerception;

#[async_trait]
impl Perception for FailingPerception {
    async fn classify(&self, _text: &str) -> planloop_core::Result<PerceptionOutput> {
        Err(Error::Provider(ProviderError::Timeout("perception".into())))
    }
}

/// Replays scripted decision lines. Once the script runs out the last line
/// repeats, so "always call the same tool" needs only one entry.
pub struct ScriptedDecision {
    lines: Vec<String>,
    contexts: Mutex<Vec<StepContext>>,
}

impl ScriptedDecision {
    pub fn new(lines: &[&str]) -> Self {
        assert!(!lines.is_empty(), "ScriptedDecision needs at least one line");
        Self {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            contexts: Mutex::new(Vec::new()),
        }
    }

    pub fn contexts(&self) -> Vec<StepContext> {
        self.contexts.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.contexts.lock().unwrap().len()
    }
}

#[async_trait]
impl Decision for ScriptedDecision {
    async fn propose(&self, context: &StepContext) -> planloop_core::Result<String> {
        let mut contexts = self.contexts.lock().unwrap();
        let index = contexts.len().min(self.lines.len() - 1);
        contexts.push(context.clone());
        Ok(self.lines[index].clone())
    }
}

/// Sums every integer argument.
pub struct AddTool;

#[async_trait]
impl Tool for AddTool {
    fn name(&self) -> &str {
        "add"
    }
    fn description(&self) -> &str {
        "Add two numbers"
    }
    async fn execute(&self, arguments: &Arguments) -> Result<Value, ToolError> {
        let mut sum = 0i64;
        for (key, value) in arguments {
            sum += value.as_i64().ok_or_else(|| {
                ToolError::InvalidArguments(format!("'{key}' is not an integer"))
            })?;
        }
        Ok(Value::Int(sum))
    }
}

/// Always returns the same value, whatever the arguments.
pub struct ConstTool {
    pub name: &'static str,
    pub value: Value,
}

#[async_trait]
impl Tool for ConstTool {
    fn name(&self) -> &str {
        self.name
    }
    fn description(&self) -> &str {
        "Returns a fixed value"
    }
    async fn execute(&self, _arguments: &Arguments) -> Result<Value, ToolError> {
        Ok(self.value.clone())
    }
}

/// Wraps a [`LocalRegistry`] and records every invocation.
pub struct RecordingRegistry {
    inner: LocalRegistry,
    invocations: Mutex<Vec<(String, Arguments)>>,
    fail_listing: bool,
}

impl RecordingRegistry {
    pub fn new(tools: Vec<Box<dyn Tool>>) -> Self {
        let mut inner = LocalRegistry::new();
        for tool in tools {
            inner.register(tool);
        }
        Self {
            inner,
            invocations: Mutex::new(Vec::new()),
            fail_listing: false,
        }
    }

    /// A registry whose `list_tools` fails.
    pub fn unreachable() -> Self {
        Self {
            fail_listing: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn invocations(&self) -> Vec<(String, Arguments)> {
        self.invocations.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolRegistry for RecordingRegistry {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolError> {
        if self.fail_listing {
            return Err(ToolError::Transport("tool host closed the connection".into()));
        }
        self.inner.list_tools().await
    }

    async fn invoke(&self, name: &str, arguments: &Arguments) -> Result<Value, ToolError> {
        self.invocations
            .lock()
            .unwrap()
            .push((name.to_string(), arguments.clone()));
        self.inner.invoke(name, arguments).await
    }
}
