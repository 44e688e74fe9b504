//! The agent loop: a bounded sequence of planning steps over one query.

use chrono::Utc;
use planloop_core::decision::Decision;
use planloop_core::event::{DomainEvent, EventBus};
use planloop_core::perception::Perception;
use planloop_core::tool::{ToolCallResult, ToolDescriptor, ToolRegistry};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::dispatcher::Dispatcher;
use crate::step::{FailureKind, PlanningStep, StepOutcome, StepReport};

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum RunOutcome {
    Final(String),
    Errored { kind: FailureKind, message: String },
    /// The step budget ran out before a final answer or an error.
    Exhausted { steps: usize },
}

impl RunOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            RunOutcome::Final(_) => "final",
            RunOutcome::Errored { .. } => "errored",
            RunOutcome::Exhausted { .. } => "exhausted",
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Final(answer) => write!(f, "FINAL_ANSWER: {answer}"),
            RunOutcome::Errored { message, .. } => write!(f, "ERROR: {message}"),
            RunOutcome::Exhausted { steps } => {
                write!(f, "exhausted step budget after {steps} steps")
            }
        }
    }
}

/// One line of the run trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// 1-based
    pub step: usize,
    pub query: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<String>>,

    pub decision: String,

    /// The tool's stringified result, or why dispatch failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation: Option<String>,
}

impl StepRecord {
    fn from_report(step: usize, query: &str, report: &StepReport) -> Self {
        let observation = match (&report.call, &report.outcome) {
            (Some(call), _) => Some(call.result.to_string()),
            (
                None,
                StepOutcome::Errored {
                    kind: FailureKind::ToolNotFound | FailureKind::ToolExecutionFailed,
                    message,
                },
            ) => Some(message.clone()),
            _ => None,
        };
        Self {
            step,
            query: query.to_string(),
            intent: report.perception.intent.clone(),
            entities: report.perception.entities.clone(),
            decision: report.decision.clone(),
            observation,
        }
    }
}

/// The result of [`AgentLoop::run`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub outcome: RunOutcome,

    /// Steps started, including one cut short by a collaborator failure
    pub steps: usize,

    pub trace: Vec<StepRecord>,
    pub tool_calls: Vec<ToolCallResult>,
}

impl RunReport {
    /// A run that could not begin because a collaborator was unavailable.
    pub fn unstarted(message: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            outcome: RunOutcome::Errored {
                kind: FailureKind::Collaborator,
                message: message.into(),
            },
            steps: 0,
            trace: Vec::new(),
            tool_calls: Vec::new(),
        }
    }
}

/// Per-run state, owned by a single [`AgentLoop::run`] call. It changes only
/// between steps, never while one is in flight.
struct LoopState {
    step: usize,
    query: String,
    terminal: Option<RunOutcome>,
}

impl LoopState {
    fn new(user_input: &str) -> Self {
        Self {
            step: 0,
            query: user_input.to_string(),
            terminal: None,
        }
    }

    fn is_running(&self, max_steps: usize) -> bool {
        self.terminal.is_none() && self.step < max_steps
    }

    fn advance(&mut self, outcome: StepOutcome) {
        self.step += 1;
        match outcome {
            StepOutcome::Continue { next_query } => self.query = next_query,
            StepOutcome::Final(answer) => self.terminal = Some(RunOutcome::Final(answer)),
            StepOutcome::Errored { kind, message } => {
                self.terminal = Some(RunOutcome::Errored { kind, message })
            }
        }
    }

    fn abort(&mut self, message: String) {
        self.step += 1;
        self.terminal = Some(RunOutcome::Errored {
            kind: FailureKind::Collaborator,
            message,
        });
    }

    fn into_outcome(self) -> RunOutcome {
        let steps = self.step;
        self.terminal.unwrap_or(RunOutcome::Exhausted { steps })
    }
}

/// Drives planning steps until a final answer, an error, or the step budget.
///
/// Collaborators are injected once and shared read-only across runs; each
/// call to [`run`](Self::run) gets its own state and registry snapshot.
pub struct AgentLoop {
    perception: Arc<dyn Perception>,
    decision: Arc<dyn Decision>,
    registry: Arc<dyn ToolRegistry>,

    /// Maximum planning steps per run
    max_steps: usize,

    event_bus: Arc<EventBus>,
}

impl AgentLoop {
    pub fn new(
        perception: Arc<dyn Perception>,
        decision: Arc<dyn Decision>,
        registry: Arc<dyn ToolRegistry>,
    ) -> Self {
        Self {
            perception,
            decision,
            registry,
            max_steps: 3,
            event_bus: Arc::new(EventBus::default()),
        }
    }

    /// Set the step budget. Values below 1 are raised to 1.
    pub fn with_max_steps(mut self, max: usize) -> Self {
        self.max_steps = max.max(1);
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = event_bus;
        self
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Run one query to a terminal state. Never fails: every failure is
    /// reported in the outcome.
    pub async fn run(&self, user_input: &str) -> RunReport {
        let run_id = Uuid::new_v4().to_string();
        let mut state = LoopState::new(user_input);
        let mut trace = Vec::new();
        let mut tool_calls = Vec::new();

        info!(run_id = %run_id, input = %user_input, max_steps = self.max_steps, "Starting run");

        match self.registry.list_tools().await {
            Ok(snapshot) => {
                self.event_bus.publish(DomainEvent::RunStarted {
                    run_id: run_id.clone(),
                    tool_count: snapshot.len(),
                    max_steps: self.max_steps,
                    timestamp: Utc::now(),
                });
                self.drive(&run_id, &snapshot, &mut state, &mut trace, &mut tool_calls)
                    .await;
            }
            Err(e) => {
                warn!(run_id = %run_id, error = %e, "Could not list tools");
                state.terminal = Some(RunOutcome::Errored {
                    kind: FailureKind::Collaborator,
                    message: format!("failed to list tools: {e}"),
                });
            }
        }

        let steps = state.step;
        let outcome = state.into_outcome();
        info!(run_id = %run_id, status = outcome.status(), steps, "Run finished");
        self.event_bus.publish(DomainEvent::RunFinished {
            run_id: run_id.clone(),
            status: outcome.status().to_string(),
            steps,
            timestamp: Utc::now(),
        });

        RunReport {
            run_id,
            outcome,
            steps,
            trace,
            tool_calls,
        }
    }

    async fn drive(
        &self,
        run_id: &str,
        snapshot: &[ToolDescriptor],
        state: &mut LoopState,
        trace: &mut Vec<StepRecord>,
        tool_calls: &mut Vec<ToolCallResult>,
    ) {
        let tool_descriptions = ToolDescriptor::render_list(snapshot);
        let dispatcher = Dispatcher::new(self.registry.clone()).with_event_bus(self.event_bus.clone());
        let step = PlanningStep::new(self.perception.as_ref(), self.decision.as_ref(), &dispatcher);

        while state.is_running(self.max_steps) {
            let number = state.step + 1;
            info!(run_id, step = number, query = %state.query, "Step");

            let report = match step.run(&state.query, snapshot, &tool_descriptions).await {
                Ok(report) => report,
                Err(e) => {
                    warn!(run_id, step = number, error = %e, "Collaborator failed");
                    state.abort(e.to_string());
                    break;
                }
            };

            trace.push(StepRecord::from_report(number, &state.query, &report));
            self.event_bus.publish(DomainEvent::StepCompleted {
                run_id: run_id.to_string(),
                step: number,
                decision: report.decision.clone(),
                timestamp: Utc::now(),
            });

            if let Some(call) = report.call {
                tool_calls.push(call);
            }
            state.advance(report.outcome);
        }
    }
}
