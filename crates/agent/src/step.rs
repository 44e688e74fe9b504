//! One perceive → decide → act cycle.
//!
//! A step reads the current query and reports what happened. It never
//! touches loop state; [`AgentLoop`](crate::AgentLoop) applies the report
//! once the step has returned.

use planloop_core::decision::{Decision, StepContext};
use planloop_core::error::{Result, ToolError};
use planloop_core::perception::{Perception, PerceptionOutput};
use planloop_core::tool::{ToolCallResult, ToolDescriptor};
use planloop_protocol::{DecisionOutcome, TerminalSignal};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

use crate::dispatcher::Dispatcher;

/// Why a run ended in the errored state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// An `ERROR:` line, from the decision or at the head of a tool result
    Declared,
    MalformedProtocol,
    ToolNotFound,
    ToolExecutionFailed,
    /// Perception, decision or the registry itself failed
    Collaborator,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureKind::Declared => "declared",
            FailureKind::MalformedProtocol => "malformed_protocol",
            FailureKind::ToolNotFound => "tool_not_found",
            FailureKind::ToolExecutionFailed => "tool_execution_failed",
            FailureKind::Collaborator => "collaborator",
        })
    }
}

/// Where a step leaves the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Keep going with the tool's stringified result as the next query
    Continue { next_query: String },
    Final(String),
    Errored { kind: FailureKind, message: String },
}

/// Everything one step observed.
#[derive(Debug, Clone)]
pub struct StepReport {
    pub perception: PerceptionOutput,

    /// Raw decision text as returned by the collaborator
    pub decision: String,

    pub outcome: StepOutcome,

    /// Present when a tool ran successfully
    pub call: Option<ToolCallResult>,
}

pub struct PlanningStep<'a> {
    perception: &'a dyn Perception,
    decision: &'a dyn Decision,
    dispatcher: &'a Dispatcher,
}

impl<'a> PlanningStep<'a> {
    pub fn new(
        perception: &'a dyn Perception,
        decision: &'a dyn Decision,
        dispatcher: &'a Dispatcher,
    ) -> Self {
        Self {
            perception,
            decision,
            dispatcher,
        }
    }

    /// Run one step against `query`.
    ///
    /// `Err` means a collaborator failed before the step could resolve.
    /// Protocol violations and tool failures are reported in the outcome.
    pub async fn run(
        &self,
        query: &str,
        snapshot: &[ToolDescriptor],
        tool_descriptions: &str,
    ) -> Result<StepReport> {
        let perception = self.perception.classify(query).await?;
        debug!(intent = ?perception.intent, entities = ?perception.entities, "Perceived");

        let context = StepContext::new(query, perception.clone(), tool_descriptions);
        let decision = self.decision.propose(&context).await?;
        info!(decision = %decision, "Decision");

        let mut call = None;
        let outcome = match DecisionOutcome::classify(&decision) {
            DecisionOutcome::FinalAnswer(answer) => StepOutcome::Final(answer),
            DecisionOutcome::Error(message) => StepOutcome::Errored {
                kind: FailureKind::Declared,
                message,
            },
            DecisionOutcome::Malformed { raw, reason } => {
                warn!(reason = %reason, "Decision violates the protocol");
                StepOutcome::Errored {
                    kind: FailureKind::MalformedProtocol,
                    message: format!("malformed decision ({reason}): {raw}"),
                }
            }
            DecisionOutcome::FunctionCall(parsed) => {
                match self.dispatcher.execute(parsed, snapshot, &decision).await {
                    Ok(result) => {
                        let text = result.result.to_string();
                        info!(tool = %result.tool_name, result = %text, "Tool result");
                        call = Some(result);
                        inspect_result(text)
                    }
                    Err(ToolError::NotFound(name)) => StepOutcome::Errored {
                        kind: FailureKind::ToolNotFound,
                        message: format!("tool not found: {name}"),
                    },
                    Err(e) => StepOutcome::Errored {
                        kind: FailureKind::ToolExecutionFailed,
                        message: e.to_string(),
                    },
                }
            }
        };

        Ok(StepReport {
            perception,
            decision,
            outcome,
            call,
        })
    }
}

/// A tool result that opens with a terminal sentinel ends the run.
fn inspect_result(text: String) -> StepOutcome {
    match TerminalSignal::from_result(&text) {
        Some(TerminalSignal::FinalAnswer(answer)) => StepOutcome::Final(answer),
        Some(TerminalSignal::Error(message)) => StepOutcome::Errored {
            kind: FailureKind::Declared,
            message,
        },
        None => StepOutcome::Continue { next_query: text },
    }
}
