//! Classification of decision text and tool results.

use serde::{Deserialize, Serialize};

use crate::call::{ParsedCall, parse_call_body};
use crate::sentinel::Sentinel;

/// What a decision collaborator asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DecisionOutcome {
    FunctionCall(ParsedCall),
    FinalAnswer(String),
    Error(String),
    /// Text that violates the protocol. `raw` is the trimmed input.
    Malformed { raw: String, reason: String },
}

impl DecisionOutcome {
    /// Classify arbitrary text. Never fails.
    pub fn classify(text: &str) -> Self {
        let Some((sentinel, payload)) = Sentinel::split(text) else {
            return DecisionOutcome::Malformed {
                raw: text.trim().to_string(),
                reason: crate::ProtocolError::MissingPrefix.to_string(),
            };
        };

        match sentinel {
            Sentinel::FinalAnswer => DecisionOutcome::FinalAnswer(payload.to_string()),
            Sentinel::Error => DecisionOutcome::Error(payload.to_string()),
            Sentinel::FunctionCall => match parse_call_body(payload) {
                Ok(call) => DecisionOutcome::FunctionCall(call),
                Err(e) => {
                    tracing::debug!(error = %e, "FUNCTION_CALL body rejected");
                    DecisionOutcome::Malformed {
                        raw: text.trim().to_string(),
                        reason: e.to_string(),
                    }
                }
            },
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DecisionOutcome::FunctionCall(_) => "function_call",
            DecisionOutcome::FinalAnswer(_) => "final_answer",
            DecisionOutcome::Error(_) => "error",
            DecisionOutcome::Malformed { .. } => "malformed",
        }
    }
}

/// A terminal sentinel found at the start of a tool result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalSignal {
    FinalAnswer(String),
    Error(String),
}

impl TerminalSignal {
    /// `Some` when `text` starts with `FINAL_ANSWER:` or `ERROR:`.
    /// A result that looks like a `FUNCTION_CALL` is not a signal.
    pub fn from_result(text: &str) -> Option<Self> {
        match Sentinel::split(text)? {
            (Sentinel::FinalAnswer, payload) => Some(TerminalSignal::FinalAnswer(payload.to_string())),
            (Sentinel::Error, payload) => Some(TerminalSignal::Error(payload.to_string())),
            (Sentinel::FunctionCall, _) => None,
        }
    }
}
