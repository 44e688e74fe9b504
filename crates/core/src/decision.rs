//! Decision: proposes the next action as a line of protocol text.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::perception::PerceptionOutput;

/// Everything the decision collaborator sees for one step. Rebuilt from the
/// current query every step; nothing accumulates across steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepContext {
    pub user_input: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<String>>,

    /// Rendered tool block (`- name: description` lines)
    pub tool_descriptions: String,
}

impl StepContext {
    pub fn new(
        user_input: impl Into<String>,
        perception: PerceptionOutput,
        tool_descriptions: impl Into<String>,
    ) -> Self {
        Self {
            user_input: user_input.into(),
            intent: perception.intent,
            entities: perception.entities,
            tool_descriptions: tool_descriptions.into(),
        }
    }
}

/// The decision collaborator.
///
/// Returns raw protocol text which may well be malformed; classifying it is
/// the caller's job.
#[async_trait]
pub trait Decision: Send + Sync {
    async fn propose(&self, context: &StepContext) -> Result<String>;
}
