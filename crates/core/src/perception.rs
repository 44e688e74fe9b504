//! Perception: classifies the intent and entities of a query.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// What the classifier extracted from a query. Either field may be missing
/// when the classifier could not produce it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerceptionOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<String>>,
}

/// The perception collaborator.
#[async_trait]
pub trait Perception: Send + Sync {
    /// Classify `text`. Errors are collaborator-boundary failures and end the run.
    async fn classify(&self, text: &str) -> Result<PerceptionOutput>;
}
