//! Tool registry: the abstraction over the agent's capabilities.
//!
//! The agent never talks to tools directly. It sees a [`ToolRegistry`], which
//! may be an in-process [`LocalRegistry`] or a client for a tool-hosting
//! process on the other side of a transport.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::ToolError;
use crate::value::{Arguments, Value};

/// A tool as advertised by a registry. Identity is the name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            name: name.into(),
            description,
        }
    }

    /// Render descriptors as the tool block shown to the decision model:
    /// one `- name: description` line per tool.
    pub fn render_list(tools: &[ToolDescriptor]) -> String {
        tools
            .iter()
            .map(|t| {
                format!(
                    "- {}: {}",
                    t.name,
                    t.description.as_deref().unwrap_or("No description")
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// The outcome of one successful dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallResult {
    /// Name of the tool that ran
    pub tool_name: String,

    /// Arguments it was called with
    pub arguments: Arguments,

    /// The tool's result, uninterpreted
    pub result: Value,

    /// The decision text that produced the call
    pub raw_response: String,
}

/// Enumerates and executes tools.
///
/// Both calls may cross a process boundary and are treated as slow and
/// fallible by the agent loop.
#[async_trait]
pub trait ToolRegistry: Send + Sync {
    /// List the tools currently available.
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolError>;

    /// Invoke a tool by exact name.
    async fn invoke(&self, name: &str, arguments: &Arguments) -> Result<Value, ToolError>;
}

/// An in-process tool.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "add", "get_current_time").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// Execute the tool with the given arguments.
    async fn execute(&self, arguments: &Arguments) -> Result<Value, ToolError>;

    fn to_descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(self.name(), Some(self.description().to_string()))
    }
}

/// A registry of in-process tools.
pub struct LocalRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl LocalRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// Descriptors sorted by name, so prompts are stable across runs.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        let mut descriptors: Vec<_> = self.tools.values().map(|t| t.to_descriptor()).collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for LocalRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolRegistry for LocalRegistry {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolError> {
        Ok(self.descriptors())
    }

    async fn invoke(&self, name: &str, arguments: &Arguments) -> Result<Value, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        tool.execute(arguments).await
    }
}
