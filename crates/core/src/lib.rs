//! # planloop Core
//!
//! Domain types, collaborator traits, and error definitions for the planloop
//! agent. This crate has **no transport or framework dependencies**; it
//! defines the model that every other crate implements against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator of the agent loop is a trait here:
//! - [`Provider`]: the language-model completion call
//! - [`Perception`]: intent/entity classification
//! - [`Decision`]: proposes the next protocol line
//! - [`ToolRegistry`]: lists and invokes tools, possibly across a process boundary
//!
//! Implementations live in their respective crates, so the loop can be driven
//! by scripted collaborators in tests and by real ones in the binary.

pub mod decision;
pub mod error;
pub mod event;
pub mod perception;
pub mod provider;
pub mod tool;
pub mod value;

// Re-export key types at crate root for ergonomics
pub use decision::{Decision, StepContext};
pub use error::{Error, Result};
pub use event::{DomainEvent, EventBus};
pub use perception::{Perception, PerceptionOutput};
pub use provider::{Provider, ProviderRequest, ProviderResponse};
pub use tool::{LocalRegistry, Tool, ToolCallResult, ToolDescriptor, ToolRegistry};
pub use value::{Arguments, Value};
