//! The decision protocol: a three-form line language the model must emit.
//!
//! ```text
//! FUNCTION_CALL: <tool_name>[|<key>=<value>]*
//! FINAL_ANSWER: <free text>
//! ERROR: <free text>
//! ```
//!
//! The protocol is produced by an external generator that cannot be
//! schema-validated ahead of time, so everything here is built to reject
//! rather than guess:
//!
//! - [`DecisionOutcome::classify`] is total, so any text maps to exactly one
//!   outcome, with protocol violations reported as `Malformed`.
//! - [`parse_function_call`] never returns a partially built argument map.
//! - Argument values go through an allow-listed literal reader
//!   ([`coerce_value`]); there is no expression evaluation.
//! - Sentinel prefixes are matched in one place ([`Sentinel::split`]), shared
//!   by decision classification and tool-result inspection.

mod call;
mod literal;
mod outcome;
mod sentinel;

pub use call::{ParsedCall, format_function_call, parse_function_call};
pub use literal::{coerce_value, parse_literal};
pub use outcome::{DecisionOutcome, TerminalSignal};
pub use sentinel::Sentinel;

/// Errors from parsing or formatting protocol text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("text does not start with a recognized prefix (FUNCTION_CALL:, FINAL_ANSWER:, ERROR:)")]
    MissingPrefix,

    #[error("FUNCTION_CALL has an empty tool name")]
    EmptyToolName,

    #[error("malformed argument segment '{segment}': expected key=value")]
    MalformedArgument { segment: String },

    #[error("argument segment '{segment}' has an empty key")]
    EmptyArgumentKey { segment: String },

    #[error("cannot encode in a FUNCTION_CALL line: {0}")]
    Unencodable(String),
}
