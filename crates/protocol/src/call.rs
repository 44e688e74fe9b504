//! `FUNCTION_CALL` lines: parsing and formatting.

use planloop_core::{Arguments, Value};
use serde::{Deserialize, Serialize};

use crate::ProtocolError;
use crate::literal::coerce_value;
use crate::sentinel::Sentinel;

/// A tool invocation read from a `FUNCTION_CALL` line.
///
/// The tool name is not checked against any registry here; that happens at
/// dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedCall {
    pub tool_name: String,
    pub arguments: Arguments,
}

impl ParsedCall {
    pub fn new(tool_name: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
        }
    }
}

/// Parse `FUNCTION_CALL: tool[|key=value]*`.
///
/// Each segment after the tool name splits on its first `=`; keys are opaque
/// (dotted keys stay whole). Any bad segment fails the whole call.
pub fn parse_function_call(text: &str) -> Result<ParsedCall, ProtocolError> {
    match Sentinel::split(text) {
        Some((Sentinel::FunctionCall, body)) => parse_call_body(body),
        _ => Err(ProtocolError::MissingPrefix),
    }
}

pub(crate) fn parse_call_body(body: &str) -> Result<ParsedCall, ProtocolError> {
    let mut segments = body.split('|');
    let tool_name = segments.next().unwrap_or_default().trim();
    if tool_name.is_empty() {
        return Err(ProtocolError::EmptyToolName);
    }

    let mut arguments = Arguments::new();
    for segment in segments {
        let (key, value) =
            segment
                .split_once('=')
                .ok_or_else(|| ProtocolError::MalformedArgument {
                    segment: segment.trim().to_string(),
                })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(ProtocolError::EmptyArgumentKey {
                segment: segment.trim().to_string(),
            });
        }
        arguments.insert(key.to_string(), coerce_value(value.trim()));
    }

    Ok(ParsedCall {
        tool_name: tool_name.to_string(),
        arguments,
    })
}

/// Render a call as a `FUNCTION_CALL` line that [`parse_function_call`]
/// reads back to an equal call.
///
/// Strings are written bare when they would read back unchanged, otherwise
/// quoted. Anything containing `|`, keys containing `=`, and non-finite
/// floats cannot be carried by the grammar and are rejected.
pub fn format_function_call(call: &ParsedCall) -> Result<String, ProtocolError> {
    let name = call.tool_name.as_str();
    if name.trim().is_empty() {
        return Err(ProtocolError::EmptyToolName);
    }
    if name.trim() != name || name.contains(['|', '\n', '\r']) {
        return Err(ProtocolError::Unencodable(format!("tool name '{name}'")));
    }

    let mut line = format!("{} {}", Sentinel::FunctionCall.prefix(), name);
    for (key, value) in &call.arguments {
        if key.is_empty() || key.trim() != key || key.contains(['|', '=', '\n', '\r']) {
            return Err(ProtocolError::Unencodable(format!("argument key '{key}'")));
        }
        line.push('|');
        line.push_str(key);
        line.push('=');
        line.push_str(&format_value(key, value)?);
    }
    Ok(line)
}

fn format_value(key: &str, value: &Value) -> Result<String, ProtocolError> {
    if has_non_finite(value) {
        return Err(ProtocolError::Unencodable(format!(
            "non-finite float in '{key}'"
        )));
    }
    let token = match value {
        Value::Str(s) if is_bare(s) => s.clone(),
        other => other.to_literal(),
    };
    if token.contains('|') {
        return Err(ProtocolError::Unencodable(format!("'|' in value of '{key}'")));
    }
    Ok(token)
}

/// A string can go unquoted if reading it back yields the same string.
fn is_bare(s: &str) -> bool {
    s.trim() == s && !s.contains(['|', '\n', '\r']) && coerce_value(s) == Value::Str(s.to_string())
}

fn has_non_finite(value: &Value) -> bool {
    match value {
        Value::Float(f) => !f.is_finite(),
        Value::List(items) => items.iter().any(has_non_finite),
        Value::Map(map) => map.values().any(has_non_finite),
        _ => false,
    }
}
