//! Argument binding for in-process tools.
//!
//! Call arguments arrive flat: `input.string=INDIA` is one key named
//! `input.string`. Tools read them through [`Args`], which sees the nested
//! form `{input: {string: INDIA}}`.

use planloop_core::error::ToolError;
use planloop_core::{Arguments, Value};
use std::collections::BTreeMap;

/// Expand dotted keys into nested maps.
///
/// Two keys that claim the same slot (`input=1` and `input.string=x`) are an
/// error rather than one silently winning.
pub fn nest(arguments: &Arguments) -> Result<Arguments, ToolError> {
    let mut root = Arguments::new();
    for (key, value) in arguments {
        let segments: Vec<&str> = key.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(ToolError::InvalidArguments(format!(
                "invalid argument path '{key}'"
            )));
        }
        insert_path(&mut root, &segments, value.clone(), key)?;
    }
    Ok(root)
}

fn insert_path(
    map: &mut Arguments,
    segments: &[&str],
    value: Value,
    full_key: &str,
) -> Result<(), ToolError> {
    let conflict = || ToolError::InvalidArguments(format!("argument '{full_key}' conflicts with another argument"));

    let Some((head, rest)) = segments.split_first() else {
        return Err(conflict());
    };

    if rest.is_empty() {
        if map.contains_key(*head) {
            return Err(conflict());
        }
        map.insert(head.to_string(), value);
        return Ok(());
    }

    let child = map
        .entry(head.to_string())
        .or_insert_with(|| Value::Map(BTreeMap::new()));
    match child {
        Value::Map(inner) => insert_path(inner, rest, value, full_key),
        _ => Err(conflict()),
    }
}

/// Typed, path-addressed view over a tool's arguments.
pub struct Args<'a> {
    tool: &'a str,
    nested: Arguments,
}

impl<'a> Args<'a> {
    pub fn bind(tool: &'a str, arguments: &Arguments) -> Result<Self, ToolError> {
        Ok(Self {
            tool,
            nested: nest(arguments)?,
        })
    }

    /// Look up a dotted path.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.nested.get(segments.next()?)?;
        for segment in segments {
            current = current.as_map()?.get(segment)?;
        }
        Some(current)
    }

    fn required(&self, path: &str) -> Result<&Value, ToolError> {
        self.get(path).ok_or_else(|| {
            ToolError::InvalidArguments(format!("{}: missing argument '{path}'", self.tool))
        })
    }

    fn mismatch(&self, path: &str, expected: &str, got: &Value) -> ToolError {
        ToolError::InvalidArguments(format!(
            "{}: argument '{path}' must be {expected}, got {}",
            self.tool,
            got.kind()
        ))
    }

    /// A scalar as text. Numbers and booleans are accepted, so `location=10001`
    /// still reads as "10001".
    pub fn text(&self, path: &str) -> Result<String, ToolError> {
        match self.required(path)? {
            Value::Str(s) => Ok(s.clone()),
            v @ (Value::Int(_) | Value::Float(_) | Value::Bool(_)) => Ok(v.to_string()),
            other => Err(self.mismatch(path, "a string", other)),
        }
    }

    pub fn i64(&self, path: &str) -> Result<i64, ToolError> {
        let value = self.required(path)?;
        value
            .as_i64()
            .ok_or_else(|| self.mismatch(path, "an integer", value))
    }

    pub fn f64(&self, path: &str) -> Result<f64, ToolError> {
        let value = self.required(path)?;
        value
            .as_f64()
            .ok_or_else(|| self.mismatch(path, "a number", value))
    }

    pub fn list(&self, path: &str) -> Result<&[Value], ToolError> {
        let value = self.required(path)?;
        value
            .as_list()
            .ok_or_else(|| self.mismatch(path, "a list", value))
    }
}
