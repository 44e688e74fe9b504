//! Tool argument and result values.
//!
//! A closed, tagged union instead of an open "anything" type: tool arguments
//! arrive as untrusted model text and are only ever turned into one of these
//! variants by an allow-listed literal reader.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Argument mapping passed to a tool. Keys are opaque strings (dotted keys
/// such as `input.string` are not split here).
pub type Arguments = BTreeMap<String, Value>;

/// A tool argument or result value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Borrow the inner string, if this is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Read an integer; floats with no fractional part are accepted too.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive
            Value::Float(f) if f.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(f) => {
                Some(*f as i64)
            }
            _ => None,
        }
    }

    /// Read any numeric value as a float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// A short name for the variant, used in argument error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "mapping",
        }
    }

    /// Render in the literal form the decision protocol reads back:
    /// quoted strings, `[a, b]` lists, `{'k': v}` maps, and floats that
    /// always carry a decimal point or exponent.
    pub fn to_literal(&self) -> String {
        let mut out = String::new();
        self.write_literal(&mut out);
        out
    }

    fn write_literal(&self, out: &mut String) {
        match self {
            Value::Bool(true) => out.push_str("true"),
            Value::Bool(false) => out.push_str("false"),
            Value::Int(n) => out.push_str(&n.to_string()),
            // Debug keeps the trailing `.0` so the value reads back as a float.
            Value::Float(f) => out.push_str(&format!("{f:?}")),
            Value::Str(s) => write_quoted(s, out),
            Value::List(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.write_literal(out);
                }
                out.push(']');
            }
            Value::Map(map) => {
                out.push('{');
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    write_quoted(key, out);
                    out.push_str(": ");
                    value.write_literal(out);
                }
                out.push('}');
            }
        }
    }

    /// Convert to a JSON value for the tool-host wire format.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(n) => serde_json::Value::from(*n),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

fn write_quoted(s: &str, out: &mut String) {
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('\'');
}

/// Strings display raw; every other variant displays in literal form.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            other => f.write_str(&other.to_literal()),
        }
    }
}

/// JSON `null` has no counterpart and becomes an empty string.
impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Str(String::new()),
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_form_quotes_nested_strings() {
        let value = Value::List(vec![Value::Int(1), Value::from("a'b"), Value::Float(2.0)]);
        assert_eq!(value.to_literal(), r"[1, 'a\'b', 2.0]");
    }

    #[test]
    fn display_keeps_top_level_strings_raw() {
        assert_eq!(Value::from("hello world").to_string(), "hello world");
        assert_eq!(Value::Int(42).to_string(), "42");
        let map = Value::Map(BTreeMap::from([("k".to_string(), Value::from("v"))]));
        assert_eq!(map.to_string(), "{'k': 'v'}");
    }

    #[test]
    fn json_conversion_preserves_numeric_kinds() {
        let json = serde_json::json!({"a": 5, "b": 2.5, "c": [true, "x"], "d": null});
        let value = Value::from(json);
        let map = value.as_map().unwrap();
        assert_eq!(map["a"], Value::Int(5));
        assert_eq!(map["b"], Value::Float(2.5));
        assert_eq!(map["c"], Value::List(vec![Value::Bool(true), Value::from("x")]));
        assert_eq!(map["d"], Value::from(""));
        assert_eq!(value.to_json()["a"], serde_json::json!(5));
    }

    #[test]
    fn untagged_serde_picks_the_narrowest_variant() {
        let value: Value = serde_json::from_str("[1, 1.5, \"s\", false]").unwrap();
        assert_eq!(
            value,
            Value::List(vec![
                Value::Int(1),
                Value::Float(1.5),
                Value::from("s"),
                Value::Bool(false)
            ])
        );
    }

    #[test]
    fn as_i64_accepts_integral_floats_only() {
        assert_eq!(Value::Float(3.0).as_i64(), Some(3));
        assert_eq!(Value::Float(3.5).as_i64(), None);
        assert_eq!(Value::from("3").as_i64(), None);
    }

    #[test]
    fn as_i64_rejects_floats_outside_the_integer_range() {
        assert_eq!(Value::Float(1e19).as_i64(), None);
        assert_eq!(Value::Float(-1e19).as_i64(), None);
        assert_eq!(Value::Float(9_223_372_036_854_775_808.0).as_i64(), None);
        assert_eq!(Value::Float(f64::INFINITY).as_i64(), None);
        assert_eq!(Value::Float(f64::NAN).as_i64(), None);
        assert_eq!(Value::Float(-9_223_372_036_854_775_808.0).as_i64(), Some(i64::MIN));
    }
}
