//! JSON argument parsing helpers for model-issued function calls.
//!
//! ```rust
//! use ptooling::{parse_arguments, required_string};
//!
//! let args = parse_arguments(r#"{"query":"rust"}"#).expect("object should parse");
//! let query = required_string(&args, "query").expect("query should be present");
//! assert_eq!(query, "rust");
//!
//! let empty = parse_arguments("   ").expect("blank arguments mean no arguments");
//! assert!(empty.as_object().is_some_and(|object| object.is_empty()));
//! ```

use serde_json::{Map, Value};

use crate::ToolError;

/// Parses the raw argument text of a function call.
///
/// Models send an empty string for parameterless calls; that is treated as `{}`.
pub fn parse_arguments(arguments: &str) -> Result<Value, ToolError> {
    if arguments.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    serde_json::from_str(arguments)
        .map_err(|err| ToolError::malformed_arguments(format!("invalid JSON arguments: {err}")))
}

pub fn parse_json_object(arguments: &str) -> Result<Map<String, Value>, ToolError> {
    match parse_arguments(arguments)? {
        Value::Object(object) => Ok(object),
        _ => Err(ToolError::invalid_arguments("expected JSON object arguments")),
    }
}

pub fn required_string(args: &Value, key: &str) -> Result<String, ToolError> {
    args.get(key)
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| ToolError::invalid_arguments(format!("missing required string: '{key}'")))
}

pub fn required_number(args: &Value, key: &str) -> Result<f64, ToolError> {
    args.get(key)
        .and_then(Value::as_f64)
        .ok_or_else(|| ToolError::invalid_arguments(format!("missing required number: '{key}'")))
}

pub fn optional_string(args: &Value, key: &str) -> Option<String> {
    args.get(key).and_then(Value::as_str).map(ToString::to_string)
}
