pub mod docstring;
pub mod file;
pub mod imports;
pub mod sanitizer;
pub mod yaml;

use crate::JsonMap;
use crate::error::ParseError;

pub use docstring::{ParsedDoc, parse_definition_doc, parse_docstring};
pub use file::FileLoader;
pub use sanitizer::Sanitizer;

/// Parse YAML (or JSON) text into a fragment. Empty text yields `None`.
pub fn from_yaml(input: &str) -> Result<Option<JsonMap>, ParseError> {
    match yaml::from_str(input)? {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Object(map) => Ok(Some(map)),
        other => Err(ParseError::NotAMapping(type_name(&other).to_string())),
    }
}

/// Parse a JSON object.
pub fn from_json(input: &str) -> Result<JsonMap, ParseError> {
    match serde_json::from_str(input)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(ParseError::NotAMapping(type_name(&other).to_string())),
    }
}

fn type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "sequence",
        serde_json::Value::Object(_) => "mapping",
    }
}
