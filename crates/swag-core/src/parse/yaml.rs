use serde_json::{Number, Value};
use serde_yaml_ng::Value as YamlValue;

use crate::JsonMap;
use crate::error::ParseError;

/// Parse YAML text into a JSON value. Non-string mapping keys (such as
/// response codes) are stringified and `<<` merge keys are applied.
pub fn from_str(input: &str) -> Result<Value, ParseError> {
    let mut value: YamlValue = serde_yaml_ng::from_str(input)?;
    value.apply_merge()?;
    Ok(to_json(value))
}

/// Convert a YAML value into its JSON counterpart.
pub fn to_json(value: YamlValue) -> Value {
    match value {
        YamlValue::Null => Value::Null,
        YamlValue::Bool(b) => Value::Bool(b),
        YamlValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Value::Number(u.into())
            } else {
                n.as_f64()
                    .and_then(Number::from_f64)
                    .map_or(Value::Null, Value::Number)
            }
        }
        YamlValue::String(s) => Value::String(s),
        YamlValue::Sequence(items) => Value::Array(items.into_iter().map(to_json).collect()),
        YamlValue::Mapping(mapping) => {
            let mut map = JsonMap::new();
            for (key, value) in mapping {
                map.insert(key_to_string(key), to_json(value));
            }
            Value::Object(map)
        }
        YamlValue::Tagged(tagged) => to_json(tagged.value),
    }
}

fn key_to_string(key: YamlValue) -> String {
    match key {
        YamlValue::String(s) => s,
        YamlValue::Number(n) => n.to_string(),
        YamlValue::Bool(b) => b.to_string(),
        YamlValue::Null => "null".to_string(),
        other => serde_yaml_ng::to_string(&other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}
