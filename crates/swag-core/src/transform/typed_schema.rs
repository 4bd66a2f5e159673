use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::JsonMap;
use crate::version::DocVersion;

/// A typed schema class that can describe itself as JSON Schema.
///
/// Implementations live with the application; swag only consumes their output.
pub trait TypedSchema: Send + Sync {
    /// Name the schema is registered under in the definitions table.
    fn name(&self) -> &str;

    /// JSON Schema for the type.
    fn json_schema(&self) -> Value;

    /// Parameter objects describing the type at `location`.
    fn parameters(&self, location: &str) -> Vec<Value>;

    /// Where the type is read from when used as parameters.
    fn location(&self) -> &str {
        "body"
    }
}

/// A specs tree whose leaves may be typed schemas rather than plain JSON.
#[derive(Clone)]
pub enum SpecNode {
    Value(Value),
    Array(Vec<SpecNode>),
    Map(IndexMap<String, SpecNode>),
    Schema(Arc<dyn TypedSchema>),
}

impl SpecNode {
    pub fn schema(schema: impl TypedSchema + 'static) -> Self {
        SpecNode::Schema(Arc::new(schema))
    }

    /// Build a mapping node from `(key, node)` pairs.
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, SpecNode)>) -> Self {
        SpecNode::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            SpecNode::Value(Value::Null) => true,
            SpecNode::Value(Value::Bool(b)) => !b,
            SpecNode::Value(Value::String(s)) => s.is_empty(),
            SpecNode::Value(Value::Array(a)) => a.is_empty(),
            SpecNode::Value(Value::Object(o)) => o.is_empty(),
            SpecNode::Value(_) => false,
            SpecNode::Array(items) => items.is_empty(),
            SpecNode::Map(map) => map.is_empty(),
            SpecNode::Schema(_) => false,
        }
    }
}

impl From<Value> for SpecNode {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => {
                SpecNode::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
            Value::Array(items) => SpecNode::Array(items.into_iter().map(Into::into).collect()),
            scalar => SpecNode::Value(scalar),
        }
    }
}

impl fmt::Debug for SpecNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecNode::Value(v) => write!(f, "{v}"),
            SpecNode::Array(items) => f.debug_list().entries(items).finish(),
            SpecNode::Map(map) => f.debug_map().entries(map).finish(),
            SpecNode::Schema(s) => write!(f, "<schema {}>", s.name()),
        }
    }
}

/// Convert every typed schema in `node` into a `$ref` shaped for `version`,
/// registering its JSON Schema in `definitions`.
///
/// Under a `parameters` key a schema expands to its parameter list, with the
/// first parameter pointing at the registered definition. `definitions` keys
/// found anywhere in the tree are folded into `definitions` and dropped.
pub fn convert_schemas(node: &SpecNode, version: DocVersion, definitions: &mut JsonMap) -> Value {
    convert_tree(node, None, definitions, &mut |key, schema, defs| {
        let json_schema = schema.json_schema();
        let has_required = json_schema
            .get("required")
            .and_then(Value::as_array)
            .is_some_and(|r| !r.is_empty());
        defs.insert(schema.name().to_string(), json_schema);
        let reference = version.reference(schema.name());
        if key != Some("parameters") {
            return Converted::One(reference);
        }
        let mut params = schema.parameters(schema.location());
        if let Some(Value::Object(first)) = params.first_mut() {
            first.insert("schema".to_string(), reference);
            if has_required {
                first.insert("required".to_string(), Value::Bool(true));
            }
        }
        Converted::Many(params)
    })
}

enum Converted {
    One(Value),
    Many(Vec<Value>),
}

impl Converted {
    fn into_value(self) -> Value {
        match self {
            Converted::One(v) => v,
            Converted::Many(items) => Value::Array(items),
        }
    }
}

fn convert_tree<F>(
    node: &SpecNode,
    key: Option<&str>,
    definitions: &mut JsonMap,
    convert: &mut F,
) -> Value
where
    F: FnMut(Option<&str>, &dyn TypedSchema, &mut JsonMap) -> Converted,
{
    match node {
        SpecNode::Value(value) => value.clone(),
        SpecNode::Schema(schema) => convert(key, schema.as_ref(), definitions).into_value(),
        SpecNode::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    SpecNode::Schema(schema) => match convert(key, schema.as_ref(), definitions) {
                        Converted::One(v) => out.push(v),
                        Converted::Many(vs) => out.extend(vs),
                    },
                    other => out.push(convert_tree(other, None, definitions, convert)),
                }
            }
            Value::Array(out)
        }
        SpecNode::Map(map) => {
            if let Some(defs) = map.get("definitions") {
                if let Value::Object(found) = convert_tree(defs, None, definitions, convert) {
                    definitions.extend(found);
                }
            }
            let mut out = JsonMap::new();
            for (k, v) in map {
                if k == "definitions" {
                    continue;
                }
                out.insert(k.clone(), convert_tree(v, Some(k), definitions, convert));
            }
            Value::Object(out)
        }
    }
}
