//! Payload validation against schemas declared in operation fragments.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::JsonMap;
use crate::assemble::ApiDocs;
use crate::error::ValidationError;
use crate::lookup::find_by_schema_id;
use crate::transform::{ExtractContext, extract_definitions};
use crate::version::DocVersion;

/// Deepest chain of local `$ref`s inlined before giving up.
const MAX_REF_DEPTH: usize = 32;

type ValidationFn = dyn Fn(&Value, &Value) -> Result<(), ValidationError> + Send + Sync;
type ErrorHandler =
    dyn Fn(ValidationError, &Value, &Value) -> Result<(), ValidationError> + Send + Sync;

/// Checks a payload against a schema and decides what a failure means.
#[derive(Clone)]
pub struct Validator {
    validate: Arc<ValidationFn>,
    on_error: Arc<ErrorHandler>,
}

impl Default for Validator {
    fn default() -> Self {
        Self {
            validate: Arc::new(json_schema_validation),
            on_error: Arc::new(|err: ValidationError, _: &Value, _: &Value| Err(err)),
        }
    }
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the function run as `(data, schema)`.
    pub fn with_validation(
        mut self,
        f: impl Fn(&Value, &Value) -> Result<(), ValidationError> + Send + Sync + 'static,
    ) -> Self {
        self.validate = Arc::new(f);
        self
    }

    /// Replace the handler run as `(error, data, schema)` when validation fails.
    pub fn with_error_handler(
        mut self,
        f: impl Fn(ValidationError, &Value, &Value) -> Result<(), ValidationError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.on_error = Arc::new(f);
        self
    }

    pub fn check(&self, data: &Value, schema: &Value) -> Result<(), ValidationError> {
        (self.validate)(data, schema).or_else(|err| (self.on_error)(err, data, schema))
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Validator(..)")
    }
}

fn json_schema_validation(data: &Value, schema: &Value) -> Result<(), ValidationError> {
    let compiled = jsonschema::validator_for(schema)
        .map_err(|e| ValidationError::InvalidSchema(e.to_string()))?;
    let messages: Vec<String> = compiled.iter_errors(data).map(|e| e.to_string()).collect();
    if messages.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Rejected(messages))
    }
}

/// Validate `data` against the schema `schema_id` declared in `specs`.
///
/// Without an explicit id, the first body parameter's reference is used,
/// then the first schema declared in the parameters.
pub fn validate_payload(
    data: &Value,
    schema_id: Option<&str>,
    specs: &JsonMap,
    version: DocVersion,
    validator: &Validator,
) -> Result<(), ValidationError> {
    let params: Vec<Value> = specs
        .get("parameters")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|p| p.get("schema").is_some_and(|s| !s.is_null()))
        .cloned()
        .collect();
    let extracted = extract_definitions(
        &params,
        &ExtractContext {
            endpoint: "",
            verb: "",
            prefix_ids: false,
            version,
        },
    );

    let schema_id = match schema_id {
        Some(id) => id.to_string(),
        None => body_reference(&extracted.items)
            .or_else(|| extracted.definitions.first().map(|d| d.id.clone()))
            .ok_or(ValidationError::NoSchema)?,
    };

    let mut main = None;
    let mut others = JsonMap::new();
    for definition in extracted.definitions {
        if definition.id.eq_ignore_ascii_case(&schema_id) {
            main = Some(definition.body);
        } else {
            others.insert(definition.id, Value::Object(definition.body));
        }
    }

    let declared = schema_table(specs, version);
    if let Some(Value::Object(schema)) = declared.and_then(|t| t.get(&schema_id)) {
        main = Some(schema.clone());
    }
    let mut main = main.ok_or_else(|| ValidationError::SchemaNotFound(schema_id.clone()))?;

    let mut table = declared.cloned().unwrap_or_default();
    table.extend(others.clone());
    main.insert("definitions".to_string(), Value::Object(others));

    let root = Value::Object(specs.clone());
    let schema = inline_refs(&Value::Object(main), &table, &root, 0);
    validator.check(data, &schema)
}

/// Last segment of the first body parameter's `$ref`.
fn body_reference(params: &[Value]) -> Option<String> {
    params
        .iter()
        .filter(|p| p.get("in").and_then(Value::as_str) == Some("body"))
        .find_map(|p| p.get("schema")?.get("$ref")?.as_str())
        .and_then(|r| r.rsplit('/').next())
        .map(str::to_string)
}

fn schema_table(specs: &JsonMap, version: DocVersion) -> Option<&JsonMap> {
    let table = if version.is_v3() {
        specs.get("components")?.get("schemas")?
    } else {
        specs.get("definitions")?
    };
    table.as_object()
}

/// Replace local `$ref`s with the schema they point at.
fn inline_refs(value: &Value, table: &JsonMap, root: &Value, depth: usize) -> Value {
    match value {
        Value::Object(map) => {
            if let Some(target) = map.get("$ref").and_then(Value::as_str) {
                if depth < MAX_REF_DEPTH {
                    if let Some(resolved) = resolve_local(target, table, root) {
                        return inline_refs(resolved, table, root, depth + 1);
                    }
                }
            }
            Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), inline_refs(v, table, root, depth)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|v| inline_refs(v, table, root, depth))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn resolve_local<'a>(target: &str, table: &'a JsonMap, root: &'a Value) -> Option<&'a Value> {
    let name = target
        .strip_prefix(DocVersion::Swagger2.ref_prefix())
        .or_else(|| target.strip_prefix(DocVersion::OpenApi3.ref_prefix()));
    match name {
        Some(name) => table.get(name).or_else(|| root.pointer(&target[1..])),
        None => target.strip_prefix('#').and_then(|pointer| root.pointer(pointer)),
    }
}

impl ApiDocs {
    /// Validate `data` against the schema `schema_id` declared by some route.
    pub fn validate(&self, schema_id: &str, data: &Value) -> Result<(), ValidationError> {
        let specs = find_by_schema_id(self, schema_id)?
            .ok_or_else(|| ValidationError::SchemaNotFound(schema_id.to_string()))?;
        validate_payload(
            data,
            Some(schema_id),
            &specs,
            self.config().doc_version(),
            &self.validator,
        )
    }
}
