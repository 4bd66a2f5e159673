use serde_json::Value;

use crate::JsonMap;
use crate::transform::{Definition, ExtractContext, extract_definitions};
use crate::version::DocVersion;

/// `components` sub-collections merged across operations of a v3 document.
pub const OAS3_SUB_COMPONENTS: &[&str] = &[
    "parameters",
    "securitySchemes",
    "requestBodies",
    "responses",
    "headers",
    "examples",
    "links",
    "callbacks",
];

/// Verbs whose nested operation block may supply the parameters.
const HTTP_METHODS: &[&str] = &["get", "post", "put", "delete", "patch"];

/// Document-wide tables that operations contribute to.
#[derive(Debug, Default)]
pub(crate) struct DocState {
    pub version: DocVersion,
    pub prefix_ids: bool,
    pub optional_fields: Vec<String>,
    pub definitions: JsonMap,
    pub components: JsonMap,
}

impl DocState {
    /// Build the operation object for `verb` from `swag`, hoisting its inline
    /// definitions into the shared table.
    pub fn build_operation(&mut self, swag: &JsonMap, endpoint: &str, verb: &str) -> JsonMap {
        self.absorb_schemas(swag);

        let ctx = ExtractContext {
            endpoint,
            verb,
            prefix_ids: self.prefix_ids,
            version: self.version,
        };
        let mut operation = JsonMap::new();

        let mut params = array(swag.get("parameters"));
        if params.is_empty() && HTTP_METHODS.contains(&verb) {
            if let Some(nested) = swag.get(verb) {
                params = array(nested.get("parameters"));
            }
        }
        let params = self.extract(params, &ctx);

        let request_body = swag.get("requestBody").and_then(Value::as_object).map(|body| {
            let mut body = body.clone();
            if let Some(Value::Object(content)) = body.get("content") {
                let content = self.extract_values(content, &ctx);
                body.insert("content".to_string(), Value::Object(content));
            }
            body
        });

        let callbacks = swag
            .get("callbacks")
            .and_then(Value::as_object)
            .map(|callbacks| self.extract_values(callbacks, &ctx));

        let responses = swag.get("responses").and_then(Value::as_object).map(|responses| {
            let mut responses = self.extract_values(responses, &ctx);
            for response in responses.values_mut() {
                let Some(response) = response.as_object_mut() else {
                    continue;
                };
                if let Some(Value::Object(content)) = response.get("content") {
                    let content = self.extract_values(content, &ctx);
                    response.insert("content".to_string(), Value::Object(content));
                }
            }
            responses
        });

        if let Some(summary) = swag.get("summary").filter(|v| truthy(v)) {
            operation.insert("summary".to_string(), summary.clone());
        }
        if let Some(description) = swag.get("description").filter(|v| truthy(v)) {
            operation.insert("description".to_string(), description.clone());
        }
        if let Some(body) = request_body.filter(|b| !b.is_empty()) {
            operation.insert("requestBody".to_string(), Value::Object(body));
        }
        if let Some(callbacks) = callbacks.filter(|c| !c.is_empty()) {
            operation.insert("callbacks".to_string(), Value::Object(callbacks));
        }
        if let Some(responses) = responses.filter(|r| !r.is_empty()) {
            operation.insert("responses".to_string(), Value::Object(responses));
        }
        if !params.is_empty() {
            operation.insert("parameters".to_string(), Value::Array(params));
        }

        for key in &self.optional_fields {
            let Some(value) = swag.get(key) else {
                continue;
            };
            let value = match (key.as_str(), value) {
                ("produces" | "consumes", Value::Array(_)) => value.clone(),
                ("produces" | "consumes", scalar) => Value::Array(vec![scalar.clone()]),
                _ => value.clone(),
            };
            operation.insert(key.clone(), value);
        }
        operation
    }

    /// Fold the fragment's own definitions table and v3 sub-components.
    fn absorb_schemas(&mut self, swag: &JsonMap) {
        let schemas = if self.version.is_v3() {
            let components = swag.get("components").and_then(Value::as_object);
            for sub in OAS3_SUB_COMPONENTS {
                let Some(Value::Object(source)) = components.and_then(|c| c.get(*sub)) else {
                    continue;
                };
                if source.is_empty() {
                    continue;
                }
                let slot = self
                    .components
                    .entry(sub.to_string())
                    .or_insert_with(|| Value::Object(JsonMap::new()));
                match slot {
                    Value::Object(dest) => dest.extend(source.clone()),
                    other => *other = Value::Object(source.clone()),
                }
            }
            components.and_then(|c| c.get("schemas"))
        } else {
            swag.get("definitions")
        };

        let schemas = match schemas {
            Some(Value::Array(items)) => items.first(),
            other => other,
        };
        if let Some(Value::Object(schemas)) = schemas {
            self.definitions
                .extend(schemas.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
    }

    fn extract(&mut self, items: Vec<Value>, ctx: &ExtractContext<'_>) -> Vec<Value> {
        let extracted = extract_definitions(&items, ctx);
        self.fold(extracted.definitions);
        extracted.items
    }

    /// Extract from every value of `map`, keeping its keys.
    fn extract_values(&mut self, map: &JsonMap, ctx: &ExtractContext<'_>) -> JsonMap {
        let extracted = extract_definitions(map.values(), ctx);
        self.fold(extracted.definitions);
        map.keys().cloned().zip(extracted.items).collect()
    }

    fn fold(&mut self, definitions: Vec<Definition>) {
        for Definition { id, body } in definitions {
            let slot = self
                .definitions
                .entry(id)
                .or_insert_with(|| Value::Object(JsonMap::new()));
            match slot {
                Value::Object(existing) => existing.extend(body),
                other => *other = Value::Object(body),
            }
        }
    }
}

fn array(value: Option<&Value>) -> Vec<Value> {
    value
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Number(_) => true,
    }
}
