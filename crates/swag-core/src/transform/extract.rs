use log::debug;
use serde_json::Value;

use crate::JsonMap;
use crate::version::DocVersion;

/// A named type hoisted out of a fragment. The identifier lives only here,
/// never inside `body`.
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    pub id: String,
    pub body: JsonMap,
}

/// Where the items being extracted come from.
#[derive(Debug, Clone, Copy)]
pub struct ExtractContext<'a> {
    pub endpoint: &'a str,
    pub verb: &'a str,
    /// Prefix identifiers with `{endpoint}_{verb}_` to keep them unique per operation.
    pub prefix_ids: bool,
    pub version: DocVersion,
}

impl ExtractContext<'_> {
    fn definition_id(&self, id: &str) -> String {
        if self.prefix_ids {
            let endpoint = self.endpoint.to_lowercase().replace('.', "_");
            format!("{}_{}_{}", endpoint, self.verb, id)
        } else {
            id.to_string()
        }
    }
}

/// The rewritten items plus every definition discovered in them.
#[derive(Debug, Clone, Default)]
pub struct Extracted {
    pub items: Vec<Value>,
    pub definitions: Vec<Definition>,
}

/// Hoist every schema carrying an `id` out of `items`.
///
/// Each hoisted occurrence is replaced by a `$ref` in the shape `ctx.version`
/// expects: top-level items keep a `schema` key pointing at the reference,
/// nested property and array-item occurrences become the reference
/// themselves. Object properties and array items are searched recursively.
/// The input is left untouched.
pub fn extract_definitions<'v>(
    items: impl IntoIterator<Item = &'v Value>,
    ctx: &ExtractContext<'_>,
) -> Extracted {
    let mut definitions = Vec::new();
    let items = items
        .into_iter()
        .map(|item| extract_item(item, 0, ctx, &mut definitions))
        .collect();
    Extracted { items, definitions }
}

fn extract_item(
    item: &Value,
    level: usize,
    ctx: &ExtractContext<'_>,
    definitions: &mut Vec<Definition>,
) -> Value {
    let Value::Object(source) = item else {
        debug!("skipping non-object item during definition extraction: {item}");
        return item.clone();
    };
    let mut out = source.clone();

    if let Some(Value::Object(schema)) = source.get("schema") {
        let position = definitions.len();
        let mut schema = schema.clone();

        if let Some(Value::Object(properties)) = schema.get("properties") {
            let rewritten: JsonMap = properties
                .iter()
                .map(|(name, prop)| (name.clone(), extract_item(prop, level + 1, ctx, definitions)))
                .collect();
            schema.insert("properties".to_string(), Value::Object(rewritten));
        }
        extract_array_items(&mut schema, level, ctx, definitions);

        match schema.get("id").and_then(Value::as_str).map(str::to_owned) {
            Some(raw_id) => {
                let id = ctx.definition_id(&raw_id);
                schema.remove("id");
                let reference = ctx.version.reference(&id);
                definitions.insert(position, Definition { id, body: schema });
                if level == 0 {
                    out.insert("schema".to_string(), reference);
                } else {
                    out.remove("schema");
                    if let Value::Object(reference) = reference {
                        out.extend(reference);
                    }
                }
            }
            None => {
                out.insert("schema".to_string(), Value::Object(schema));
            }
        }
    }

    extract_array_items(&mut out, level, ctx, definitions);
    Value::Object(out)
}

/// Rewrite `items` of an array-shaped object when it wraps a `schema`.
fn extract_array_items(
    source: &mut JsonMap,
    level: usize,
    ctx: &ExtractContext<'_>,
    definitions: &mut Vec<Definition>,
) {
    let Some(items) = source.get("items") else {
        return;
    };
    if items.get("schema").is_none() {
        return;
    }
    let rewritten = extract_item(items, level + 1, ctx, definitions);
    source.insert("items".to_string(), rewritten);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx(version: DocVersion, prefix_ids: bool) -> ExtractContext<'static> {
        ExtractContext {
            endpoint: "pets",
            verb: "post",
            prefix_ids,
            version,
        }
    }

    #[test]
    fn hoists_top_level_schema_into_reference() {
        let params = vec![json!({
            "name": "body",
            "in": "body",
            "schema": {"id": "Pet", "type": "object", "properties": {"name": {"type": "string"}}}
        })];
        let out = extract_definitions(&params, &ctx(DocVersion::Swagger2, false));
        assert_eq!(out.items[0]["schema"], json!({"$ref": "#/definitions/Pet"}));
        assert_eq!(out.definitions.len(), 1);
        assert_eq!(out.definitions[0].id, "Pet");
        assert!(!out.definitions[0].body.contains_key("id"));
        assert_eq!(out.items[0]["name"], "body");
    }

    #[test]
    fn nested_property_schema_becomes_inline_reference() {
        let params = vec![json!({
            "in": "body",
            "schema": {
                "id": "Pet",
                "type": "object",
                "properties": {
                    "category": {
                        "description": "owning category",
                        "schema": {"id": "Category", "type": "object", "properties": {"name": {"type": "string"}}}
                    }
                }
            }
        })];
        let out = extract_definitions(&params, &ctx(DocVersion::Swagger2, false));
        let ids: Vec<&str> = out.definitions.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["Pet", "Category"]);
        let pet = &out.definitions[0].body;
        assert_eq!(
            pet["properties"]["category"],
            json!({"description": "owning category", "$ref": "#/definitions/Category"})
        );
    }

    #[test]
    fn array_items_are_hoisted_with_version_three_paths() {
        let responses = vec![json!({
            "description": "palette",
            "schema": {
                "id": "Palette",
                "type": "array",
                "items": {"schema": {"id": "Color", "type": "string"}}
            }
        })];
        let out = extract_definitions(&responses, &ctx(DocVersion::OpenApi3, false));
        assert_eq!(
            out.items[0]["schema"],
            json!({"$ref": "#/components/schemas/Palette"})
        );
        let palette = out.definitions.iter().find(|d| d.id == "Palette").unwrap();
        assert_eq!(
            palette.body["items"],
            json!({"$ref": "#/components/schemas/Color"})
        );
        assert!(out.definitions.iter().any(|d| d.id == "Color"));
    }

    #[test]
    fn array_parameter_without_own_schema_is_searched() {
        let params = vec![json!({
            "name": "tags",
            "in": "query",
            "type": "array",
            "items": {"schema": {"id": "Tag", "type": "string"}}
        })];
        let out = extract_definitions(&params, &ctx(DocVersion::Swagger2, false));
        assert_eq!(out.items[0]["items"], json!({"$ref": "#/definitions/Tag"}));
        assert_eq!(out.definitions[0].id, "Tag");
    }

    #[test]
    fn prefixing_applies_to_definition_and_reference() {
        let params = vec![json!({"in": "body", "schema": {"id": "Item", "type": "object"}})];
        let context = ExtractContext {
            endpoint: "api.Items",
            verb: "post",
            prefix_ids: true,
            version: DocVersion::Swagger2,
        };
        let out = extract_definitions(&params, &context);
        assert_eq!(out.definitions[0].id, "api_items_post_Item");
        assert_eq!(
            out.items[0]["schema"],
            json!({"$ref": "#/definitions/api_items_post_Item"})
        );
    }

    #[test]
    fn schemas_without_id_stay_inline() {
        let params = vec![json!({"in": "body", "schema": {"type": "object"}})];
        let out = extract_definitions(&params, &ctx(DocVersion::Swagger2, false));
        assert!(out.definitions.is_empty());
        assert_eq!(out.items, params);
    }

    #[test]
    fn input_is_not_mutated() {
        let params = vec![json!({"in": "body", "schema": {"id": "Pet"}})];
        let before = params.clone();
        let _ = extract_definitions(&params, &ctx(DocVersion::Swagger2, true));
        assert_eq!(params, before);
    }
}
