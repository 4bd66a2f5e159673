//! Locating the operation that declares a given schema id.

use serde_json::Value;

use crate::JsonMap;
use crate::assemble::ApiDocs;
use crate::error::SpecError;

/// The first walked operation fragment with a parameter whose `schema.id`
/// matches `schema_id`, ignoring case.
///
/// Fragments come straight from the route walk, so ids are still in place.
pub fn find_by_schema_id(docs: &ApiDocs, schema_id: &str) -> Result<Option<JsonMap>, SpecError> {
    let found = docs
        .walk(|_| true)?
        .into_iter()
        .flat_map(|specs| specs.verbs)
        .map(|(_, fragment)| fragment)
        .find(|fragment| parameter_schema(fragment, schema_id).is_some());
    Ok(found)
}

fn parameter_schema<'a>(fragment: &'a JsonMap, schema_id: &str) -> Option<&'a JsonMap> {
    fragment
        .get("parameters")?
        .as_array()?
        .iter()
        .filter_map(|p| p.get("schema")?.as_object())
        .find(|schema| {
            schema
                .get("id")
                .and_then(Value::as_str)
                .is_some_and(|id| id.eq_ignore_ascii_case(schema_id))
        })
}

impl ApiDocs {
    /// The parameter schema registered under `schema_id`.
    pub fn get_schema(&self, schema_id: &str) -> Result<JsonMap, SpecError> {
        let not_found = || SpecError::SchemaNotFound(schema_id.to_string());
        let fragment = find_by_schema_id(self, schema_id)?.ok_or_else(not_found)?;
        parameter_schema(&fragment, schema_id)
            .cloned()
            .ok_or_else(not_found)
    }
}
