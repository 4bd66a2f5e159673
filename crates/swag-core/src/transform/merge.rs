use serde_json::Value;

use crate::JsonMap;

/// Deep-merge `source` into `target`.
///
/// Mappings are merged recursively, sequences are concatenated and any other
/// value overwrites what `target` held. Applied once per contribution, in
/// discovery order, so later contributions win on scalars.
pub fn merge_specs(target: &mut JsonMap, source: &JsonMap) {
    for (key, value) in source {
        match value {
            Value::Object(map) => {
                let node = target
                    .entry(key.clone())
                    .or_insert_with(|| Value::Object(JsonMap::new()));
                if !node.is_object() {
                    *node = Value::Object(JsonMap::new());
                }
                if let Value::Object(node) = node {
                    merge_specs(node, map);
                }
            }
            Value::Array(items) => {
                let node = target
                    .entry(key.clone())
                    .or_insert_with(|| Value::Array(Vec::new()));
                if !node.is_array() {
                    *node = Value::Array(Vec::new());
                }
                if let Value::Array(node) = node {
                    node.extend(items.iter().cloned());
                }
            }
            other => {
                target.insert(key.clone(), other.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> JsonMap {
        match value {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn later_scalar_wins() {
        let mut target = map(json!({"summary": "x"}));
        merge_specs(&mut target, &map(json!({"summary": "y"})));
        assert_eq!(target["summary"], "y");
    }

    #[test]
    fn lists_accumulate() {
        let mut target = map(json!({"tags": ["a"]}));
        merge_specs(&mut target, &map(json!({"tags": ["b"]})));
        assert_eq!(target["tags"], json!(["a", "b"]));
    }

    #[test]
    fn mappings_merge_recursively() {
        let mut target = map(json!({
            "responses": {"200": {"description": "ok"}}
        }));
        merge_specs(
            &mut target,
            &map(json!({
                "responses": {"404": {"description": "missing"}, "200": {"schema": {"type": "string"}}}
            })),
        );
        assert_eq!(
            target["responses"],
            json!({
                "200": {"description": "ok", "schema": {"type": "string"}},
                "404": {"description": "missing"}
            })
        );
    }

    #[test]
    fn creates_missing_containers() {
        let mut target = JsonMap::new();
        merge_specs(
            &mut target,
            &map(json!({"parameters": [{"name": "id"}], "definitions": {}})),
        );
        assert_eq!(target["parameters"], json!([{"name": "id"}]));
        assert_eq!(target["definitions"], json!({}));
    }
}
