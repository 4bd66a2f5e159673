use std::collections::BTreeSet;
use std::fs;

use indexmap::IndexMap;
use serde_json::json;
use swag_core::routes::{RouteSpecs, WalkOptions, walk_routes};
use swag_core::{DocsConfig, Handler, HttpMethod, RouteTable, SpecError, SpecNode, ViewDoc};

fn walk(table: &RouteTable) -> Result<Vec<RouteSpecs>, SpecError> {
    walk_routes(table, |_| true, &WalkOptions::default())
}

#[test]
fn dispatch_view_documents_only_accepted_methods() {
    let mut table = RouteTable::new();
    table.add(
        "/users",
        "users",
        [HttpMethod::Get, HttpMethod::Post, HttpMethod::Put],
        Handler::Dispatch {
            name: "UserView".into(),
            methods: Some(BTreeSet::from([HttpMethod::Get, HttpMethod::Post])),
            view: ViewDoc::new("dispatch_request").with_doc("Users\n---\ntags: [users]"),
        },
    );
    let specs = walk(&table).unwrap();
    let verbs: Vec<HttpMethod> = specs[0].verbs.iter().map(|(v, _)| *v).collect();
    assert_eq!(verbs, vec![HttpMethod::Get, HttpMethod::Post]);
}

#[test]
fn method_view_documents_each_verb_separately() {
    let mut verbs = IndexMap::new();
    verbs.insert(
        HttpMethod::Get,
        ViewDoc::new("get").with_doc("Read\n---\ntags: [read]"),
    );
    verbs.insert(
        HttpMethod::Delete,
        ViewDoc::new("delete").with_doc("Remove\n---\ntags: [write]"),
    );
    let mut table = RouteTable::new();
    table.add(
        "/items/<id>",
        "items",
        [HttpMethod::Get, HttpMethod::Delete],
        Handler::MethodView {
            name: "ItemAPI".into(),
            verbs,
            schema_view: None,
        },
    );

    let specs = walk(&table).unwrap();
    let by_verb: IndexMap<HttpMethod, _> = specs[0].verbs.iter().cloned().collect();
    assert_eq!(by_verb[&HttpMethod::Get]["summary"], "Read");
    assert_eq!(by_verb[&HttpMethod::Delete]["tags"], json!(["write"]));
}

#[test]
fn missing_callable_names_the_route() {
    let mut verbs = IndexMap::new();
    verbs.insert(HttpMethod::Get, ViewDoc::new("get"));
    let mut table = RouteTable::new();
    table.add(
        "/broken",
        "broken",
        [HttpMethod::Get, HttpMethod::Patch],
        Handler::MethodView {
            name: "Broken".into(),
            verbs,
            schema_view: None,
        },
    );
    let err = walk(&table).unwrap_err();
    assert_eq!(err.to_string(), "cannot detect view function for rule /broken");
}

#[test]
fn contributions_merge_lists_and_override_scalars() {
    let view = ViewDoc::new("pets")
        .with_specs(SpecNode::from(json!({
            "summary": "x",
            "tags": ["a"],
            "responses": {"200": {"description": "from dict"}}
        })))
        .with_doc("---\nsummary: y\ntags: [b]\nresponses:\n  404:\n    description: missing\n");
    let mut table = RouteTable::new();
    table.add("/pets", "pets", [HttpMethod::Get], Handler::Function(view));

    let specs = walk(&table).unwrap();
    let fragment = &specs[0].verbs[0].1;
    assert_eq!(fragment["summary"], "y");
    assert_eq!(fragment["tags"], json!(["a", "b"]));
    assert_eq!(fragment["responses"]["200"]["description"], "from dict");
    assert_eq!(fragment["responses"]["404"]["description"], "missing");
}

#[test]
fn function_sidecar_in_doc_dir_is_used() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("list_pets.yml"), "List\n---\ntags: [doc_dir]").unwrap();

    let mut table = RouteTable::new();
    table.add(
        "/pets",
        "pets",
        [HttpMethod::Get],
        Handler::Function(ViewDoc::new("list_pets")),
    );
    let config = DocsConfig {
        doc_dir: Some(dir.path().to_path_buf()),
        ..DocsConfig::default()
    };
    let options = WalkOptions::from_config(&config, Default::default(), Default::default());

    let specs = walk_routes(&table, |_| true, &options).unwrap();
    assert_eq!(specs[0].verbs[0].1["tags"], json!(["doc_dir"]));
    assert_eq!(specs[0].verbs[0].1["summary"], "List");
}
