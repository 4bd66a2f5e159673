use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde_json::Value;

use super::{Handler, HttpMethod, Route, RouteSource, ViewDoc};
use crate::JsonMap;
use crate::config::DocsConfig;
use crate::error::SpecError;
use crate::parse::{FileLoader, Sanitizer, parse_docstring};
use crate::transform::{SpecNode, convert_schemas, merge_specs};
use crate::version::DocVersion;

/// Class attributes read from a schema view besides the optional fields.
const SCHEMA_VIEW_ATTRIBUTES: &[&str] =
    &["parameters", "definitions", "responses", "summary", "description"];

/// Settings shared by every route of one walk.
#[derive(Debug, Clone)]
pub struct WalkOptions {
    pub ignore_verbs: BTreeSet<HttpMethod>,
    pub optional_fields: Vec<String>,
    pub sanitizer: Sanitizer,
    pub version: DocVersion,
    pub doc_dir: Option<PathBuf>,
    pub loader: FileLoader,
}

impl WalkOptions {
    pub fn from_config(config: &DocsConfig, sanitizer: Sanitizer, loader: FileLoader) -> Self {
        Self {
            ignore_verbs: config.ignore_verbs.clone(),
            optional_fields: config.optional_fields.clone(),
            sanitizer,
            version: config.doc_version(),
            doc_dir: config.doc_dir.clone(),
            loader,
        }
    }
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self::from_config(&DocsConfig::default(), Sanitizer::default(), FileLoader::default())
    }
}

/// Every documented verb of one route with its merged fragment.
#[derive(Debug, Clone)]
pub struct RouteSpecs {
    pub route: Route,
    pub verbs: Vec<(HttpMethod, JsonMap)>,
}

/// Collect the merged fragment of every documented `(route, verb)` accepted
/// by `filter`.
///
/// Routes without a registered handler are skipped. A method view lacking a
/// callable for one of its declared verbs is a fatal error.
pub fn walk_routes(
    source: &dyn RouteSource,
    filter: impl Fn(&Route) -> bool,
    options: &WalkOptions,
) -> Result<Vec<RouteSpecs>, SpecError> {
    let mut specs = Vec::new();

    for route in source.routes().into_iter().filter(|r| filter(r)) {
        let Some(handler) = source.handler(&route.endpoint) else {
            warn!("no handler registered for endpoint {}", route.endpoint);
            continue;
        };

        let mut verbs = Vec::new();
        for (verb, view) in handler.resolve(&route, &options.ignore_verbs)? {
            if let Some(fragment) = collect_fragment(&route, handler, verb, view, options)? {
                verbs.push((verb, fragment));
            }
        }

        debug!("route {} documents {} verb(s)", route, verbs.len());
        if !verbs.is_empty() {
            specs.push(RouteSpecs { route, verbs });
        }
    }
    Ok(specs)
}

fn collect_fragment(
    route: &Route,
    handler: &Handler,
    verb: HttpMethod,
    view: &ViewDoc,
    options: &WalkOptions,
) -> Result<Option<JsonMap>, SpecError> {
    let mut swag = JsonMap::new();
    let mut definitions = JsonMap::new();
    let mut swagged = false;

    if let Some(specs) = view.specs_dict.as_ref().filter(|s| !s.is_empty()) {
        merge_converted(&mut swag, specs, options.version, &mut definitions);
        swagged = true;
    }

    if let Some(attributes) = handler.schema_view() {
        let picked = pick_attributes(attributes, &options.optional_fields);
        merge_converted(&mut swag, &picked, options.version, &mut definitions);
        swagged = true;
    }

    let sidecar = options
        .doc_dir
        .as_deref()
        .and_then(|dir| doc_dir_sidecar(dir, handler, view));
    let parsed = parse_docstring(
        view,
        &options.sanitizer,
        &route.endpoint,
        verb.key(),
        sidecar.as_deref(),
        &options.loader,
    )?;

    let table = if options.version.is_v3() {
        serde_json::json!({ "components": { "schemas": definitions } })
    } else {
        serde_json::json!({ "definitions": definitions })
    };
    if let Value::Object(table) = table {
        merge_specs(&mut swag, &table);
    }

    if let Some(fragment) = &parsed.fragment {
        merge_specs(&mut swag, fragment);
        swagged = true;
    }

    if !swagged {
        return Ok(None);
    }
    if let Some(summary) = parsed.summary {
        swag.insert("summary".to_string(), Value::String(summary));
    }
    if let Some(description) = parsed.description {
        swag.insert("description".to_string(), Value::String(description));
    }
    Ok(Some(swag))
}

fn merge_converted(
    swag: &mut JsonMap,
    node: &SpecNode,
    version: DocVersion,
    definitions: &mut JsonMap,
) {
    match convert_schemas(node, version, definitions) {
        Value::Object(converted) => merge_specs(swag, &converted),
        other => warn!("ignoring specs that are not a mapping: {other}"),
    }
}

/// The non-empty schema view attributes the walker reads.
fn pick_attributes(attributes: &SpecNode, optional_fields: &[String]) -> SpecNode {
    let SpecNode::Map(map) = attributes else {
        return SpecNode::Map(Default::default());
    };
    let wanted = optional_fields
        .iter()
        .map(String::as_str)
        .chain(SCHEMA_VIEW_ATTRIBUTES.iter().copied());
    SpecNode::map(wanted.filter_map(|key| {
        map.get(key)
            .filter(|node| !node.is_empty())
            .map(|node| (key, node.clone()))
    }))
}

/// `{doc_dir}/{function}.yml` or `{doc_dir}/{view}/{callable}.yml`, if present.
fn doc_dir_sidecar(doc_dir: &Path, handler: &Handler, view: &ViewDoc) -> Option<PathBuf> {
    let path = match handler.view_name() {
        Some(class) => doc_dir.join(class).join(format!("{}.yml", view.name)),
        None => doc_dir.join(format!("{}.yml", view.name)),
    };
    path.is_file().then_some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::RouteTable;
    use indexmap::IndexMap;
    use serde_json::json;

    fn walk(table: &RouteTable, options: &WalkOptions) -> Vec<RouteSpecs> {
        walk_routes(table, |_| true, options).unwrap()
    }

    #[test]
    fn docstring_fragment_is_collected() {
        let mut table = RouteTable::new();
        table.add(
            "/pets",
            "pets",
            [HttpMethod::Get, HttpMethod::Head],
            Handler::Function(
                ViewDoc::new("pets").with_doc("List pets\n---\ntags: [pets]\n"),
            ),
        );
        let specs = walk(&table, &WalkOptions::default());
        assert_eq!(specs.len(), 1);
        let (verb, fragment) = &specs[0].verbs[0];
        assert_eq!(*verb, HttpMethod::Get);
        assert_eq!(fragment["tags"], json!(["pets"]));
        assert_eq!(fragment["summary"], "List pets");
        assert_eq!(fragment["definitions"], json!({}));
    }

    #[test]
    fn summary_alone_is_not_documented() {
        let mut table = RouteTable::new();
        table.add(
            "/plain",
            "plain",
            [HttpMethod::Get],
            Handler::Function(ViewDoc::new("plain").with_doc("Nothing structured.")),
        );
        assert!(walk(&table, &WalkOptions::default()).is_empty());
    }

    #[test]
    fn specs_dict_and_docstring_merge_in_order() {
        let view = ViewDoc::new("colors")
            .with_specs(json!({"tags": ["a"], "summary": "from dict"}))
            .with_doc("From doc\n---\ntags: [b]\n");
        let mut table = RouteTable::new();
        table.add("/colors", "colors", [HttpMethod::Get], Handler::Function(view));

        let specs = walk(&table, &WalkOptions::default());
        let fragment = &specs[0].verbs[0].1;
        assert_eq!(fragment["tags"], json!(["a", "b"]));
        assert_eq!(fragment["summary"], "From doc");
    }

    #[test]
    fn schema_view_attributes_land_under_components_for_v3() {
        let attributes = SpecNode::from(json!({
            "tags": ["users"],
            "summary": "",
            "definitions": {"User": {"type": "object"}},
            "responses": {"200": {"description": "ok"}},
            "unrelated": true
        }));
        let mut verbs = IndexMap::new();
        verbs.insert(HttpMethod::Get, ViewDoc::new("get"));
        let mut table = RouteTable::new();
        table.add(
            "/users",
            "users",
            [HttpMethod::Get],
            Handler::MethodView {
                name: "UserAPI".into(),
                verbs,
                schema_view: Some(attributes),
            },
        );
        let options = WalkOptions {
            version: DocVersion::OpenApi3,
            ..WalkOptions::default()
        };

        let specs = walk(&table, &options);
        let fragment = &specs[0].verbs[0].1;
        assert_eq!(fragment["tags"], json!(["users"]));
        assert_eq!(fragment["components"]["schemas"]["User"], json!({"type": "object"}));
        assert!(fragment.get("summary").is_none());
        assert!(fragment.get("unrelated").is_none());
        assert!(fragment.get("definitions").is_none());
    }

    #[test]
    fn empty_method_view_is_skipped() {
        let mut table = RouteTable::new();
        table.add(
            "/empty",
            "empty",
            [HttpMethod::Get],
            Handler::MethodView {
                name: "Empty".into(),
                verbs: IndexMap::new(),
                schema_view: None,
            },
        );
        assert!(walk(&table, &WalkOptions::default()).is_empty());
    }

    #[test]
    fn unresolvable_verb_is_fatal() {
        let mut verbs = IndexMap::new();
        verbs.insert(HttpMethod::Get, ViewDoc::new("get"));
        let mut table = RouteTable::new();
        table.add(
            "/half",
            "half",
            [HttpMethod::Get, HttpMethod::Post],
            Handler::MethodView {
                name: "Half".into(),
                verbs,
                schema_view: None,
            },
        );
        let err = walk_routes(&table, |_| true, &WalkOptions::default()).unwrap_err();
        assert!(matches!(err, SpecError::UnresolvedHandler(rule) if rule == "/half"));
    }

    #[test]
    fn doc_dir_sidecar_is_preferred() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("PetAPI")).unwrap();
        std::fs::write(dir.path().join("PetAPI").join("get.yml"), "tags: [sidecar]").unwrap();

        let mut verbs = IndexMap::new();
        verbs.insert(HttpMethod::Get, ViewDoc::new("get").with_doc("Doc\n---\ntags: [doc]"));
        let mut table = RouteTable::new();
        table.add(
            "/pets",
            "pets",
            [HttpMethod::Get],
            Handler::MethodView {
                name: "PetAPI".into(),
                verbs,
                schema_view: None,
            },
        );
        let options = WalkOptions {
            doc_dir: Some(dir.path().to_path_buf()),
            ..WalkOptions::default()
        };

        let specs = walk(&table, &options);
        assert_eq!(specs[0].verbs[0].1["tags"], json!(["sidecar"]));
    }

    #[test]
    fn filter_excludes_routes() {
        let mut table = RouteTable::new();
        table.add(
            "/a",
            "a",
            [HttpMethod::Get],
            Handler::Function(ViewDoc::new("a").with_doc("A\n---\ntags: [a]")),
        );
        let specs = walk_routes(&table, |r| r.rule != "/a", &WalkOptions::default()).unwrap();
        assert!(specs.is_empty());
    }
}
