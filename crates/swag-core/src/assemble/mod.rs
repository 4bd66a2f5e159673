pub mod cache;
pub mod models;
pub mod operations;

use std::path::PathBuf;
use std::sync::Arc;

use indexmap::IndexMap;
use log::{debug, error};
use serde_json::{Value, json};

use crate::JsonMap;
use crate::config::{DocsConfig, SpecConfig};
use crate::error::SpecError;
use crate::parse::{FileLoader, Sanitizer};
use crate::routes::{Route, RouteSource, RouteSpecs, WalkOptions, walk_routes};
use crate::transform::{document_path, merge_specs};
use crate::validate::Validator;

pub use cache::DocumentCache;
pub use models::DefinitionModel;
use operations::DocState;

/// Assembles and caches the documents configured for one application.
pub struct ApiDocs {
    config: DocsConfig,
    template: Option<JsonMap>,
    routes: Box<dyn RouteSource>,
    sanitizer: Sanitizer,
    loader: FileLoader,
    models: Vec<DefinitionModel>,
    cache: DocumentCache,
    pub(crate) validator: Validator,
}

impl ApiDocs {
    pub fn new(config: DocsConfig, routes: impl RouteSource + 'static) -> Self {
        let cache = DocumentCache::new(config.invalidate_on_every_call);
        Self {
            config,
            template: None,
            routes: Box::new(routes),
            sanitizer: Sanitizer::default(),
            loader: FileLoader::default(),
            models: Vec::new(),
            cache,
            validator: Validator::default(),
        }
    }

    /// Top-level keys applied over the computed document.
    pub fn with_template(mut self, template: JsonMap) -> Self {
        self.template = Some(template);
        self
    }

    pub fn with_sanitizer(mut self, sanitizer: Sanitizer) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    /// Directories searched for relative sidecar paths that fail to resolve.
    pub fn with_search_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.loader = FileLoader::new(roots);
        self
    }

    pub fn with_definition(mut self, model: DefinitionModel) -> Self {
        self.models.push(model);
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    pub fn config(&self) -> &DocsConfig {
        &self.config
    }

    pub fn routes(&self) -> &dyn RouteSource {
        self.routes.as_ref()
    }

    pub fn document_names(&self) -> Vec<String> {
        self.config.spec_names()
    }

    /// Drop every cached document.
    pub fn invalidate(&self) {
        self.cache.clear();
    }

    /// Walk every route accepted by `filter` with this application's settings.
    pub fn walk(&self, filter: impl Fn(&Route) -> bool) -> Result<Vec<RouteSpecs>, SpecError> {
        let options =
            WalkOptions::from_config(&self.config, self.sanitizer.clone(), self.loader.clone());
        walk_routes(self.routes.as_ref(), filter, &options)
    }

    /// The document configured under `name`, assembled on first use.
    pub fn assemble(&self, name: &str) -> Result<Arc<Value>, SpecError> {
        let spec = self
            .config
            .spec(name)
            .ok_or_else(|| SpecError::UnknownDocument {
                name: name.to_string(),
                available: self.config.spec_names(),
            })?;

        if let Some(document) = self.cache.get(name) {
            return Ok(document);
        }
        let document = self.build(spec)?;
        Ok(self.cache.store(name, Value::Object(document)))
    }

    fn build(&self, spec: &SpecConfig) -> Result<JsonMap, SpecError> {
        let config = &self.config;
        let version = config.doc_version();
        debug!("assembling document {} ({:?})", spec.endpoint, version);

        let mut data = JsonMap::new();
        data.insert("info".to_string(), self.info(spec));
        data.insert("paths".to_string(), seed(config.extra.get("paths")));
        data.insert("definitions".to_string(), seed(config.extra.get("definitions")));

        let (marker, value) = config.version_marker();
        data.insert(marker.to_string(), Value::String(value));

        if version.is_v3() {
            for key in &config.optional_oas3_fields {
                if let Some(value) = config.extra.get(key).filter(|v| !v.is_null()) {
                    data.insert(key.clone(), value.clone());
                }
            }
        }
        for (key, value) in config.extra.iter().filter(|(k, _)| k.starts_with("x-")) {
            data.insert(key.clone(), value.clone());
        }

        let passthrough = [
            ("host", config.host.clone().map(Value::String)),
            ("basePath", config.base_path.clone().map(Value::String)),
            ("schemes", config.schemes.clone()),
            ("securityDefinitions", config.security_definitions.clone()),
        ];
        for (key, value) in passthrough {
            if let Some(value) = value {
                data.insert(key.to_string(), value);
            }
        }

        if let Some(template) = &self.template {
            data.extend(template.clone());
        }

        let mut paths = take_object(&mut data, "paths");
        let mut state = DocState {
            version,
            prefix_ids: config.prefix_ids,
            optional_fields: config.optional_fields.clone(),
            definitions: take_object(&mut data, "definitions"),
            components: JsonMap::new(),
        };
        if version.is_v3() {
            state.components = take_object(&mut data, "components");
            if let Some(Value::Object(schemas)) = state.components.remove("schemas") {
                state.definitions.extend(schemas);
            }
        }

        models::apply_models(
            &self.models,
            &spec.definition_filter,
            &self.sanitizer,
            &self.loader,
            &mut state.definitions,
        )?;

        let ui_prefix = data.get("swaggerUiPrefix").and_then(Value::as_str);
        let base_path = data.get("basePath").and_then(Value::as_str);

        for RouteSpecs { route, verbs } in self.walk(|r| spec.rule_filter.matches(r))? {
            let mut operations: IndexMap<&'static str, JsonMap> = IndexMap::new();
            for (verb, swag) in &verbs {
                match swag.get("paths").filter(|p| !is_empty(p)) {
                    Some(nested) => match nested_operations(nested, verb.key()) {
                        Ok(fragments) => {
                            for fragment in fragments {
                                let op = state.build_operation(fragment, &route.endpoint, verb.key());
                                operations.insert(verb.key(), op);
                            }
                        }
                        Err(reason) => error!(
                            "skipping malformed paths fragment of {} {} in document {}: {}",
                            verb, route, spec.endpoint, reason
                        ),
                    },
                    None => {
                        let op = state.build_operation(swag, &route.endpoint, verb.key());
                        operations.insert(verb.key(), op);
                    }
                }
            }
            if operations.is_empty() {
                continue;
            }

            let path = document_path(&route.rule, ui_prefix, base_path);
            let item = paths
                .entry(path)
                .or_insert_with(|| Value::Object(JsonMap::new()));
            if !item.is_object() {
                *item = Value::Object(JsonMap::new());
            }
            if let Value::Object(item) = item {
                for (key, operation) in operations {
                    match item.get_mut(key) {
                        Some(Value::Object(existing)) => merge_specs(existing, &operation),
                        _ => {
                            item.insert(key.to_string(), Value::Object(operation));
                        }
                    }
                }
            }
        }

        data.insert("paths".to_string(), Value::Object(paths));
        if version.is_v3() {
            state
                .components
                .insert("schemas".to_string(), Value::Object(state.definitions));
            data.insert("components".to_string(), Value::Object(state.components));
        } else {
            data.insert("definitions".to_string(), Value::Object(state.definitions));
        }
        Ok(data)
    }

    fn info(&self, spec: &SpecConfig) -> Value {
        let config = &self.config;
        if let Some(info) = config.info.as_ref().filter(|i| !i.is_empty()) {
            return Value::Object(info.clone());
        }
        let pick = |own: &Option<String>, shared: &Option<String>, default: &str| {
            own.clone()
                .or_else(|| shared.clone())
                .unwrap_or_else(|| default.to_string())
        };
        json!({
            "version": pick(&spec.version, &config.version, "0.0.1"),
            "title": pick(&spec.title, &config.title, "A swagger API"),
            "description": pick(&spec.description, &config.description, ""),
            "termsOfService": pick(&spec.terms_of_service, &config.terms_of_service, "/tos"),
        })
    }
}

impl std::fmt::Debug for ApiDocs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiDocs")
            .field("config", &self.config)
            .field("template", &self.template)
            .field("models", &self.models)
            .finish_non_exhaustive()
    }
}

/// The operation fragments of a nested `paths` block that belong to `verb`.
fn nested_operations<'a>(nested: &'a Value, verb: &str) -> Result<Vec<&'a JsonMap>, String> {
    let paths = nested
        .as_object()
        .ok_or_else(|| "`paths` is not a mapping".to_string())?;
    let mut fragments = Vec::new();
    for (path, item) in paths {
        let item = item
            .as_object()
            .ok_or_else(|| format!("path item {path} is not a mapping"))?;
        for (path_verb, operation) in item {
            if path_verb != verb {
                continue;
            }
            let operation = operation
                .as_object()
                .ok_or_else(|| format!("operation {path_verb} of {path} is not a mapping"))?;
            fragments.push(operation);
        }
    }
    Ok(fragments)
}

fn seed(value: Option<&Value>) -> Value {
    match value {
        Some(Value::Object(map)) => Value::Object(map.clone()),
        _ => Value::Object(JsonMap::new()),
    }
}

fn take_object(data: &mut JsonMap, key: &str) -> JsonMap {
    match data.remove(key) {
        Some(Value::Object(map)) => map,
        _ => JsonMap::new(),
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}
