use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::JsonMap;
use crate::error::ParseError;
use crate::parse::{self, FileLoader, imports};
use crate::routes::{HttpMethod, Route};
use crate::version::DocVersion;

/// Name of the document served when nothing else is configured.
pub const DEFAULT_ENDPOINT: &str = "apispec_1";

/// Fields copied from a fragment into its operation object when present.
pub const OPTIONAL_FIELDS: &[&str] = &[
    "tags",
    "consumes",
    "produces",
    "schemes",
    "security",
    "deprecated",
    "operationId",
    "externalDocs",
];

/// Top-level fields passed through from the configuration into v3 documents.
pub const OPTIONAL_OAS3_FIELDS: &[&str] = &["components", "servers"];

/// Application-wide documentation settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DocsConfig {
    /// Independently assembled documents.
    pub specs: Vec<SpecConfig>,
    pub ignore_verbs: BTreeSet<HttpMethod>,
    pub optional_fields: Vec<String>,
    pub optional_oas3_fields: Vec<String>,
    /// OpenAPI version marker; selects v3 output when it starts with `3`.
    pub openapi: Option<String>,
    #[serde(rename = "swagger", alias = "swagger_version")]
    pub swagger_version: Option<String>,
    /// Full `info` object, used verbatim when set.
    pub info: Option<JsonMap>,
    pub title: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "termsOfService")]
    pub terms_of_service: Option<String>,
    pub host: Option<String>,
    #[serde(rename = "basePath")]
    pub base_path: Option<String>,
    pub schemes: Option<Value>,
    #[serde(rename = "securityDefinitions")]
    pub security_definitions: Option<Value>,
    /// Prefix hoisted definition ids with `{endpoint}_{verb}_`.
    pub prefix_ids: bool,
    /// Directory holding `{endpoint}.yml` / `{view}/{callable}.yml` sidecars.
    pub doc_dir: Option<PathBuf>,
    /// Rebuild documents on every request instead of caching them.
    pub invalidate_on_every_call: bool,
    /// Every other key: `servers`, `components`, `x-*` extensions, ...
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            specs: vec![SpecConfig::default()],
            ignore_verbs: [HttpMethod::Head, HttpMethod::Options].into_iter().collect(),
            optional_fields: OPTIONAL_FIELDS.iter().map(|s| s.to_string()).collect(),
            optional_oas3_fields: OPTIONAL_OAS3_FIELDS.iter().map(|s| s.to_string()).collect(),
            openapi: None,
            swagger_version: None,
            info: None,
            title: None,
            version: None,
            description: None,
            terms_of_service: None,
            host: None,
            base_path: None,
            schemes: None,
            security_definitions: None,
            prefix_ids: false,
            doc_dir: None,
            invalidate_on_every_call: false,
            extra: JsonMap::new(),
        }
    }
}

impl DocsConfig {
    pub fn spec(&self, endpoint: &str) -> Option<&SpecConfig> {
        self.specs.iter().find(|s| s.endpoint == endpoint)
    }

    pub fn spec_names(&self) -> Vec<String> {
        self.specs.iter().map(|s| s.endpoint.clone()).collect()
    }

    /// The document version marker as `(key, value)`.
    pub fn version_marker(&self) -> (&'static str, String) {
        match &self.openapi {
            Some(openapi) => ("openapi", openapi.clone()),
            None => (
                "swagger",
                self.swagger_version.clone().unwrap_or_else(|| "2.0".to_string()),
            ),
        }
    }

    pub fn doc_version(&self) -> DocVersion {
        DocVersion::from_marker(self.openapi.as_deref())
    }
}

/// One served document.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpecConfig {
    pub endpoint: String,
    pub route: String,
    pub title: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "termsOfService")]
    pub terms_of_service: Option<String>,
    /// Which routes the document describes.
    #[serde(skip)]
    pub rule_filter: RouteFilter,
    /// Which definition models the document includes, by tags.
    #[serde(skip)]
    pub definition_filter: DefinitionFilter,
}

impl Default for SpecConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT, format!("/{DEFAULT_ENDPOINT}.json"))
    }
}

impl SpecConfig {
    pub fn new(endpoint: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            route: route.into(),
            title: None,
            version: None,
            description: None,
            terms_of_service: None,
            rule_filter: RouteFilter::default(),
            definition_filter: DefinitionFilter::default(),
        }
    }

    pub fn with_rule_filter(mut self, f: impl Fn(&Route) -> bool + Send + Sync + 'static) -> Self {
        self.rule_filter = RouteFilter(Arc::new(f));
        self
    }

    pub fn with_definition_filter(
        mut self,
        f: impl Fn(&[String]) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.definition_filter = DefinitionFilter(Arc::new(f));
        self
    }
}

/// Predicate selecting routes; accepts everything by default.
#[derive(Clone)]
pub struct RouteFilter(Arc<dyn Fn(&Route) -> bool + Send + Sync>);

impl RouteFilter {
    pub fn matches(&self, route: &Route) -> bool {
        (self.0)(route)
    }
}

impl Default for RouteFilter {
    fn default() -> Self {
        RouteFilter(Arc::new(|_| true))
    }
}

impl fmt::Debug for RouteFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RouteFilter(..)")
    }
}

/// Predicate over definition model tags; accepts everything by default.
#[derive(Clone)]
pub struct DefinitionFilter(Arc<dyn Fn(&[String]) -> bool + Send + Sync>);

impl DefinitionFilter {
    pub fn matches(&self, tags: &[String]) -> bool {
        (self.0)(tags)
    }
}

impl Default for DefinitionFilter {
    fn default() -> Self {
        DefinitionFilter(Arc::new(|_| true))
    }
}

impl fmt::Debug for DefinitionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DefinitionFilter(..)")
    }
}

/// Load config from a YAML file. Returns `None` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Option<DocsConfig>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .map_err(|e| format!("failed to read config {}: {}", path.display(), e))?;
    let config: DocsConfig = serde_yaml_ng::from_str(&content)
        .map_err(|e| format!("failed to parse config {}: {}", path.display(), e))?;
    Ok(Some(config))
}

/// Load a document template from a JSON or YAML file.
///
/// YAML templates may use `import:` directives relative to the template's
/// directory. Files with another extension are sniffed by their first
/// character.
pub fn load_template(path: &Path) -> Result<JsonMap, ParseError> {
    let bytes = fs::read(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let text = parse::file::decode(&bytes, path)?;
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();

    let is_json = match extension {
        "json" => true,
        "yml" | "yaml" => false,
        _ => text.trim_start().starts_with(['{', '[']),
    };
    if is_json {
        return parse::from_json(&text);
    }
    let text = imports::resolve_imports(&text, path.parent(), &FileLoader::default())?;
    Ok(parse::from_yaml(&text)?.unwrap_or_default())
}
