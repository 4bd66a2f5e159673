use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_yaml_ng::Value as YamlValue;

use swag_core::config::load_template;
use swag_core::parse::yaml;
use swag_core::{
    ApiDocs, DefinitionModel, DocsConfig, Handler, HttpMethod, JsonMap, RouteTable, SpecNode,
    ViewDoc,
};

/// Default manifest file name.
pub const MANIFEST_FILE_NAME: &str = "swag.yaml";

/// A description of an application's routes and documentation settings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Manifest {
    pub config: DocsConfig,
    /// Inline template object or path to a YAML/JSON template file.
    pub template: Option<TemplateSource>,
    /// Directory relative sidecar paths resolve against; defaults to the
    /// manifest's directory.
    pub root: Option<PathBuf>,
    pub search_roots: Vec<PathBuf>,
    pub definitions: Vec<ManifestDefinition>,
    pub routes: Vec<ManifestRoute>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TemplateSource {
    File(PathBuf),
    Inline(JsonMap),
}

#[derive(Debug, Deserialize)]
pub struct ManifestDefinition {
    pub name: String,
    pub doc: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ManifestRoute {
    pub rule: String,
    pub endpoint: String,
    #[serde(default = "default_methods")]
    pub methods: Vec<HttpMethod>,
    #[serde(default)]
    pub handler: ManifestHandler,
}

fn default_methods() -> Vec<HttpMethod> {
    vec![HttpMethod::Get]
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ManifestHandler {
    Function(ManifestView),
    Dispatch {
        name: String,
        #[serde(default)]
        methods: Option<BTreeSet<HttpMethod>>,
        #[serde(default)]
        view: ManifestView,
    },
    MethodView {
        name: String,
        #[serde(default)]
        verbs: IndexMap<HttpMethod, ManifestView>,
        /// Class attributes: parameters, responses, summary, ...
        #[serde(default)]
        attributes: Option<YamlValue>,
    },
}

/// YAML keys such as response codes become strings.
fn spec_node(value: YamlValue) -> SpecNode {
    SpecNode::from(yaml::to_json(value))
}

impl Default for ManifestHandler {
    fn default() -> Self {
        ManifestHandler::Function(ManifestView::default())
    }
}

/// Documentation sources of one callable.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ManifestView {
    pub name: Option<String>,
    pub doc: Option<String>,
    pub file: Option<PathBuf>,
    /// Sidecars keyed by `{endpoint}_{verb}`, `{endpoint}` or `{verb}`.
    pub files: IndexMap<String, PathBuf>,
    pub specs: Option<YamlValue>,
    pub root: Option<PathBuf>,
}

impl ManifestView {
    fn into_view_doc(self, default_name: &str, root: &Path) -> ViewDoc {
        let mut view = ViewDoc::new(self.name.unwrap_or_else(|| default_name.to_string()));
        view.doc = self.doc;
        view.swag_path = self.file;
        view.swag_paths = self.files;
        view.specs_dict = self.specs.map(spec_node);
        view.root_path = Some(self.root.map_or_else(|| root.to_path_buf(), |r| root.join(r)));
        view
    }
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest {}", path.display()))?;
        serde_yaml_ng::from_str(&content)
            .with_context(|| format!("failed to parse manifest {}", path.display()))
    }

    /// Build the documentation registry, resolving relative paths against `base`.
    pub fn into_docs(self, base: &Path) -> Result<ApiDocs> {
        let root = self.root.map_or_else(|| base.to_path_buf(), |r| base.join(r));

        let mut table = RouteTable::new();
        for route in self.routes {
            let handler = match route.handler {
                ManifestHandler::Function(view) => {
                    Handler::Function(view.into_view_doc(&route.endpoint, &root))
                }
                ManifestHandler::Dispatch {
                    name,
                    methods,
                    view,
                } => Handler::Dispatch {
                    view: view.into_view_doc("dispatch_request", &root),
                    name,
                    methods,
                },
                ManifestHandler::MethodView {
                    name,
                    verbs,
                    attributes,
                } => Handler::MethodView {
                    verbs: verbs
                        .into_iter()
                        .map(|(verb, view)| (verb, view.into_view_doc(verb.key(), &root)))
                        .collect(),
                    schema_view: attributes.map(spec_node),
                    name,
                },
            };
            table.add(&route.rule, &route.endpoint, route.methods, handler);
        }

        let search_roots = self.search_roots.iter().map(|r| base.join(r)).collect();
        let mut docs = ApiDocs::new(self.config, table).with_search_roots(search_roots);

        match self.template {
            Some(TemplateSource::File(path)) => {
                let path = base.join(path);
                let template = load_template(&path)
                    .with_context(|| format!("failed to load template {}", path.display()))?;
                docs = docs.with_template(template);
            }
            Some(TemplateSource::Inline(template)) => docs = docs.with_template(template),
            None => {}
        }

        for definition in self.definitions {
            docs = docs.with_definition(
                DefinitionModel::new(definition.name, definition.doc)
                    .with_tags(definition.tags)
                    .with_root(root.clone()),
            );
        }
        Ok(docs)
    }
}

/// Generate the default manifest content.
pub fn default_manifest_content() -> &'static str {
    r#"# swag manifest
config:
  title: My API
  version: 0.0.1
  # openapi: 3.0.2          # emit an OpenAPI 3 document instead of Swagger 2.0
  # prefix_ids: false       # prefix hoisted definitions with {endpoint}_{verb}_
  # doc_dir: docs           # look for {doc_dir}/{function}.yml sidecars
  specs:
    - endpoint: apispec_1
      route: /apispec_1.json

# template: template.yml    # or an inline mapping applied over the document

routes:
  - rule: /hello/<name>
    endpoint: hello
    methods: [GET]
    handler:
      kind: function
      doc: |
        Say hello
        ---
        parameters:
          - name: name
            in: path
            type: string
            required: true
        responses:
          200:
            description: a greeting
"#
}
