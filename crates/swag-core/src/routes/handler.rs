use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use super::{HttpMethod, Route};
use crate::error::SpecError;
use crate::transform::typed_schema::SpecNode;

/// The description sources attached to one callable.
#[derive(Debug, Clone, Default)]
pub struct ViewDoc {
    /// Callable name, used to locate sidecar files under `doc_dir`.
    pub name: String,
    /// Documentation text of the callable.
    pub doc: Option<String>,
    /// A pre-attached specs tree, possibly carrying typed schemas.
    pub specs_dict: Option<SpecNode>,
    /// A single sidecar file describing every verb.
    pub swag_path: Option<PathBuf>,
    /// Sidecar files keyed by `{endpoint}_{verb}`, `{endpoint}` or `{verb}`.
    pub swag_paths: IndexMap<String, PathBuf>,
    /// Directory relative sidecar and import paths are resolved against.
    pub root_path: Option<PathBuf>,
}

impl ViewDoc {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn with_specs(mut self, specs: impl Into<SpecNode>) -> Self {
        self.specs_dict = Some(specs.into());
        self
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.swag_path = Some(path.into());
        self
    }

    /// Register a sidecar for a specific endpoint and/or verb key.
    pub fn with_file_for(mut self, key: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.swag_paths.insert(key.into(), path.into());
        self
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root_path = Some(root.into());
        self
    }

    pub fn root(&self) -> Option<&Path> {
        self.root_path.as_deref()
    }
}

/// The shape of a registered view.
#[derive(Debug, Clone)]
pub enum Handler {
    /// A plain function serving every verb of its rule.
    Function(ViewDoc),
    /// A class-based view with a single dispatch entry point.
    Dispatch {
        name: String,
        /// Verbs the view accepts; `None` means `GET` only.
        methods: Option<BTreeSet<HttpMethod>>,
        view: ViewDoc,
    },
    /// A class-based view with one callable per verb.
    MethodView {
        name: String,
        verbs: IndexMap<HttpMethod, ViewDoc>,
        /// Class attributes (parameters, responses, summary, ...) of a
        /// schema-carrying view.
        schema_view: Option<SpecNode>,
    },
}

impl Handler {
    /// Class name for class-based views.
    pub fn view_name(&self) -> Option<&str> {
        match self {
            Handler::Function(_) => None,
            Handler::Dispatch { name, .. } | Handler::MethodView { name, .. } => Some(name),
        }
    }

    pub fn schema_view(&self) -> Option<&SpecNode> {
        match self {
            Handler::MethodView { schema_view, .. } => schema_view.as_ref(),
            _ => None,
        }
    }

    /// Resolve the callable documenting each verb `route` accepts, minus `ignore`.
    ///
    /// A method view with no callable for a declared verb is a misconfiguration,
    /// unless it defines no verbs at all.
    pub fn resolve<'a>(
        &'a self,
        route: &Route,
        ignore: &BTreeSet<HttpMethod>,
    ) -> Result<Vec<(HttpMethod, &'a ViewDoc)>, SpecError> {
        let verbs = route.methods.difference(ignore).copied();
        match self {
            Handler::Function(view) => Ok(verbs.map(|verb| (verb, view)).collect()),
            Handler::Dispatch { methods, view, .. } => Ok(verbs
                .filter(|verb| match methods {
                    Some(accepted) => accepted.contains(verb),
                    None => *verb == HttpMethod::Get,
                })
                .map(|verb| (verb, view))
                .collect()),
            Handler::MethodView { verbs: views, .. } => {
                if views.is_empty() {
                    return Ok(Vec::new());
                }
                verbs
                    .map(|verb| match views.get(&verb) {
                        Some(view) => Ok((verb, view)),
                        None => Err(SpecError::UnresolvedHandler(route.rule.clone())),
                    })
                    .collect()
            }
        }
    }
}
