use std::path::PathBuf;

use serde_json::Value;

use crate::JsonMap;
use crate::config::DefinitionFilter;
use crate::error::ParseError;
use crate::parse::{FileLoader, Sanitizer, parse_definition_doc};

/// A named definition registered by the application, documented in prose
/// followed by a structured schema.
#[derive(Debug, Clone)]
pub struct DefinitionModel {
    pub name: String,
    pub doc: String,
    pub tags: Vec<String>,
    pub root_path: Option<PathBuf>,
}

impl DefinitionModel {
    pub fn new(name: impl Into<String>, doc: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: doc.into(),
            tags: Vec::new(),
            root_path: None,
        }
    }

    pub fn with_tags<T: Into<String>>(mut self, tags: impl IntoIterator<Item = T>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root_path = Some(root.into());
        self
    }
}

/// Fold every model accepted by `filter` into `definitions[name]`.
pub(crate) fn apply_models(
    models: &[DefinitionModel],
    filter: &DefinitionFilter,
    sanitizer: &Sanitizer,
    loader: &FileLoader,
    definitions: &mut JsonMap,
) -> Result<(), ParseError> {
    for model in models.iter().filter(|m| filter.matches(&m.tags)) {
        let parsed = parse_definition_doc(&model.doc, sanitizer, model.root_path.as_deref(), loader)?;
        let Some(mut body) = parsed.fragment else {
            continue;
        };
        if let Some(description) = parsed.description {
            body.insert("description".to_string(), Value::String(description));
        }

        let slot = definitions
            .entry(model.name.clone())
            .or_insert_with(|| Value::Object(JsonMap::new()));
        match slot {
            Value::Object(existing) => existing.extend(body),
            other => *other = Value::Object(body),
        }
    }
    Ok(())
}
