use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported file type '{extension}' for {path}: only yaml or yml supported")]
    UnsupportedFileType { path: PathBuf, extension: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("import nesting deeper than {depth} levels while importing {path}")]
    ImportDepthExceeded { path: String, depth: usize },

    #[error("invalid text encoding in {0}")]
    Encoding(PathBuf),

    #[error("fragment root must be a mapping, got {0}")]
    NotAMapping(String),
}

#[derive(Debug, Error)]
pub enum SpecError {
    #[error("can't find specs by endpoint {name}, check your config (possible values: {})", .available.join(", "))]
    UnknownDocument {
        name: String,
        available: Vec<String>,
    },

    #[error("cannot detect view function for rule {0}")]
    UnresolvedHandler(String),

    #[error("specified schema_id '{0}' not found")]
    SchemaNotFound(String),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("no schema could be selected for validation")]
    NoSchema,

    #[error("schema '{0}' not found in specs")]
    SchemaNotFound(String),

    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("validation failed: {}", .0.join("; "))]
    Rejected(Vec<String>),

    #[error("spec error: {0}")]
    Spec(#[from] SpecError),
}
