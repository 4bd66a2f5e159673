pub mod assemble;
pub mod config;
pub mod error;
pub mod lookup;
pub mod parse;
pub mod routes;
pub mod transform;
pub mod validate;
pub mod version;

pub use assemble::{ApiDocs, DefinitionModel};
pub use config::{DocsConfig, SpecConfig};
pub use error::{ParseError, SpecError, ValidationError};
pub use lookup::find_by_schema_id;
pub use parse::Sanitizer;
pub use routes::{Handler, HttpMethod, Route, RouteSource, RouteTable, ViewDoc};
pub use transform::{SpecNode, TypedSchema};
pub use validate::{Validator, validate_payload};
pub use version::{DocVersion, is_openapi3};

/// A JSON object, the shape of every fragment and assembled document.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;
