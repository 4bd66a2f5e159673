pub mod extract;
pub mod merge;
pub mod paths;
pub mod typed_schema;

pub use extract::{Definition, ExtractContext, Extracted, extract_definitions};
pub use merge::merge_specs;
pub use paths::document_path;
pub use typed_schema::{SpecNode, TypedSchema, convert_schemas};
