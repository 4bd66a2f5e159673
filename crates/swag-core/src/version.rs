//! Document version policy.
//!
//! Every branch that depends on the targeted document generation goes through
//! [`is_openapi3`], so an absent marker is consistently treated as Swagger 2.0.

/// Returns true when `marker` names an OpenAPI 3.x document.
pub fn is_openapi3(marker: Option<&str>) -> bool {
    marker
        .and_then(|m| m.split('.').next())
        .is_some_and(|major| major == "3")
}

/// The two supported document generations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DocVersion {
    #[default]
    Swagger2,
    OpenApi3,
}

impl DocVersion {
    pub fn from_marker(marker: Option<&str>) -> Self {
        if is_openapi3(marker) {
            DocVersion::OpenApi3
        } else {
            DocVersion::Swagger2
        }
    }

    pub fn is_v3(self) -> bool {
        self == DocVersion::OpenApi3
    }

    /// Prefix of a `$ref` pointing into the shared definitions table.
    pub fn ref_prefix(self) -> &'static str {
        match self {
            DocVersion::Swagger2 => "#/definitions/",
            DocVersion::OpenApi3 => "#/components/schemas/",
        }
    }

    /// Build a `$ref` pointer for the definition `id`.
    pub fn reference(self, id: &str) -> serde_json::Value {
        serde_json::json!({ "$ref": format!("{}{}", self.ref_prefix(), id) })
    }
}
