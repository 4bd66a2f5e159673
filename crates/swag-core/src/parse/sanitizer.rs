use std::fmt;
use std::sync::Arc;

/// Transform applied to summary and description text.
#[derive(Clone, Default)]
pub enum Sanitizer {
    /// Leave text untouched.
    None,
    /// Replace line breaks with `<br/>`.
    #[default]
    LineBreak,
    Custom(Arc<dyn Fn(&str) -> String + Send + Sync>),
}

impl Sanitizer {
    pub fn custom(f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Sanitizer::Custom(Arc::new(f))
    }

    pub fn apply(&self, text: &str) -> String {
        match self {
            Sanitizer::None => text.to_string(),
            Sanitizer::LineBreak => text.replace('\n', "<br/>"),
            Sanitizer::Custom(f) => f(text),
        }
    }
}

impl fmt::Debug for Sanitizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sanitizer::None => f.write_str("Sanitizer::None"),
            Sanitizer::LineBreak => f.write_str("Sanitizer::LineBreak"),
            Sanitizer::Custom(_) => f.write_str("Sanitizer::Custom(..)"),
        }
    }
}
