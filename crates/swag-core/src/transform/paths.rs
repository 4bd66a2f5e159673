use once_cell::sync::Lazy;
use regex::Regex;

/// Native URL placeholders: `<name>` or `<converter:name>`.
static RULE_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<(?:[^<>]*:)?([^<>]*)>").expect("placeholder regex should be valid")
});

/// Compute the documented path for a native URL rule.
///
/// The UI prefix is prepended, a configured base path is stripped, and every
/// `<converter:name>` placeholder becomes `{name}`.
pub fn document_path(rule: &str, ui_prefix: Option<&str>, base_path: Option<&str>) -> String {
    let mut path = format!("{}{}", ui_prefix.unwrap_or_default(), rule);

    if let Some(base) = base_path {
        let base = base.strip_suffix('/').unwrap_or(base);
        if !base.is_empty() {
            if let Some(stripped) = path.strip_prefix(base) {
                path = stripped.to_string();
            }
        }
    }

    RULE_PLACEHOLDER.replace_all(&path, "{$1}").into_owned()
}
