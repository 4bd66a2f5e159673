use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use super::file::FileLoader;
use crate::error::ParseError;

/// Deepest chain of nested `import:` directives that is followed.
pub const MAX_IMPORT_DEPTH: usize = 16;

static IMPORT_DIRECTIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"import: "(.*)""#).expect("import regex should be valid"));

/// Splice every `import: "path"` directive in `text` with the referenced file.
///
/// Imported text is re-indented to the column the directive starts at, and
/// directives inside imported text are resolved against the same root.
pub fn resolve_imports(
    text: &str,
    root: Option<&Path>,
    loader: &FileLoader,
) -> Result<String, ParseError> {
    resolve(text, root, loader, 0)
}

fn resolve(
    text: &str,
    root: Option<&Path>,
    loader: &FileLoader,
    depth: usize,
) -> Result<String, ParseError> {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for caps in IMPORT_DIRECTIVE.captures_iter(text) {
        let (Some(whole), Some(target)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if depth >= MAX_IMPORT_DEPTH {
            return Err(ParseError::ImportDepthExceeded {
                path: target.as_str().to_string(),
                depth: MAX_IMPORT_DEPTH,
            });
        }

        let line_start = text[..whole.start()].rfind('\n').map_or(0, |i| i + 1);
        let indent = " ".repeat(whole.start() - line_start);

        let path = PathBuf::from(target.as_str());
        let imported = if path.is_absolute() {
            loader.load_any(&path, None)?
        } else {
            loader.load_any(&path, root)?
        };
        let imported = resolve(&imported, root, loader, depth + 1)?;

        out.push_str(&text[last..whole.start()]);
        out.push_str(&imported.replace('\n', &format!("\n{indent}")));
        last = whole.end();
    }

    out.push_str(&text[last..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn text_without_directives_is_unchanged() {
        let text = "tags:\n  - pets\n";
        let out = resolve_imports(text, None, &FileLoader::default()).unwrap();
        assert_eq!(out, text);
    }

    #[test]
    fn import_is_reindented_to_directive_column() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("pet.yml"), "type: object\nproperties: {}").unwrap();

        let text = "schema:\n  import: \"pet.yml\"\n";
        let out = resolve_imports(text, Some(dir.path()), &FileLoader::default()).unwrap();
        assert_eq!(out, "schema:\n  type: object\n  properties: {}\n");
    }

    #[test]
    fn nested_imports_are_resolved() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("outer.yml"), "a:\n  import: \"inner.yml\"").unwrap();
        fs::write(dir.path().join("inner.yml"), "b: 1\nc: 2").unwrap();

        let text = "root:\n  import: \"outer.yml\"";
        let out = resolve_imports(text, Some(dir.path()), &FileLoader::default()).unwrap();
        assert_eq!(out, "root:\n  a:\n    b: 1\n    c: 2");
    }

    #[test]
    fn cyclic_imports_hit_the_depth_limit() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("loop.yml"), "x:\n  import: \"loop.yml\"").unwrap();

        let err = resolve_imports("import: \"loop.yml\"", Some(dir.path()), &FileLoader::default())
            .unwrap_err();
        assert!(matches!(err, ParseError::ImportDepthExceeded { depth: MAX_IMPORT_DEPTH, .. }));
    }

    #[test]
    fn absolute_import_paths_ignore_root() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("abs.yml");
        fs::write(&file, "k: v").unwrap();

        let text = format!("import: \"{}\"", file.display());
        let out = resolve_imports(&text, Some(Path::new("/nowhere")), &FileLoader::default())
            .unwrap();
        assert_eq!(out, "k: v");
    }
}
