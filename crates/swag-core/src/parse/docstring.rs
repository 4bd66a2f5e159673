use std::path::Path;

use log::{debug, warn};

use super::file::{FileLoader, path_from_marker};
use super::imports::resolve_imports;
use super::sanitizer::Sanitizer;
use crate::JsonMap;
use crate::error::ParseError;
use crate::routes::ViewDoc;

/// What one description source says about an operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedDoc {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub fragment: Option<JsonMap>,
}

impl ParsedDoc {
    pub fn is_empty(&self) -> bool {
        self.summary.is_none() && self.description.is_none() && self.fragment.is_none()
    }
}

/// Documentation text plus whether it came from a dedicated file.
struct DocText {
    text: String,
    from_file: bool,
}

/// Parse the description of `view` for one `(endpoint, verb)` pair.
///
/// Sources are tried in order: `sidecar` (a documentation-directory file),
/// the view's per-key sidecars (`{endpoint}_{verb}`, `{endpoint}`, `{verb}`),
/// its single sidecar, then its documentation text. Malformed YAML is logged
/// and yields no fragment; an unsupported sidecar extension is an error.
pub fn parse_docstring(
    view: &ViewDoc,
    sanitizer: &Sanitizer,
    endpoint: &str,
    verb: &str,
    sidecar: Option<&Path>,
    loader: &FileLoader,
) -> Result<ParsedDoc, ParseError> {
    let Some(doc) = doc_text(view, endpoint, verb, sidecar, loader)? else {
        return Ok(ParsedDoc::default());
    };
    let doc = follow_file_marker(doc, view.root(), loader)?;
    if doc.text.trim().is_empty() {
        return Ok(ParsedDoc::default());
    }

    let (text, imports_ok) = match resolve_imports(&doc.text, view.root(), loader) {
        Ok(text) => (text, true),
        Err(e) => {
            warn!("skipping fragment of {endpoint} {verb}: {e}");
            (doc.text, false)
        }
    };

    let mut parsed = ParsedDoc::default();
    match split_at_separator(&text) {
        Some((head, tail)) => {
            if let Some((first, rest)) = head.split_once('\n') {
                parsed.summary = sanitized(first, sanitizer);
                parsed.description = sanitized(rest, sanitizer);
            } else {
                parsed.summary = sanitized(head, sanitizer);
            }
            if imports_ok {
                parsed.fragment = parse_fragment(tail, endpoint);
            }
        }
        None if doc.from_file => {
            if imports_ok {
                parsed.fragment = parse_fragment(&text, endpoint);
            }
        }
        None => {
            let summary = text.trim();
            parsed.summary = (!summary.is_empty()).then(|| summary.to_string());
        }
    }
    Ok(parsed)
}

/// Parse the documentation text of a definition model.
///
/// Text before the separator becomes the description; the structured part
/// after it is the definition body.
pub fn parse_definition_doc(
    doc: &str,
    sanitizer: &Sanitizer,
    root: Option<&Path>,
    loader: &FileLoader,
) -> Result<ParsedDoc, ParseError> {
    let doc = follow_file_marker(
        DocText {
            text: doc.to_string(),
            from_file: false,
        },
        root,
        loader,
    )?;

    let mut parsed = ParsedDoc::default();
    match split_at_separator(&doc.text) {
        Some((head, tail)) => {
            parsed.description = sanitized(head, sanitizer);
            parsed.fragment = parse_fragment(tail, "definition");
        }
        None if doc.from_file => parsed.fragment = parse_fragment(&doc.text, "definition"),
        None => parsed.description = sanitized(&doc.text, sanitizer),
    }
    Ok(parsed)
}

fn doc_text(
    view: &ViewDoc,
    endpoint: &str,
    verb: &str,
    sidecar: Option<&Path>,
    loader: &FileLoader,
) -> Result<Option<DocText>, ParseError> {
    let from_file = |path: &Path| -> Result<Option<DocText>, ParseError> {
        let text = loader.load(path, view.root())?;
        Ok(Some(DocText {
            text,
            from_file: true,
        }))
    };

    if let Some(path) = sidecar {
        debug!("using documentation directory sidecar {}", path.display());
        return from_file(path);
    }
    let keyed = [format!("{endpoint}_{verb}"), endpoint.to_string(), verb.to_string()];
    if let Some(path) = keyed.iter().find_map(|key| view.swag_paths.get(key)) {
        return from_file(path);
    }
    if let Some(path) = &view.swag_path {
        return from_file(path);
    }
    Ok(view.doc.as_ref().map(|text| DocText {
        text: text.clone(),
        from_file: false,
    }))
}

fn follow_file_marker(
    doc: DocText,
    root: Option<&Path>,
    loader: &FileLoader,
) -> Result<DocText, ParseError> {
    match path_from_marker(&doc.text) {
        Some(path) => {
            let path = match root {
                Some(root) if path.is_relative() => root.join(path),
                _ => path,
            };
            Ok(DocText {
                text: loader.load(&path, root)?,
                from_file: true,
            })
        }
        None => Ok(doc),
    }
}

/// Split around the first line consisting of `---`.
fn split_at_separator(text: &str) -> Option<(&str, &str)> {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if line.trim_end_matches(['\n', '\r']) == "---" {
            return Some((&text[..offset], &text[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

fn sanitized(text: &str, sanitizer: &Sanitizer) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| sanitizer.apply(text))
}

fn parse_fragment(text: &str, context: &str) -> Option<JsonMap> {
    match super::from_yaml(text) {
        Ok(fragment) => fragment,
        Err(e) => {
            warn!("ignoring malformed fragment for {context}: {e}");
            None
        }
    }
}
