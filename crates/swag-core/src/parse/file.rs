use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::ParseError;

/// Marker that turns a documentation text into a sidecar reference.
pub const FILE_MARKER: &str = "file:";

/// Loads sidecar fragment files, trying alternate locations for relative paths.
#[derive(Debug, Clone, Default)]
pub struct FileLoader {
    /// Extra directories searched after the declaring root, in order.
    search_roots: Vec<PathBuf>,
}

impl FileLoader {
    pub fn new(search_roots: Vec<PathBuf>) -> Self {
        Self { search_roots }
    }

    /// Load a YAML sidecar. Only `yml`/`yaml` extensions are accepted.
    ///
    /// A file missing or undecodable at every candidate location is logged
    /// and yields an empty text.
    pub fn load(&self, path: &Path, root: Option<&Path>) -> Result<String, ParseError> {
        ensure_yaml_extension(path)?;
        self.load_any(path, root)
    }

    /// Load a sidecar without checking its extension.
    pub fn load_any(&self, path: &Path, root: Option<&Path>) -> Result<String, ParseError> {
        for candidate in self.candidates(path, root) {
            let bytes = match fs::read(&candidate) {
                Ok(bytes) => bytes,
                Err(e) => {
                    debug!("sidecar candidate {} unreadable: {}", candidate.display(), e);
                    continue;
                }
            };
            match decode(&bytes, &candidate) {
                Ok(text) => {
                    debug!("loaded sidecar {}", candidate.display());
                    return Ok(text);
                }
                Err(e) => warn!("skipping sidecar {}: {}", candidate.display(), e),
            }
        }
        warn!(
            "file path {} either doesn't exist or is of the wrong type",
            path.display()
        );
        Ok(String::new())
    }

    fn candidates(&self, path: &Path, root: Option<&Path>) -> Vec<PathBuf> {
        let mut out = vec![path.to_path_buf()];
        if path.is_relative() {
            out.extend(root.map(|r| r.join(path)));
            out.extend(self.search_roots.iter().map(|r| r.join(path)));
        }
        out
    }
}

/// Reject sidecars that are not YAML.
pub fn ensure_yaml_extension(path: &Path) -> Result<(), ParseError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    match extension {
        "yml" | "yaml" => Ok(()),
        other => Err(ParseError::UnsupportedFileType {
            path: path.to_path_buf(),
            extension: other.to_string(),
        }),
    }
}

/// Extract the path from a `file: some/doc.yml` documentation text.
pub fn path_from_marker(doc: &str) -> Option<PathBuf> {
    let rest = doc.trim_start().strip_prefix(FILE_MARKER)?;
    Some(PathBuf::from(rest.trim()))
}

/// Decode file contents using the encoding announced by its byte-order mark.
pub fn decode(bytes: &[u8], path: &Path) -> Result<String, ParseError> {
    let invalid = || ParseError::Encoding(path.to_path_buf());

    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE, 0x00, 0x00]) {
        return decode_utf32(rest, u32::from_le_bytes).ok_or_else(invalid);
    }
    if let Some(rest) = bytes.strip_prefix(&[0x00, 0x00, 0xFE, 0xFF]) {
        return decode_utf32(rest, u32::from_be_bytes).ok_or_else(invalid);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8(rest.to_vec()).map_err(|_| invalid());
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        return decode_utf16(rest, u16::from_le_bytes).ok_or_else(invalid);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        return decode_utf16(rest, u16::from_be_bytes).ok_or_else(invalid);
    }
    String::from_utf8(bytes.to_vec()).map_err(|_| invalid())
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Option<String> {
    if bytes.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| unit([c[0], c[1]]))
        .collect();
    String::from_utf16(&units).ok()
}

fn decode_utf32(bytes: &[u8], unit: fn([u8; 4]) -> u32) -> Option<String> {
    if bytes.len() % 4 != 0 {
        return None;
    }
    bytes
        .chunks_exact(4)
        .map(|c| char::from_u32(unit([c[0], c[1], c[2], c[3]])))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_yaml_extensions() {
        let err = ensure_yaml_extension(Path::new("spec.json")).unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedFileType { extension, .. } if extension == "json"));
        assert!(ensure_yaml_extension(Path::new("a/b.yml")).is_ok());
        assert!(ensure_yaml_extension(Path::new("a/b.yaml")).is_ok());
    }

    #[test]
    fn marker_path_is_trimmed() {
        assert_eq!(
            path_from_marker("file: docs/pets.yml\n"),
            Some(PathBuf::from("docs/pets.yml"))
        );
        assert_eq!(path_from_marker("Just text"), None);
    }

    #[test]
    fn decodes_byte_order_marks() {
        let p = Path::new("x.yml");
        assert_eq!(decode(b"\xEF\xBB\xBFa: 1", p).unwrap(), "a: 1");
        assert_eq!(decode(&[0xFF, 0xFE, b'a', 0, b':', 0], p).unwrap(), "a:");
        assert_eq!(decode(&[0xFE, 0xFF, 0, b'a'], p).unwrap(), "a");
        assert_eq!(
            decode(&[0xFF, 0xFE, 0, 0, b'z', 0, 0, 0], p).unwrap(),
            "z"
        );
        assert_eq!(decode(b"plain", p).unwrap(), "plain");
    }

    #[test]
    fn relative_paths_fall_back_to_root_then_search_roots() {
        let root = tempfile::tempdir().unwrap();
        let extra = tempfile::tempdir().unwrap();
        fs::write(extra.path().join("shared.yml"), "tags: [shared]").unwrap();
        fs::write(root.path().join("local.yml"), "tags: [local]").unwrap();

        let loader = FileLoader::new(vec![extra.path().to_path_buf()]);
        let local = loader.load(Path::new("local.yml"), Some(root.path())).unwrap();
        assert_eq!(local, "tags: [local]");
        let shared = loader.load(Path::new("shared.yml"), Some(root.path())).unwrap();
        assert_eq!(shared, "tags: [shared]");
    }

    #[test]
    fn undecodable_file_yields_empty_text() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.yml"), b"tags: [\xff\xfe\xfd]").unwrap();
        let loader = FileLoader::default();
        let text = loader.load(Path::new("bad.yml"), Some(dir.path())).unwrap();
        assert!(text.is_empty());
    }

    #[test]
    fn missing_file_yields_empty_text() {
        let loader = FileLoader::default();
        let text = loader.load(Path::new("does/not/exist.yml"), None).unwrap();
        assert!(text.is_empty());
    }
}
