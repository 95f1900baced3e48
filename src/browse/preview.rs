use crate::browse::{read_error, BrowseError};
use crate::sandbox::{SandboxRoot, SandboxedPath};
use std::fs;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewFile {
    pub path: SandboxedPath,
    pub content: Vec<u8>,
}

/// Reads `name` from the first root in `roots` that holds it as a regular file.
///
/// Roots are searched in the given order and the search stops at the first
/// match. A name that is invalid, or that resolves outside its root, fails the
/// whole lookup rather than moving on to the next root.
pub fn read_preview(roots: &[&SandboxRoot], name: &str) -> Result<PreviewFile, BrowseError> {
    for root in roots {
        let path = match root.resolve_file_name(name) {
            Ok(path) => path,
            Err(err) if err.is_missing() => continue,
            Err(err) => return Err(err.into()),
        };
        match fs::metadata(&path.absolute) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => continue,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
            Err(err) => return Err(read_error(&path.absolute, err)),
        }
        let content = match fs::read(&path.absolute) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
            Err(err) => return Err(read_error(&path.absolute, err)),
        };
        return Ok(PreviewFile { path, content });
    }
    Err(BrowseError::NotFound {
        name: name.to_string(),
    })
}
