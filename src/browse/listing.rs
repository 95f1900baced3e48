use crate::browse::{listing_error, BrowseError};
use crate::sandbox::{SandboxRoot, SandboxedPath};
use serde::Serialize;
use std::fs;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryListing {
    pub current_dir: String,
    pub dirs: Vec<DirectoryEntry>,
    pub files: Vec<DirectoryEntry>,
}

/// Lists the immediate children of `dir`, which must already be resolved
/// against `root`.
///
/// Symlinked entries are re-resolved through the sandbox and dropped when
/// they dangle or point outside the root, so every returned `path` resolves
/// back to an entry inside the root.
pub fn list_directory(
    root: &SandboxRoot,
    dir: &SandboxedPath,
) -> Result<DirectoryListing, BrowseError> {
    let metadata = fs::metadata(&dir.absolute).map_err(|err| listing_error(&dir.absolute, err))?;
    if !metadata.is_dir() {
        return Err(BrowseError::NotADirectory {
            path: dir.relative.clone(),
        });
    }

    let mut dirs = Vec::new();
    let mut files = Vec::new();
    let entries = fs::read_dir(&dir.absolute).map_err(|err| listing_error(&dir.absolute, err))?;
    for entry in entries {
        let entry = entry.map_err(|err| listing_error(&dir.absolute, err))?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if name == "." || name == ".." {
            continue;
        }
        let relative = if dir.relative.is_empty() {
            name.clone()
        } else {
            format!("{}/{}", dir.relative, name)
        };

        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            // Removed between read_dir and stat.
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
            Err(err) => return Err(listing_error(&entry.path(), err)),
        };
        let is_dir = if file_type.is_symlink() {
            let Ok(resolved) = root.resolve_nested(&relative) else {
                continue;
            };
            match fs::metadata(&resolved.absolute) {
                Ok(meta) => meta.is_dir(),
                Err(_) => continue,
            }
        } else {
            file_type.is_dir()
        };

        let item = DirectoryEntry {
            name,
            path: relative,
        };
        if is_dir {
            dirs.push(item);
        } else {
            files.push(item);
        }
    }

    dirs.sort_by(|a, b| a.name.cmp(&b.name));
    files.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(DirectoryListing {
        current_dir: dir.relative.clone(),
        dirs,
        files,
    })
}
