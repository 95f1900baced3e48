//! Containment of caller-supplied paths inside fixed, named roots.
//!
//! Two grammars are accepted: nested relative paths for directory browsing and
//! bare file names for previews. Both end in the same canonical containment
//! check, so a symlink can never carry a resolved path outside its root.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error("sandbox root `{0}` is not configured")]
    RootNotConfigured(String),
    #[error("path `{path}` is rejected: {reason}")]
    InvalidPath { path: String, reason: String },
    #[error("path `{path}` does not exist under root `{root}`")]
    Missing { root: String, path: String },
    #[error("path `{path}` resolves outside root `{root}`")]
    Escape { root: String, path: String },
    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl SandboxError {
    pub fn is_missing(&self) -> bool {
        matches!(self, SandboxError::Missing { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxRoot {
    name: String,
    canonical: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxedPath {
    pub root: String,
    /// Normalized `/`-joined path relative to the root; empty for the root itself.
    pub relative: String,
    pub absolute: PathBuf,
}

impl SandboxRoot {
    pub fn new(name: &str, path: &Path) -> Result<Self, SandboxError> {
        if !path.is_absolute() {
            return Err(SandboxError::InvalidPath {
                path: path.display().to_string(),
                reason: "sandbox root must be absolute".to_string(),
            });
        }
        let canonical = fs::canonicalize(path).map_err(|err| io_error(path, err))?;
        Ok(Self {
            name: name.to_string(),
            canonical,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.canonical
    }

    /// Resolves a nested relative path such as `src/modules`.
    pub fn resolve_nested(&self, requested: &str) -> Result<SandboxedPath, SandboxError> {
        let segments = normalize_relative_path(requested)?;
        let mut candidate = self.canonical.clone();
        for segment in &segments {
            candidate.push(segment);
        }
        let absolute = self.contain(requested, &candidate)?;
        Ok(SandboxedPath {
            root: self.name.clone(),
            relative: segments.join("/"),
            absolute,
        })
    }

    /// Resolves a single file name with no directory component.
    pub fn resolve_file_name(&self, name: &str) -> Result<SandboxedPath, SandboxError> {
        validate_bare_name(name)?;
        let candidate = self.canonical.join(name);
        let absolute = self.contain(name, &candidate)?;
        Ok(SandboxedPath {
            root: self.name.clone(),
            relative: name.to_string(),
            absolute,
        })
    }

    fn contain(&self, requested: &str, candidate: &Path) -> Result<PathBuf, SandboxError> {
        let canonical = match fs::canonicalize(candidate) {
            Ok(canonical) => canonical,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(SandboxError::Missing {
                    root: self.name.clone(),
                    path: requested.to_string(),
                })
            }
            Err(err) if err.kind() == std::io::ErrorKind::PermissionDenied => {
                return Err(io_error(candidate, err))
            }
            // Symlink loops, non-directory prefixes and the like fail closed.
            Err(err) => {
                return Err(SandboxError::InvalidPath {
                    path: requested.to_string(),
                    reason: format!("path cannot be resolved: {err}"),
                })
            }
        };
        if !canonical.starts_with(&self.canonical) {
            return Err(SandboxError::Escape {
                root: self.name.clone(),
                path: requested.to_string(),
            });
        }
        Ok(canonical)
    }
}

/// The fixed set of roots built once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SandboxRoots {
    roots: BTreeMap<String, SandboxRoot>,
}

impl SandboxRoots {
    pub fn from_config(configured: &BTreeMap<String, PathBuf>) -> Result<Self, SandboxError> {
        let mut roots = BTreeMap::new();
        for (name, path) in configured {
            roots.insert(name.clone(), SandboxRoot::new(name, path)?);
        }
        Ok(Self { roots })
    }

    pub fn get(&self, name: &str) -> Result<&SandboxRoot, SandboxError> {
        self.roots
            .get(name)
            .ok_or_else(|| SandboxError::RootNotConfigured(name.to_string()))
    }

    /// Looks up several roots, keeping the caller's order.
    pub fn ordered(&self, names: &[String]) -> Result<Vec<&SandboxRoot>, SandboxError> {
        names.iter().map(|name| self.get(name)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SandboxRoot> {
        self.roots.values()
    }
}

fn normalize_relative_path(requested: &str) -> Result<Vec<String>, SandboxError> {
    if requested.contains('\0') {
        return Err(invalid(requested, "path contains a NUL byte"));
    }
    let path = Path::new(requested);
    let mut segments = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(value) => {
                let value = value
                    .to_str()
                    .ok_or_else(|| invalid(requested, "path is not valid UTF-8"))?;
                segments.push(value.to_string());
            }
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(invalid(requested, "parent directory segments are not allowed"))
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(invalid(requested, "path must be relative"))
            }
        }
    }
    Ok(segments)
}

fn validate_bare_name(name: &str) -> Result<(), SandboxError> {
    if name.is_empty() {
        return Err(invalid(name, "file name must be non-empty"));
    }
    if name == "." || name == ".." {
        return Err(invalid(name, "file name must not be a directory reference"));
    }
    if name.contains(['/', '\\', '\0']) {
        return Err(invalid(name, "file name must not contain separators"));
    }
    Ok(())
}

fn invalid(path: &str, reason: &str) -> SandboxError {
    SandboxError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

fn io_error(path: &Path, source: std::io::Error) -> SandboxError {
    SandboxError::Io {
        path: path.display().to_string(),
        source,
    }
}
