use crate::sandbox::SandboxError;
use std::path::Path;

pub mod listing;
pub mod preview;

pub use listing::{list_directory, DirectoryEntry, DirectoryListing};
pub use preview::{read_preview, PreviewFile};

#[derive(Debug, thiserror::Error)]
pub enum BrowseError {
    #[error(transparent)]
    Sandbox(#[from] SandboxError),
    #[error("`{path}` is not a directory")]
    NotADirectory { path: String },
    #[error("file `{name}` was not found in any preview root")]
    NotFound { name: String },
    #[error("failed to list directory {path}: {source}")]
    Listing {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub(crate) fn listing_error(path: &Path, source: std::io::Error) -> BrowseError {
    BrowseError::Listing {
        path: path.display().to_string(),
        source,
    }
}

pub(crate) fn read_error(path: &Path, source: std::io::Error) -> BrowseError {
    BrowseError::Read {
        path: path.display().to_string(),
        source,
    }
}
