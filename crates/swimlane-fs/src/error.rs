//! Error types for the filesystem backend.

use std::path::PathBuf;
use swimlane_core::CoreError;
use thiserror::Error;

/// Result type alias for filesystem operations.
pub type Result<T> = std::result::Result<T, FsError>;

/// Errors that can occur in filesystem operations.
#[derive(Debug, Error)]
pub enum FsError {
    /// Workspace not found at the specified path.
    #[error("workspace not found at '{0}'")]
    WorkspaceNotFound(PathBuf),

    /// Workspace already exists.
    #[error("workspace already exists at '{0}'")]
    WorkspaceExists(PathBuf),

    /// A stored document does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Work item already exists.
    #[error("work item already exists: {0}")]
    ItemExists(String),

    /// The stored item has a different version than the one being saved.
    #[error("work item {id} was modified concurrently (expected version {expected}, found {found})")]
    VersionConflict { id: String, expected: u64, found: u64 },

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory walk error.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// YAML parsing error.
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Core library error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),
}

impl From<FsError> for CoreError {
    fn from(err: FsError) -> Self {
        match err {
            FsError::NotFound { kind, id } => Self::NotFound { entity: kind, id },
            FsError::VersionConflict { id, expected, found } => {
                Self::VersionConflict { id, expected, found }
            }
            FsError::Core(inner) => inner,
            other => Self::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swimlane_core::ErrorKind;

    #[test]
    fn test_conversion_keeps_kind() {
        let not_found: CoreError = FsError::NotFound { kind: "board", id: "b1".into() }.into();
        assert_eq!(not_found.kind(), ErrorKind::NotFound);

        let conflict: CoreError = FsError::VersionConflict { id: "i".into(), expected: 1, found: 2 }.into();
        assert_eq!(conflict.kind(), ErrorKind::Conflict);

        let io: CoreError = FsError::Io(std::io::Error::other("disk full")).into();
        assert_eq!(io.kind(), ErrorKind::Internal);
    }
}
