//! Error types for swimlane-core.

use thiserror::Error;

/// Result type alias for swimlane operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Coarse classification of a [`CoreError`], surfaced to callers that only
/// need to decide how to report a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    UnknownAction,
    CapabilityMismatch,
    MalformedConfig,
    NotFound,
    Conflict,
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::InvalidArgument => "invalid_argument",
            Self::UnknownAction => "unknown_action",
            Self::CapabilityMismatch => "capability_mismatch",
            Self::MalformedConfig => "malformed_config",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while detecting changes or running actions.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A required argument was missing or inconsistent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An action key has no entry in the registry.
    #[error("unknown action: {0}")]
    UnknownAction(String),

    /// The entity does not have the shape an operation expects.
    #[error("capability mismatch on '{field}': {reason}")]
    CapabilityMismatch { field: String, reason: String },

    /// An action configuration or rule argument could not be decoded.
    #[error("malformed configuration for {target}: {source}")]
    MalformedConfig {
        target: String,
        #[source]
        source: serde_json::Error,
    },

    /// A referenced entity, field or enum definition does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A type definition violates the state/metastate pairing.
    #[error("validation error: {0}")]
    Validation(String),

    /// The stored entity moved on since it was loaded.
    #[error("version conflict on {id}: expected {expected}, found {found}")]
    VersionConflict { id: String, expected: u64, found: u64 },

    /// Generic internal error, typically a persistence failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a [`CoreError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Shorthand for a [`CoreError::CapabilityMismatch`].
    pub fn mismatch(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CapabilityMismatch {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::UnknownAction(_) => ErrorKind::UnknownAction,
            Self::CapabilityMismatch { .. } => ErrorKind::CapabilityMismatch,
            Self::MalformedConfig { .. } | Self::Validation(_) => ErrorKind::MalformedConfig,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::VersionConflict { .. } => ErrorKind::Conflict,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }
}
