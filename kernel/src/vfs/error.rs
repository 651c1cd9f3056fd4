//! Error types shared by the session registry, the path guard and the
//! filesystem operations.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during workspace operations.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// Malformed session id, malformed or escaping path, or oversized content.
    #[error("{0}")]
    Validation(String),
    /// The target of a read, delete or rename does not exist.
    #[error("{0}")]
    NotFound(String),
    /// The operation collides with existing filesystem state.
    #[error("{0}")]
    Conflict(String),
    /// A text read hit content that is not valid UTF-8.
    #[error("{0}")]
    BinaryFile(String),
    /// Underlying filesystem failure.
    #[error("I/O error at '{path}': {source}")]
    Io {
        /// Path the failing call operated on.
        path: PathBuf,
        /// Source error.
        #[source]
        source: std::io::Error,
    },
    /// The zip writer failed while packaging a session root.
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}

/// Coarse classification of [`WorkspaceError`] for callers that map
/// failures onto externally visible outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`WorkspaceError::Validation`].
    Validation,
    /// See [`WorkspaceError::NotFound`].
    NotFound,
    /// See [`WorkspaceError::Conflict`].
    Conflict,
    /// See [`WorkspaceError::BinaryFile`].
    BinaryFile,
    /// Anything else.
    Internal,
}

impl WorkspaceError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Returns the kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::BinaryFile(_) => ErrorKind::BinaryFile,
            Self::Io { .. } | Self::Archive(_) => ErrorKind::Internal,
        }
    }

    /// Stable machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Validation => "workspace_validation_error",
            ErrorKind::NotFound => "workspace_not_found",
            ErrorKind::Conflict => "workspace_conflict",
            ErrorKind::BinaryFile => "workspace_binary_file",
            ErrorKind::Internal => "workspace_error",
        }
    }

    /// HTTP status a transport layer should answer with.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Validation | ErrorKind::BinaryFile => 422,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Internal => 500,
        }
    }
}
