//! Storage layer error types
//!
//! All errors that can occur while reading or writing the object store and
//! the reference table are defined here, using `thiserror`.

use std::path::PathBuf;

use thiserror::Error;

use crate::storage::types::InvalidNameError;

/// which namespace of the object store an id was looked up in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Blob,
    Commit,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectKind::Blob => write!(f, "blob"),
            ObjectKind::Commit => write!(f, "commit"),
        }
    }
}

/// the main error type for storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// error from the object hashing library
    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    /// no object with that id exists
    #[error("no {kind} with id {id} exists")]
    ObjectNotFound { kind: ObjectKind, id: String },

    /// the branch does not exist
    #[error("no branch named '{0}' exists")]
    BranchNotFound(String),

    /// branch already exists
    #[error("a branch named '{0}' already exists")]
    BranchAlreadyExists(String),

    /// the active branch cannot be deleted
    #[error("cannot remove the current branch '{0}'")]
    CannotDeleteActive(String),

    /// a short id matched no commit, or more than one
    #[error("no unique commit matches id '{0}'")]
    AmbiguousOrNotFound(String),

    /// invalid file or branch name
    #[error("invalid name: {0}")]
    InvalidName(#[from] InvalidNameError),

    /// JSON serialization or deserialization failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// data integrity check failed
    #[error("corrupted data at {path}: {reason}")]
    CorruptedData { path: PathBuf, reason: String },

    /// I/O error (filesystem level)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// an atomic rename of a freshly written file failed
    #[error("could not persist file: {0}")]
    Persist(#[from] tempfile::PersistError),

    /// repo is not initialized
    #[error("not in an initialized gitlet directory: {0}")]
    NotInitialized(PathBuf),

    /// repo metadata directory already present
    #[error("a gitlet version-control system already exists in {0}")]
    AlreadyInitialized(PathBuf),
}

impl StorageError {
    pub(crate) fn blob_not_found(id: impl ToString) -> Self {
        Self::ObjectNotFound {
            kind: ObjectKind::Blob,
            id: id.to_string(),
        }
    }

    pub(crate) fn commit_not_found(id: impl ToString) -> Self {
        Self::ObjectNotFound {
            kind: ObjectKind::Commit,
            id: id.to_string(),
        }
    }

    /// check if this error indicates the resource doesn't exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StorageError::ObjectNotFound { .. }
                | StorageError::BranchNotFound(_)
                | StorageError::AmbiguousOrNotFound(_)
        )
    }
}

/// result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
