//! Repository-level error types.
//!
//! Every failure is recoverable by the caller and names the file, branch
//! or id involved so the CLI can print it as-is.

use std::path::PathBuf;

use thiserror::Error;

use crate::storage::{BranchName, FileName, InvalidNameError, StorageError};

/// Result type for repository operations.
pub type RepoResult<T> = Result<T, RepoError>;

/// Errors raised by staging, commit, checkout and merge.
#[derive(Debug, Error)]
pub enum RepoError {
    /// Storage layer error.
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("please enter a commit message")]
    EmptyMessage,

    #[error("no changes added to the commit")]
    NothingToCommit,

    #[error("no reason to remove the file '{0}'")]
    NothingToRemove(FileName),

    #[error("file '{0}' does not exist")]
    FileNotFound(FileName),

    #[error("file '{0}' does not exist in that commit")]
    FileNotInCommit(FileName),

    #[error("there is an untracked file in the way: '{0}'; delete it, or add and commit it first")]
    UntrackedFileWouldBeOverwritten(FileName),

    #[error("you have uncommitted changes")]
    UncommittedChanges,

    #[error("a branch named '{0}' does not exist")]
    UnknownBranch(BranchName),

    #[error("cannot merge branch '{0}' with itself")]
    SelfMerge(BranchName),

    #[error("found no commit with message {0:?}")]
    NoCommitWithMessage(String),

    #[error("invalid name: {0}")]
    InvalidName(#[from] InvalidNameError),

    /// Working-directory I/O error.
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The error taxonomy surfaced to users, independent of which layer raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    AmbiguousOrNotFound,
    EmptyMessage,
    NothingToCommit,
    NothingToRemove,
    FileNotFound,
    FileNotInCommit,
    UntrackedFileWouldBeOverwritten,
    UncommittedChanges,
    UnknownBranch,
    SelfMerge,
    CannotDeleteActive,
    InvalidName,
    IoError,
    Other,
}

impl ErrorKind {
    /// Classify a storage-layer error.
    pub fn of_storage(error: &StorageError) -> Self {
        match error {
            StorageError::ObjectNotFound { .. }
            | StorageError::BranchNotFound(_)
            | StorageError::NotInitialized(_) => ErrorKind::NotFound,
            StorageError::BranchAlreadyExists(_) | StorageError::AlreadyInitialized(_) => {
                ErrorKind::AlreadyExists
            }
            StorageError::CannotDeleteActive(_) => ErrorKind::CannotDeleteActive,
            StorageError::AmbiguousOrNotFound(_) => ErrorKind::AmbiguousOrNotFound,
            StorageError::InvalidName(_) => ErrorKind::InvalidName,
            StorageError::Io(_) | StorageError::Persist(_) => ErrorKind::IoError,
            StorageError::Git(_)
            | StorageError::Serialization(_)
            | StorageError::CorruptedData { .. } => ErrorKind::Other,
        }
    }
}

impl RepoError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RepoError::Storage(e) => ErrorKind::of_storage(e),
            RepoError::EmptyMessage => ErrorKind::EmptyMessage,
            RepoError::NothingToCommit => ErrorKind::NothingToCommit,
            RepoError::NothingToRemove(_) => ErrorKind::NothingToRemove,
            RepoError::FileNotFound(_) => ErrorKind::FileNotFound,
            RepoError::FileNotInCommit(_) => ErrorKind::FileNotInCommit,
            RepoError::UntrackedFileWouldBeOverwritten(_) => {
                ErrorKind::UntrackedFileWouldBeOverwritten
            }
            RepoError::UncommittedChanges => ErrorKind::UncommittedChanges,
            RepoError::UnknownBranch(_) => ErrorKind::UnknownBranch,
            RepoError::SelfMerge(_) => ErrorKind::SelfMerge,
            RepoError::NoCommitWithMessage(_) => ErrorKind::NotFound,
            RepoError::InvalidName(_) => ErrorKind::InvalidName,
            RepoError::Io { .. } => ErrorKind::IoError,
        }
    }
}
