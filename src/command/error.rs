//! Command errors.

use thiserror::Error;

use crate::repo::{ErrorKind, RepoError};
use crate::storage::{InvalidNameError, StorageError};

/// Result type for command execution.
pub type CommandResult<T> = Result<T, CommandError>;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("invalid name: {0}")]
    InvalidName(#[from] InvalidNameError),

    #[error("incorrect operands: {0}")]
    IncorrectOperands(String),
}

impl CommandError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CommandError::Repo(e) => e.kind(),
            CommandError::Storage(e) => ErrorKind::of_storage(e),
            CommandError::InvalidName(_) => ErrorKind::InvalidName,
            CommandError::IncorrectOperands(_) => ErrorKind::Other,
        }
    }
}
