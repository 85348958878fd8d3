//! The mutable half of a repository, persisted as one JSON record.
//!
//! Everything that changes between commands (branch heads, the active
//! branch, the staging area) lives here; objects live in the store.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::staging::StagingArea;
use crate::storage::{write_atomic, RefTable, StorageError, StorageResult};

/// Bumped whenever the record layout changes.
pub const STATE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub version: u32,
    pub refs: RefTable,
    pub staging: StagingArea,
}

impl SessionState {
    pub fn new(refs: RefTable) -> Self {
        Self {
            version: STATE_VERSION,
            refs,
            staging: StagingArea::new(),
        }
    }

    /// Load and validate the record at `path`.
    pub fn load(path: &Path) -> StorageResult<Self> {
        let bytes = fs::read(path)?;
        let state: SessionState = serde_json::from_slice(&bytes)?;
        if state.version != STATE_VERSION {
            return Err(StorageError::CorruptedData {
                path: path.to_path_buf(),
                reason: format!("unsupported state version {}", state.version),
            });
        }
        state.refs.validate()?;
        Ok(state)
    }

    /// Write the record atomically; readers see the old or the new state.
    pub fn save(&self, path: &Path) -> StorageResult<()> {
        let bytes = serde_json::to_vec_pretty(self)?;
        write_atomic(path, &bytes)?;
        log::trace!("saved state to {}", path.display());
        Ok(())
    }
}
