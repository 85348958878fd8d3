//! Repository configuration.

use std::path::PathBuf;

use crate::storage::BranchName;

/// Repository configuration options.
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    /// Working directory holding the tracked files.
    pub work_dir: PathBuf,
    /// Name of the metadata directory inside `work_dir`.
    pub meta_dir_name: String,
    /// Branch created by `init`.
    pub initial_branch: String,
    /// Shortest accepted abbreviated commit id.
    pub min_short_id_len: usize,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            meta_dir_name: ".gitlet".into(),
            initial_branch: BranchName::MAIN.into(),
            min_short_id_len: 8,
        }
    }
}

impl RepositoryConfig {
    /// Create a new configuration for the given working directory.
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            ..Default::default()
        }
    }

    /// Set the metadata directory name.
    pub fn meta_dir_name(mut self, name: impl Into<String>) -> Self {
        self.meta_dir_name = name.into();
        self
    }

    /// Set the branch `init` creates.
    pub fn initial_branch(mut self, name: impl Into<String>) -> Self {
        self.initial_branch = name.into();
        self
    }

    /// Set the minimum abbreviated id length.
    pub fn min_short_id_len(mut self, len: usize) -> Self {
        self.min_short_id_len = len;
        self
    }

    /// Full path of the metadata directory.
    pub fn meta_dir(&self) -> PathBuf {
        self.work_dir.join(&self.meta_dir_name)
    }

    pub(crate) fn objects_dir(&self) -> PathBuf {
        self.meta_dir().join("objects")
    }

    pub(crate) fn state_path(&self) -> PathBuf {
        self.meta_dir().join("state.json")
    }
}
