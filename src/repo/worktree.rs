//! Byte-level access to files in the working directory.
//!
//! Only top-level plain files are visible; the metadata directory and any
//! entry whose name is not a valid [`FileName`] are ignored.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::error::{RepoError, RepoResult};
use crate::storage::{FileName, InvalidNameError};

#[derive(Debug, Clone)]
pub struct WorkingDir {
    root: PathBuf,
    meta_dir_name: String,
}

impl WorkingDir {
    pub fn new(root: impl Into<PathBuf>, meta_dir_name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            meta_dir_name: meta_dir_name.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a tracked file; the metadata directory is never one.
    fn path_of(&self, name: &FileName) -> RepoResult<PathBuf> {
        if name.as_str() == self.meta_dir_name {
            return Err(InvalidNameError::Reserved(self.meta_dir_name.clone()).into());
        }
        Ok(self.root.join(name.as_str()))
    }

    pub fn exists(&self, name: &FileName) -> bool {
        self.path_of(name).is_ok_and(|path| path.is_file())
    }

    /// Read a file; a missing file is an error.
    pub fn read(&self, name: &FileName) -> RepoResult<Vec<u8>> {
        let path = self.path_of(name)?;
        fs::read(&path).map_err(|e| RepoError::io(path, e))
    }

    /// Read a file, mapping "not there" to `None`.
    pub fn read_if_exists(&self, name: &FileName) -> RepoResult<Option<Vec<u8>>> {
        let path = self.path_of(name)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RepoError::io(path, e)),
        }
    }

    /// Create or overwrite a file.
    pub fn write(&self, name: &FileName, content: &[u8]) -> RepoResult<()> {
        let path = self.path_of(name)?;
        fs::write(&path, content).map_err(|e| RepoError::io(path, e))
    }

    /// Delete a file; deleting a missing file is a no-op.
    pub fn delete(&self, name: &FileName) -> RepoResult<()> {
        let path = self.path_of(name)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(RepoError::io(path, e)),
        }
    }

    /// Plain files at the top level, sorted by name.
    pub fn list_files(&self) -> RepoResult<Vec<FileName>> {
        let entries = fs::read_dir(&self.root).map_err(|e| RepoError::io(&self.root, e))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| RepoError::io(&self.root, e))?;
            let file_type = entry.file_type().map_err(|e| RepoError::io(entry.path(), e))?;
            if !file_type.is_file() {
                continue;
            }
            let Ok(raw) = entry.file_name().into_string() else {
                continue;
            };
            if raw == self.meta_dir_name {
                continue;
            }
            if let Ok(name) = FileName::new(raw) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}
