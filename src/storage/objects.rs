//! Append-only, content-addressed object store.
//!
//! Layout under the metadata directory:
//!
//! ```text
//! objects/
//!   blobs/<hex>           raw file bytes
//!   commits/<hex>.json    serialized commit record
//! ```
//!
//! Writes go through a temporary file in the target directory followed by
//! an atomic rename, so a reader never observes a half-written object.
//! Storing an id that already exists is a no-op.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tempfile::NamedTempFile;

use crate::storage::blob::Blob;
use crate::storage::commit::{Commit, CommitRecord};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::types::{BlobId, CommitId, ID_HEX_LEN};

const BLOBS_DIR: &str = "blobs";
const COMMITS_DIR: &str = "commits";
const COMMIT_EXT: &str = "json";

pub struct ObjectStore {
    root: PathBuf,
    /// parsed commits; commits are immutable so entries never go stale
    commit_cache: RwLock<HashMap<CommitId, Arc<Commit>>>,
}

impl ObjectStore {
    /// Create the directory layout (if needed) and open the store.
    pub fn init(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref();
        fs::create_dir_all(root.join(BLOBS_DIR))?;
        fs::create_dir_all(root.join(COMMITS_DIR))?;
        Self::open(root)
    }

    /// Open an existing store.
    pub fn open(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref();
        if !root.join(BLOBS_DIR).is_dir() || !root.join(COMMITS_DIR).is_dir() {
            return Err(StorageError::NotInitialized(root.to_path_buf()));
        }
        Ok(Self {
            root: root.to_path_buf(),
            commit_cache: RwLock::new(HashMap::new()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, id: BlobId) -> PathBuf {
        self.root.join(BLOBS_DIR).join(id.to_hex())
    }

    fn commit_path(&self, id: CommitId) -> PathBuf {
        self.root
            .join(COMMITS_DIR)
            .join(format!("{}.{}", id.to_hex(), COMMIT_EXT))
    }

    // ==================== Blobs ====================

    /// Store a blob; returns its id.
    pub fn put_blob(&self, blob: &Blob) -> StorageResult<BlobId> {
        let path = self.blob_path(blob.id());
        if path.exists() {
            log::trace!("blob {} already stored", blob.id());
        } else {
            write_atomic(&path, blob.content())?;
            log::trace!("stored blob {} ({} bytes)", blob.id(), blob.size());
        }
        Ok(blob.id())
    }

    /// Read a blob back, verifying its content hash.
    pub fn get_blob(&self, id: BlobId) -> StorageResult<Blob> {
        let path = self.blob_path(id);
        let content = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::blob_not_found(id));
            }
            Err(e) => return Err(e.into()),
        };

        let actual = BlobId::for_content(&content)?;
        if actual != id {
            return Err(StorageError::CorruptedData {
                path,
                reason: format!("content hashes to {}", actual),
            });
        }
        Ok(Blob::from_stored(id, content))
    }

    // ==================== Commits ====================

    /// Store a commit; returns its id.
    pub fn put_commit(&self, commit: &Commit) -> StorageResult<CommitId> {
        let path = self.commit_path(commit.id());
        if path.exists() {
            log::trace!("commit {} already stored", commit.id());
        } else {
            let bytes = serde_json::to_vec_pretty(&commit.to_record())?;
            write_atomic(&path, &bytes)?;
            log::trace!("stored commit {}", commit.id());
        }
        self.commit_cache
            .write()
            .entry(commit.id())
            .or_insert_with(|| Arc::new(commit.clone()));
        Ok(commit.id())
    }

    /// Read a commit, serving repeated lookups from memory.
    pub fn get_commit(&self, id: CommitId) -> StorageResult<Arc<Commit>> {
        if let Some(commit) = self.commit_cache.read().get(&id) {
            return Ok(Arc::clone(commit));
        }

        let path = self.commit_path(id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::commit_not_found(id));
            }
            Err(e) => return Err(e.into()),
        };
        let record: CommitRecord = serde_json::from_slice(&bytes)?;
        let commit = Arc::new(Commit::from_record(record)?);

        self.commit_cache.write().insert(id, Arc::clone(&commit));
        Ok(commit)
    }

    pub fn contains_commit(&self, id: CommitId) -> bool {
        self.commit_cache.read().contains_key(&id) || self.commit_path(id).is_file()
    }

    /// Every commit id present on disk, in id order.
    pub fn commit_ids(&self) -> StorageResult<Vec<CommitId>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(self.root.join(COMMITS_DIR))? {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            let Some(stem) = name.strip_suffix(&format!(".{}", COMMIT_EXT)) else {
                continue;
            };
            if stem.len() != ID_HEX_LEN {
                continue;
            }
            if let Ok(id) = CommitId::from_hex(stem) {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }
}

/// write `bytes` to `path` via a sibling temp file and an atomic rename
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> StorageResult<()> {
    let dir = path.parent().ok_or_else(|| StorageError::CorruptedData {
        path: path.to_path_buf(),
        reason: "path has no parent directory".to_string(),
    })?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;
    Ok(())
}
