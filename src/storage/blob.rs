//! Blob values: the exact bytes of one file at one point in time.
//!
//! A blob's identity is the digest of its bytes alone. The originating
//! file name is carried along for diagnostics but is neither hashed nor
//! persisted.

use crate::storage::error::StorageResult;
use crate::storage::types::{BlobId, FileName};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    id: BlobId,
    content: Vec<u8>,
    name: Option<FileName>,
}

impl Blob {
    /// hash `content` and wrap it as a blob
    pub fn new(name: Option<FileName>, content: Vec<u8>) -> StorageResult<Self> {
        let id = BlobId::for_content(&content)?;
        Ok(Self { id, content, name })
    }

    /// rebuild a blob read back from the store; the caller has verified the id
    pub(crate) fn from_stored(id: BlobId, content: Vec<u8>) -> Self {
        Self {
            id,
            content,
            name: None,
        }
    }

    pub fn id(&self) -> BlobId {
        self.id
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn into_content(self) -> Vec<u8> {
        self.content
    }

    pub fn name(&self) -> Option<&FileName> {
        self.name.as_ref()
    }

    pub fn size(&self) -> usize {
        self.content.len()
    }
}
