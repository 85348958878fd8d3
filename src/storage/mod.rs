//! storage layer for gitlet
//!
//! this module owns everything that is persisted: immutable objects
//! (blobs and commits) addressed by content hash, and the mutable branch
//! table. The upper layers (staging, checkout, merge) use this API and never
//! touch the object files directly.
//!
//!  # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 repo::Repository (session)                  │
//! │     (staging, commit, checkout, merge over this layer)      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!        ┌─────────────────────┼─────────────────────┐
//!        │                     │                     │
//!        ▼                     ▼                     ▼
//!  ┌─────────────┐       ┌─────────────┐       ┌─────────────┐
//!  │   commit    │       │    blob     │       │    refs     │
//!  │ (snapshots) │       │ (contents)  │       │ (branches)  │
//!  └─────────────┘       └─────────────┘       └─────────────┘
//!         │                     │
//!         └──────────┬──────────┘
//!                    ▼
//!             ┌─────────────┐
//!             │   objects   │
//!             │ (on disk)   │
//!             └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use gitlet::storage::{Blob, CommitBuilder, ObjectStore, Snapshot, FileName};
//!
//! let store = ObjectStore::init(".gitlet/objects")?;
//! let blob = Blob::new(None, b"hello\n".to_vec())?;
//! store.put_blob(&blob)?;
//!
//! let mut snapshot = Snapshot::new();
//! snapshot.insert(FileName::new("hello.txt")?, blob.id());
//! let commit = CommitBuilder::new().message("add hello").snapshot(snapshot).build()?;
//! store.put_commit(&commit)?;
//! ```

mod blob;
mod commit;
mod error;
mod objects;
mod refs;
mod types;

// Re-export public API
pub use blob::Blob;
pub use commit::{diff_snapshots, Commit, CommitBuilder, CommitMessage, FirstParentHistory, Snapshot};
pub use error::{ObjectKind, StorageError, StorageResult};
pub use objects::ObjectStore;
pub use refs::RefTable;
pub use types::{
    BlobId, BranchName, Change, ChangeStatus, CommitId, FileName, InvalidNameError, ID_HEX_LEN,
};

// Re-export for internal use by other modules
pub(crate) use objects::write_atomic;
