//! The working view on top of the storage layer.
//!
//! A [`Repository`] is one session over a working directory: it loads the
//! branch table and staging area at `open`, mutates them in memory, and
//! writes them back at `save`.
//!
//! ```text
//!   working dir ──add/rm──▶ staging ──commit──▶ objects + refs
//!        ▲                                          │
//!        └────────── checkout / reset / merge ◀─────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use gitlet::repo::{Repository, RepositoryConfig};
//! use gitlet::storage::FileName;
//!
//! let mut repo = Repository::init(RepositoryConfig::new("."))?;
//! repo.add(&FileName::new("notes.txt")?)?;
//! repo.commit("add notes")?;
//! repo.save()?;
//! ```

mod checkout;
mod config;
mod error;
mod merge;
mod repository;
mod staging;
mod state;
mod worktree;

pub use checkout::{CheckoutOutcome, RestoreMode};
pub use config::RepositoryConfig;
pub use error::{ErrorKind, RepoError, RepoResult};
pub use merge::{conflict_content, find_split_point, MergeOutcome};
pub use repository::{Modification, Repository, Status};
pub use staging::{AddOutcome, RemoveOutcome, StagingArea};
pub use state::{SessionState, STATE_VERSION};
pub use worktree::WorkingDir;
