//!  Commit creation, snapshots and history traversal
//!
//!  commits are immutable snapshots of the whole tracked file set:
//! - each commit maps every tracked file name to a blob id
//! - a commit has zero (root), one, or two (merge) parents
//! - parents are referenced by id only, so the graph is acyclic by construction
//!
//! this module handles commit construction, snapshot diffing and
//! first-parent history walks.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::objects::ObjectStore;
use crate::storage::types::{BlobId, BranchName, Change, ChangeStatus, CommitId, FileName};

/// the full tracked file set of one commit
pub type Snapshot = BTreeMap<FileName, BlobId>;

/// an immutable commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    id: CommitId,
    message: String,
    timestamp: DateTime<Utc>,
    parent: Option<CommitId>,
    second_parent: Option<CommitId>,
    snapshot: Snapshot,
}

impl Commit {
    /// the parentless root commit every repository starts from
    pub fn initial(message: impl Into<String>) -> StorageResult<Self> {
        CommitBuilder::new()
            .message(message)
            .timestamp(DateTime::<Utc>::UNIX_EPOCH)
            .build()
    }

    pub fn id(&self) -> CommitId {
        self.id
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn parent(&self) -> Option<CommitId> {
        self.parent
    }

    pub fn second_parent(&self) -> Option<CommitId> {
        self.second_parent
    }

    /// parents in link order: primary first
    pub fn parents(&self) -> impl Iterator<Item = CommitId> + '_ {
        self.parent.into_iter().chain(self.second_parent)
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// check if this is a merge commit (has two parents)
    pub fn is_merge(&self) -> bool {
        self.second_parent.is_some()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// blob tracked under `name`, if any
    pub fn blob_for(&self, name: &FileName) -> Option<BlobId> {
        self.snapshot.get(name).copied()
    }

    pub fn tracks(&self, name: &FileName) -> bool {
        self.snapshot.contains_key(name)
    }

    pub(crate) fn to_record(&self) -> CommitRecord {
        CommitRecord {
            id: self.id,
            message: self.message.clone(),
            timestamp: self.timestamp,
            parent: self.parent,
            second_parent: self.second_parent,
            snapshot: self.snapshot.clone(),
        }
    }

    /// rebuild a commit from its persisted record, verifying the id
    pub(crate) fn from_record(record: CommitRecord) -> StorageResult<Self> {
        let expected = record.id;
        let commit = CommitBuilder {
            message: record.message,
            timestamp: Some(record.timestamp),
            parent: record.parent,
            second_parent: record.second_parent,
            snapshot: record.snapshot,
        }
        .build()?;

        if commit.id != expected {
            return Err(StorageError::CorruptedData {
                path: expected.to_hex().into(),
                reason: format!("content hashes to {}", commit.id),
            });
        }
        Ok(commit)
    }
}

/// persisted form of a commit
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct CommitRecord {
    pub id: CommitId,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub parent: Option<CommitId>,
    pub second_parent: Option<CommitId>,
    pub snapshot: Snapshot,
}

/// builder for creating commits with a fluent interface
#[derive(Debug, Default)]
pub struct CommitBuilder {
    message: String,
    timestamp: Option<DateTime<Utc>>,
    parent: Option<CommitId>,
    second_parent: Option<CommitId>,
    snapshot: Snapshot,
}

impl CommitBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// set the primary parent
    pub fn parent(mut self, parent: CommitId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// set the secondary parent (merge commits only)
    pub fn second_parent(mut self, parent: CommitId) -> Self {
        self.second_parent = Some(parent);
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// defaults to the current time
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn snapshot(mut self, snapshot: Snapshot) -> Self {
        self.snapshot = snapshot;
        self
    }

    /// hash the commit content and return the finished commit
    pub fn build(self) -> StorageResult<Commit> {
        let timestamp = self.timestamp.unwrap_or_else(Utc::now);
        let encoded = encode(
            self.parent,
            self.second_parent,
            timestamp,
            &self.message,
            &self.snapshot,
        );
        let id = CommitId::for_encoding(&encoded)?;

        Ok(Commit {
            id,
            message: self.message,
            timestamp,
            parent: self.parent,
            second_parent: self.second_parent,
            snapshot: self.snapshot,
        })
    }
}

/// canonical byte encoding that the commit id is computed over
fn encode(
    parent: Option<CommitId>,
    second_parent: Option<CommitId>,
    timestamp: DateTime<Utc>,
    message: &str,
    snapshot: &Snapshot,
) -> Vec<u8> {
    let hex_or_dash = |id: Option<CommitId>| id.map(|i| i.to_hex()).unwrap_or_else(|| "-".to_string());

    let mut out = String::new();
    out.push_str(&format!("parent {}\n", hex_or_dash(parent)));
    out.push_str(&format!("second-parent {}\n", hex_or_dash(second_parent)));
    out.push_str(&format!(
        "timestamp {}.{:09}\n",
        timestamp.timestamp(),
        timestamp.timestamp_subsec_nanos()
    ));
    out.push_str(&format!("message {}\n{}\n", message.len(), message));
    for (name, blob) in snapshot {
        out.push_str(&format!("{} {}\n", blob, name));
    }
    out.into_bytes()
}

/// compute per-file changes going from `base` to `side`
///
/// files whose blob is identical in both snapshots are left out.
pub fn diff_snapshots(base: &Snapshot, side: &Snapshot) -> BTreeMap<FileName, Change> {
    let mut changes = BTreeMap::new();

    for (name, blob) in side {
        let status = match base.get(name) {
            None => ChangeStatus::Added,
            Some(old) if old != blob => ChangeStatus::Modified,
            Some(_) => continue,
        };
        changes.insert(
            name.clone(),
            Change {
                name: name.clone(),
                status,
                blob: Some(*blob),
            },
        );
    }

    for name in base.keys() {
        if !side.contains_key(name) {
            changes.insert(
                name.clone(),
                Change {
                    name: name.clone(),
                    status: ChangeStatus::Removed,
                    blob: None,
                },
            );
        }
    }

    changes
}

/// walks primary-parent links from a starting commit back to the root
pub struct FirstParentHistory<'a> {
    store: &'a ObjectStore,
    next: Option<CommitId>,
}

impl<'a> FirstParentHistory<'a> {
    pub fn new(store: &'a ObjectStore, start: CommitId) -> Self {
        Self {
            store,
            next: Some(start),
        }
    }
}

impl Iterator for FirstParentHistory<'_> {
    type Item = StorageResult<Arc<Commit>>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next.take()?;
        match self.store.get_commit(id) {
            Ok(commit) => {
                self.next = commit.parent();
                Some(Ok(commit))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

/// message formatting for commits the engine writes itself
pub struct CommitMessage;

impl CommitMessage {
    /// message of the root commit
    pub const INITIAL: &'static str = "initial commit";

    /// format the message of a merge commit
    pub fn merge(given: &BranchName, current: &BranchName) -> String {
        format!("Merged {} into {}.", given, current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn blob(content: &[u8]) -> BlobId {
        BlobId::for_content(content).unwrap()
    }

    fn name(s: &str) -> FileName {
        FileName::new(s).unwrap()
    }

    #[test]
    fn test_initial_commit() {
        let root = Commit::initial(CommitMessage::INITIAL).unwrap();
        assert!(root.is_root());
        assert!(!root.is_merge());
        assert!(root.snapshot().is_empty());
        assert_eq!(root.timestamp().timestamp(), 0);
        // deterministic: every repository shares the same root
        assert_eq!(root.id(), Commit::initial(CommitMessage::INITIAL).unwrap().id());
    }

    #[test]
    fn test_commit_builder() {
        let root = Commit::initial(CommitMessage::INITIAL).unwrap();
        let mut snapshot = Snapshot::new();
        snapshot.insert(name("a.txt"), blob(b"a"));

        let second = CommitBuilder::new()
            .parent(root.id())
            .message("add a")
            .snapshot(snapshot.clone())
            .build()
            .unwrap();

        assert_eq!(second.parent(), Some(root.id()));
        assert_eq!(second.parents().collect::<Vec<_>>(), vec![root.id()]);
        assert_eq!(second.blob_for(&name("a.txt")), Some(blob(b"a")));
        assert!(second.tracks(&name("a.txt")));
        assert_ne!(second.id(), root.id());
    }

    #[test]
    fn test_id_covers_every_field() {
        let ts = Utc.timestamp_opt(1_700_000_000, 0).single().unwrap();
        let base = || CommitBuilder::new().message("m").timestamp(ts);
        let id = base().build().unwrap().id();

        assert_eq!(base().build().unwrap().id(), id);
        assert_ne!(base().message("other").build().unwrap().id(), id);
        assert_ne!(
            base()
                .timestamp(ts + chrono::Duration::seconds(1))
                .build()
                .unwrap()
                .id(),
            id
        );
        let mut snapshot = Snapshot::new();
        snapshot.insert(name("f"), blob(b"f"));
        assert_ne!(base().snapshot(snapshot).build().unwrap().id(), id);
        assert_ne!(base().parent(id).build().unwrap().id(), id);
    }

    #[test]
    fn test_record_roundtrip_detects_tampering() {
        let commit = CommitBuilder::new().message("hello").build().unwrap();
        let restored = Commit::from_record(commit.to_record()).unwrap();
        assert_eq!(restored, commit);

        let mut record = commit.to_record();
        record.message = "tampered".to_string();
        assert!(matches!(
            Commit::from_record(record),
            Err(StorageError::CorruptedData { .. })
        ));
    }

    #[test]
    fn test_diff_snapshots() {
        let mut base = Snapshot::new();
        base.insert(name("same"), blob(b"1"));
        base.insert(name("changed"), blob(b"old"));
        base.insert(name("gone"), blob(b"x"));

        let mut side = Snapshot::new();
        side.insert(name("same"), blob(b"1"));
        side.insert(name("changed"), blob(b"new"));
        side.insert(name("fresh"), blob(b"y"));

        let changes = diff_snapshots(&base, &side);
        assert_eq!(changes.len(), 3);
        assert_eq!(changes[&name("changed")].status, ChangeStatus::Modified);
        assert_eq!(changes[&name("changed")].blob, Some(blob(b"new")));
        assert_eq!(changes[&name("fresh")].status, ChangeStatus::Added);
        assert_eq!(changes[&name("gone")].status, ChangeStatus::Removed);
        assert_eq!(changes[&name("gone")].blob, None);
        assert!(!changes.contains_key(&name("same")));
    }

    #[test]
    fn test_merge_message() {
        let given = BranchName::new("feature").unwrap();
        assert_eq!(
            CommitMessage::merge(&given, &BranchName::main()),
            "Merged feature into main."
        );
    }
}
