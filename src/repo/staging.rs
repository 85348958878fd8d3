//! The staging area: pending changes for the next commit.
//!
//! Additions hold the file bytes as they were when staged, so editing the
//! working file afterwards does not change what gets committed. A name is
//! never staged for addition and removal at the same time.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::error::{RepoError, RepoResult};
use crate::storage::{Blob, BlobId, FileName, ObjectStore, Snapshot, StorageResult};

/// what `stage_add` ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// the bytes differ from HEAD and were recorded
    Staged,
    /// the bytes match HEAD (or the tracked file is gone); nothing is pending
    MatchesHead,
}

/// what `stage_remove` ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// a pending addition was dropped; the file was not tracked
    Unstaged,
    /// the tracked file is staged for removal
    StagedForRemoval,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingArea {
    #[serde(with = "hex_contents")]
    additions: BTreeMap<FileName, Vec<u8>>,
    removals: BTreeSet<FileName>,
}

impl StagingArea {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty()
    }

    pub fn clear(&mut self) {
        self.additions.clear();
        self.removals.clear();
    }

    pub fn additions(&self) -> &BTreeMap<FileName, Vec<u8>> {
        &self.additions
    }

    pub fn removals(&self) -> &BTreeSet<FileName> {
        &self.removals
    }

    pub fn is_staged_for_addition(&self, name: &FileName) -> bool {
        self.additions.contains_key(name)
    }

    pub fn is_staged_for_removal(&self, name: &FileName) -> bool {
        self.removals.contains(name)
    }

    /// Stage the current working bytes of `name`.
    ///
    /// `working` is `None` when the file is missing from the working
    /// directory. Staging never records content identical to HEAD.
    pub fn stage_add(
        &mut self,
        name: &FileName,
        working: Option<Vec<u8>>,
        head: &Snapshot,
    ) -> RepoResult<AddOutcome> {
        let Some(content) = working else {
            if !head.contains_key(name) {
                return Err(RepoError::FileNotFound(name.clone()));
            }
            // a pending removal of the deleted file stays in place
            self.additions.remove(name);
            return Ok(AddOutcome::MatchesHead);
        };

        self.removals.remove(name);
        if head.get(name) == Some(&BlobId::for_content(&content)?) {
            if self.additions.remove(name).is_some() {
                log::debug!("'{}' matches HEAD again; dropped staged copy", name);
            }
            return Ok(AddOutcome::MatchesHead);
        }

        self.additions.insert(name.clone(), content);
        Ok(AddOutcome::Staged)
    }

    /// Un-stage `name`, and stage its removal if HEAD tracks it.
    ///
    /// Deleting the working copy is the caller's job.
    pub fn stage_remove(&mut self, name: &FileName, head: &Snapshot) -> RepoResult<RemoveOutcome> {
        let was_staged = self.additions.remove(name).is_some();
        if head.contains_key(name) {
            self.removals.insert(name.clone());
            return Ok(RemoveOutcome::StagedForRemoval);
        }
        if was_staged {
            Ok(RemoveOutcome::Unstaged)
        } else {
            Err(RepoError::NothingToRemove(name.clone()))
        }
    }

    /// Record `content` as a pending addition without comparing to HEAD.
    pub(crate) fn force_add(&mut self, name: &FileName, content: Vec<u8>) {
        self.removals.remove(name);
        self.additions.insert(name.clone(), content);
    }

    /// Record a pending removal without checking HEAD.
    pub(crate) fn force_remove(&mut self, name: &FileName) {
        self.additions.remove(name);
        self.removals.insert(name.clone());
    }

    /// Apply the pending changes on top of `base`, storing new blobs.
    pub(crate) fn apply_to(&self, base: &Snapshot, store: &ObjectStore) -> StorageResult<Snapshot> {
        let mut snapshot = base.clone();
        for (name, content) in &self.additions {
            let blob = Blob::new(Some(name.clone()), content.clone())?;
            store.put_blob(&blob)?;
            snapshot.insert(name.clone(), blob.id());
        }
        for name in &self.removals {
            snapshot.remove(name);
        }
        Ok(snapshot)
    }
}

/// staged bytes are stored hex-encoded in the JSON state record
mod hex_contents {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serializer};

    use crate::storage::FileName;

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<FileName, Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_map(map.iter().map(|(name, bytes)| (name, hex::encode(bytes))))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<FileName, Vec<u8>>, D::Error> {
        let raw = BTreeMap::<FileName, String>::deserialize(deserializer)?;
        raw.into_iter()
            .map(|(name, text)| {
                hex::decode(&text)
                    .map(|bytes| (name, bytes))
                    .map_err(serde::de::Error::custom)
            })
            .collect()
    }
}
