//!  Branch and reference management.
//!
//!  Branches are named pointers to commits. This module handles:
//! - the active branch (what `HEAD` resolves through)
//! - branch lifecycle (create, delete, switch)
//! - full and abbreviated commit id resolution
//!
//! The table is plain data: it is loaded with the session state, mutated in
//! memory and written back as part of `repo::state`.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::types::{BranchName, CommitId, ID_HEX_LEN};

/// Manages branches and the set of known commit ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefTable {
    branches: BTreeMap<BranchName, CommitId>,
    active: BranchName,
    commits: BTreeSet<CommitId>,
}

impl RefTable {
    /// A table with a single branch pointing at the root commit.
    pub fn new(initial_branch: BranchName, root: CommitId) -> Self {
        let mut branches = BTreeMap::new();
        branches.insert(initial_branch.clone(), root);
        Self {
            branches,
            active: initial_branch,
            commits: BTreeSet::from([root]),
        }
    }

    /// Check the table's internal invariants after loading it from disk.
    pub(crate) fn validate(&self) -> StorageResult<()> {
        if !self.branches.contains_key(&self.active) {
            return Err(StorageError::CorruptedData {
                path: "refs".into(),
                reason: format!("active branch '{}' has no head", self.active),
            });
        }
        if let Some((name, id)) = self.branches.iter().find(|(_, id)| !self.commits.contains(id)) {
            return Err(StorageError::CorruptedData {
                path: "refs".into(),
                reason: format!("branch '{}' points at unknown commit {}", name, id),
            });
        }
        Ok(())
    }

    /// Name of the active branch.
    pub fn active(&self) -> &BranchName {
        &self.active
    }

    /// Head commit of the active branch.
    pub fn head(&self) -> CommitId {
        // validate() and every mutation keep the active branch present
        self.branches[&self.active]
    }

    /// Resolve a branch name to its current commit ID.
    pub fn branch_head(&self, branch: &BranchName) -> StorageResult<CommitId> {
        self.branches
            .get(branch)
            .copied()
            .ok_or_else(|| StorageError::BranchNotFound(branch.to_string()))
    }

    pub fn branch_exists(&self, branch: &BranchName) -> bool {
        self.branches.contains_key(branch)
    }

    /// All branches in name order.
    pub fn branches(&self) -> impl Iterator<Item = (&BranchName, CommitId)> {
        self.branches.iter().map(|(name, id)| (name, *id))
    }

    /// Create a new branch pointing at the active head.
    pub fn create_branch(&mut self, branch: BranchName) -> StorageResult<CommitId> {
        if self.branch_exists(&branch) {
            return Err(StorageError::BranchAlreadyExists(branch.to_string()));
        }
        let head = self.head();
        log::debug!("creating branch '{}' at {}", branch, head.short());
        self.branches.insert(branch, head);
        Ok(head)
    }

    /// Delete a branch pointer. Commits it referenced stay in the store.
    pub fn delete_branch(&mut self, branch: &BranchName) -> StorageResult<CommitId> {
        if !self.branch_exists(branch) {
            return Err(StorageError::BranchNotFound(branch.to_string()));
        }
        if *branch == self.active {
            return Err(StorageError::CannotDeleteActive(branch.to_string()));
        }
        let id = self.branches.remove(branch).ok_or_else(|| {
            StorageError::BranchNotFound(branch.to_string())
        })?;
        log::debug!("deleted branch '{}' (was {})", branch, id.short());
        Ok(id)
    }

    /// Make `branch` the active branch.
    pub fn set_active(&mut self, branch: &BranchName) -> StorageResult<()> {
        if !self.branch_exists(branch) {
            return Err(StorageError::BranchNotFound(branch.to_string()));
        }
        self.active = branch.clone();
        Ok(())
    }

    /// Point the active branch at `target`, recording it as known.
    pub fn advance_active(&mut self, target: CommitId) {
        self.commits.insert(target);
        self.branches.insert(self.active.clone(), target);
    }

    /// Resolve a full id or an unambiguous prefix of at least `min_prefix`
    /// hex characters.
    pub fn resolve_commit_id(&self, id_or_prefix: &str, min_prefix: usize) -> StorageResult<CommitId> {
        let needle = id_or_prefix.trim().to_ascii_lowercase();
        let not_found = || StorageError::AmbiguousOrNotFound(id_or_prefix.to_string());

        if needle.len() == ID_HEX_LEN {
            let id = CommitId::from_hex(&needle).map_err(|_| not_found())?;
            return if self.commits.contains(&id) {
                Ok(id)
            } else {
                Err(not_found())
            };
        }

        if needle.len() < min_prefix
            || needle.len() > ID_HEX_LEN
            || !needle.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return Err(not_found());
        }

        let mut matches = self
            .commits
            .iter()
            .filter(|id| id.to_hex().starts_with(&needle));
        match (matches.next(), matches.next()) {
            (Some(id), None) => Ok(*id),
            _ => Err(not_found()),
        }
    }
}
