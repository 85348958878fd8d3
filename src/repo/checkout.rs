//! Restoring working files from commits.
//!
//! All checkout flavours share [`Repository::restore_snapshot`]:
//!
//! ```text
//!   checkout -- <file>            Files  (one file, from HEAD)
//!   checkout <commit> -- <file>   Files  (one file, from any commit)
//!   checkout <branch>             Full   (then switch branch)
//!   reset <commit>                Full   (then move the active branch)
//! ```
//!
//! A full restore never clobbers a file the current HEAD does not track.
//! The scan runs over every target file before the first write.

use super::error::{RepoError, RepoResult};
use super::repository::Repository;
use super::worktree::WorkingDir;
use crate::storage::{BranchName, CommitId, FileName, Snapshot};

/// How much of the working directory a restore is allowed to touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreMode {
    /// overwrite just the files in the target; no scan, no deletions
    Files,
    /// make the working directory match the target
    Full,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    FileRestored { name: FileName, from: CommitId },
    Switched { branch: BranchName, head: CommitId },
    AlreadyOnBranch(BranchName),
}

/// Fail if any of `names` is untracked at HEAD but present on disk.
pub(super) fn ensure_no_untracked<'a>(
    head: &Snapshot,
    worktree: &WorkingDir,
    names: impl IntoIterator<Item = &'a FileName>,
) -> RepoResult<()> {
    for name in names {
        if !head.contains_key(name) && worktree.exists(name) {
            return Err(RepoError::UntrackedFileWouldBeOverwritten(name.clone()));
        }
    }
    Ok(())
}

impl Repository {
    /// Write the files of `target` into the working directory.
    ///
    /// Blob contents are loaded before anything is written, so a missing
    /// object leaves the working directory untouched.
    pub fn restore_snapshot(&mut self, target: &Snapshot, mode: RestoreMode) -> RepoResult<()> {
        let head = self.head_commit()?;
        if mode == RestoreMode::Full {
            ensure_no_untracked(head.snapshot(), &self.worktree, target.keys())?;
        }

        let contents = target
            .iter()
            .map(|(name, blob)| Ok((name, self.read_blob(*blob)?)))
            .collect::<RepoResult<Vec<_>>>()?;
        for (name, bytes) in &contents {
            self.worktree.write(name, bytes)?;
        }

        if mode == RestoreMode::Full {
            for name in head.snapshot().keys() {
                if !target.contains_key(name) {
                    self.worktree.delete(name)?;
                }
            }
        }
        log::debug!("restored {} file(s) ({:?})", contents.len(), mode);
        Ok(())
    }

    /// Restore one file as it is in HEAD. Staging is left alone.
    pub fn checkout_file(&mut self, name: &FileName) -> RepoResult<CheckoutOutcome> {
        let head = self.head_commit()?.id();
        self.checkout_file_from(head, name)
    }

    /// Restore one file as it is in the commit `id_or_prefix`.
    pub fn checkout_file_at(
        &mut self,
        id_or_prefix: &str,
        name: &FileName,
    ) -> RepoResult<CheckoutOutcome> {
        let commit = self.resolve_commit(id_or_prefix)?.id();
        self.checkout_file_from(commit, name)
    }

    fn checkout_file_from(&mut self, id: CommitId, name: &FileName) -> RepoResult<CheckoutOutcome> {
        let commit = self.store.get_commit(id)?;
        let blob = commit
            .blob_for(name)
            .ok_or_else(|| RepoError::FileNotInCommit(name.clone()))?;

        let target = Snapshot::from([(name.clone(), blob)]);
        self.restore_snapshot(&target, RestoreMode::Files)?;
        log::info!("checked out '{}' from {}", name, id.short());
        Ok(CheckoutOutcome::FileRestored {
            name: name.clone(),
            from: id,
        })
    }

    /// Switch to `branch`, making the working directory match its head.
    pub fn checkout_branch(&mut self, branch: &BranchName) -> RepoResult<CheckoutOutcome> {
        let target = self.state.refs.branch_head(branch)?;
        if self.state.refs.active() == branch {
            log::debug!("already on '{}'", branch);
            return Ok(CheckoutOutcome::AlreadyOnBranch(branch.clone()));
        }

        let commit = self.store.get_commit(target)?;
        self.restore_snapshot(commit.snapshot(), RestoreMode::Full)?;
        self.state.refs.set_active(branch)?;
        self.state.staging.clear();
        log::info!("switched to branch '{}'", branch);
        Ok(CheckoutOutcome::Switched {
            branch: branch.clone(),
            head: target,
        })
    }

    /// Make the working directory match a commit and move the active
    /// branch there.
    pub fn reset(&mut self, id_or_prefix: &str) -> RepoResult<CommitId> {
        let commit = self.resolve_commit(id_or_prefix)?;
        self.restore_snapshot(commit.snapshot(), RestoreMode::Full)?;
        self.state.refs.advance_active(commit.id());
        self.state.staging.clear();
        log::info!(
            "reset '{}' to {}",
            self.state.refs.active(),
            commit.id().short()
        );
        Ok(commit.id())
    }
}
