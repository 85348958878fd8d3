//! The repository session: one value owning the object store, the branch
//! table, the staging area and the working directory.
//!
//! Every mutating operation takes `&mut self`; nothing is shared globally.
//! Changes to refs and staging stay in memory until [`Repository::save`].

use std::collections::BTreeSet;
use std::fs;
use std::sync::Arc;

use super::config::RepositoryConfig;
use super::error::{RepoError, RepoResult};
use super::staging::{AddOutcome, RemoveOutcome, StagingArea};
use super::state::SessionState;
use super::worktree::WorkingDir;
use crate::storage::{
    BlobId, BranchName, Commit, CommitBuilder, CommitId, CommitMessage, FileName,
    FirstParentHistory, ObjectStore, RefTable, StorageError,
};

/// How a file differs from what would be committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modification {
    Modified,
    Deleted,
}

/// Snapshot of the session for `status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub active: BranchName,
    pub branches: Vec<BranchName>,
    pub staged: Vec<FileName>,
    pub removed: Vec<FileName>,
    pub modified: Vec<(FileName, Modification)>,
    pub untracked: Vec<FileName>,
}

pub struct Repository {
    pub(super) config: RepositoryConfig,
    pub(super) store: ObjectStore,
    pub(super) state: SessionState,
    pub(super) worktree: WorkingDir,
}

impl Repository {
    /// Create a repository in `config.work_dir` with a root commit and the
    /// initial branch.
    pub fn init(config: RepositoryConfig) -> RepoResult<Self> {
        let meta = config.meta_dir();
        if meta.exists() {
            return Err(StorageError::AlreadyInitialized(meta).into());
        }
        let initial_branch = BranchName::new(config.initial_branch.clone())?;
        fs::create_dir_all(&meta).map_err(|e| RepoError::io(&meta, e))?;

        let store = ObjectStore::init(config.objects_dir())?;
        let root = Commit::initial(CommitMessage::INITIAL)?;
        store.put_commit(&root)?;

        let state = SessionState::new(RefTable::new(initial_branch, root.id()));
        let worktree = WorkingDir::new(&config.work_dir, &config.meta_dir_name);
        let repo = Self {
            config,
            store,
            state,
            worktree,
        };
        repo.save()?;
        log::info!("initialized empty repository in {}", meta.display());
        Ok(repo)
    }

    /// Open an existing repository.
    pub fn open(config: RepositoryConfig) -> RepoResult<Self> {
        if !config.meta_dir().is_dir() {
            return Err(StorageError::NotInitialized(config.work_dir.clone()).into());
        }
        let store = ObjectStore::open(config.objects_dir())?;
        let state = SessionState::load(&config.state_path())?;
        if let Some((branch, id)) = state
            .refs
            .branches()
            .find(|(_, id)| !store.contains_commit(*id))
        {
            return Err(StorageError::CorruptedData {
                path: config.state_path(),
                reason: format!("branch '{}' points at missing commit {}", branch, id),
            }
            .into());
        }
        let worktree = WorkingDir::new(&config.work_dir, &config.meta_dir_name);
        log::debug!(
            "opened repository at {} on branch '{}'",
            config.work_dir.display(),
            state.refs.active()
        );
        Ok(Self {
            config,
            store,
            state,
            worktree,
        })
    }

    /// Persist refs and staging.
    pub fn save(&self) -> RepoResult<()> {
        self.state.save(&self.config.state_path())?;
        Ok(())
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub fn refs(&self) -> &RefTable {
        &self.state.refs
    }

    pub fn staging(&self) -> &StagingArea {
        &self.state.staging
    }

    pub fn worktree(&self) -> &WorkingDir {
        &self.worktree
    }

    pub fn active_branch(&self) -> &BranchName {
        self.state.refs.active()
    }

    pub fn head_commit(&self) -> RepoResult<Arc<Commit>> {
        Ok(self.store.get_commit(self.state.refs.head())?)
    }

    /// All branches with their heads, in name order.
    pub fn branches(&self) -> Vec<(BranchName, CommitId)> {
        self.state
            .refs
            .branches()
            .map(|(name, id)| (name.clone(), id))
            .collect()
    }

    /// Look up a commit by full id or abbreviated prefix.
    pub fn resolve_commit(&self, id_or_prefix: &str) -> RepoResult<Arc<Commit>> {
        let id = self
            .state
            .refs
            .resolve_commit_id(id_or_prefix, self.config.min_short_id_len)?;
        Ok(self.store.get_commit(id)?)
    }

    pub(super) fn read_blob(&self, id: BlobId) -> RepoResult<Vec<u8>> {
        Ok(self.store.get_blob(id)?.into_content())
    }

    /// Stage the working copy of `name`.
    pub fn add(&mut self, name: &FileName) -> RepoResult<AddOutcome> {
        let head = self.head_commit()?;
        let working = self.worktree.read_if_exists(name)?;
        let outcome = self
            .state
            .staging
            .stage_add(name, working, head.snapshot())?;
        match outcome {
            AddOutcome::Staged => log::info!("staged '{}'", name),
            AddOutcome::MatchesHead => log::debug!("'{}' unchanged from HEAD; nothing staged", name),
        }
        Ok(outcome)
    }

    /// Un-stage `name`, or stage its removal and delete the working copy.
    pub fn remove(&mut self, name: &FileName) -> RepoResult<RemoveOutcome> {
        let head = self.head_commit()?;
        let outcome = self.state.staging.stage_remove(name, head.snapshot())?;
        if outcome == RemoveOutcome::StagedForRemoval {
            self.worktree.delete(name)?;
            log::info!("staged removal of '{}'", name);
        } else {
            log::info!("unstaged '{}'", name);
        }
        Ok(outcome)
    }

    /// Commit the staged changes on the active branch.
    pub fn commit(&mut self, message: &str) -> RepoResult<CommitId> {
        if message.trim().is_empty() {
            return Err(RepoError::EmptyMessage);
        }
        if self.state.staging.is_empty() {
            return Err(RepoError::NothingToCommit);
        }
        self.commit_staged(message, None)
    }

    /// Build a commit from HEAD plus staging, advance the active branch and
    /// clear staging. Shared by `commit` and `merge`.
    pub(super) fn commit_staged(
        &mut self,
        message: &str,
        second_parent: Option<CommitId>,
    ) -> RepoResult<CommitId> {
        let head = self.head_commit()?;
        let snapshot = self.state.staging.apply_to(head.snapshot(), &self.store)?;

        let mut builder = CommitBuilder::new()
            .parent(head.id())
            .message(message)
            .snapshot(snapshot);
        if let Some(other) = second_parent {
            builder = builder.second_parent(other);
        }
        let commit = builder.build()?;
        let id = self.store.put_commit(&commit)?;

        self.state.refs.advance_active(id);
        self.state.staging.clear();
        log::info!(
            "[{} {}] {}",
            self.state.refs.active(),
            id.short(),
            commit.message()
        );
        Ok(id)
    }

    /// Create a branch at the current head. Does not switch to it.
    pub fn create_branch(&mut self, name: BranchName) -> RepoResult<CommitId> {
        let id = self.state.refs.create_branch(name.clone())?;
        log::info!("created branch '{}' at {}", name, id.short());
        Ok(id)
    }

    /// Delete a branch pointer; its commits stay in the store.
    pub fn remove_branch(&mut self, name: &BranchName) -> RepoResult<CommitId> {
        let id = self.state.refs.delete_branch(name)?;
        log::info!("deleted branch '{}'", name);
        Ok(id)
    }

    /// First-parent history from HEAD back to the root.
    pub fn log(&self) -> RepoResult<Vec<Arc<Commit>>> {
        FirstParentHistory::new(&self.store, self.state.refs.head())
            .map(|commit| commit.map_err(RepoError::from))
            .collect()
    }

    /// Every stored commit, newest first.
    pub fn global_log(&self) -> RepoResult<Vec<Arc<Commit>>> {
        let mut commits = self
            .store
            .commit_ids()?
            .into_iter()
            .map(|id| self.store.get_commit(id))
            .collect::<Result<Vec<_>, _>>()?;
        commits.sort_by(|a, b| {
            b.timestamp()
                .cmp(&a.timestamp())
                .then_with(|| a.id().cmp(&b.id()))
        });
        Ok(commits)
    }

    /// Ids of all commits whose message is exactly `message`.
    pub fn find(&self, message: &str) -> RepoResult<Vec<CommitId>> {
        let mut found = Vec::new();
        for id in self.store.commit_ids()? {
            if self.store.get_commit(id)?.message() == message {
                found.push(id);
            }
        }
        if found.is_empty() {
            return Err(RepoError::NoCommitWithMessage(message.to_string()));
        }
        Ok(found)
    }

    pub fn status(&self) -> RepoResult<Status> {
        let head = self.head_commit()?;
        let staging = &self.state.staging;
        let on_disk: BTreeSet<FileName> = self.worktree.list_files()?.into_iter().collect();

        let mut names: BTreeSet<&FileName> = head.snapshot().keys().collect();
        names.extend(staging.additions().keys());
        names.extend(on_disk.iter());

        let mut modified = Vec::new();
        let mut untracked = Vec::new();
        for name in names {
            let working = if on_disk.contains(name) {
                Some(self.worktree.read(name)?)
            } else {
                None
            };
            let staged = staging.additions().get(name);
            let removed = staging.is_staged_for_removal(name);
            let tracked = head.blob_for(name);

            match (&working, staged, tracked) {
                (Some(bytes), Some(staged), _) if bytes != staged => {
                    modified.push((name.clone(), Modification::Modified));
                }
                (None, Some(_), _) => modified.push((name.clone(), Modification::Deleted)),
                (Some(bytes), None, Some(blob)) if !removed => {
                    if BlobId::for_content(bytes)? != blob {
                        modified.push((name.clone(), Modification::Modified));
                    }
                }
                (None, None, Some(_)) if !removed => {
                    modified.push((name.clone(), Modification::Deleted));
                }
                _ => {}
            }

            if working.is_some() && staged.is_none() && (tracked.is_none() || removed) {
                untracked.push(name.clone());
            }
        }

        Ok(Status {
            active: self.state.refs.active().clone(),
            branches: self.state.refs.branches().map(|(b, _)| b.clone()).collect(),
            staged: staging.additions().keys().cloned().collect(),
            removed: staging.removals().iter().cloned().collect(),
            modified,
            untracked,
        })
    }
}
