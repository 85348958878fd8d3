//! Three-way merge of another branch into the active one.
//!
//! # Algorithm
//!
//! ```text
//!            split
//!           /     \
//!     (current)  (given)      deltas are computed split -> each head
//!           \     /
//!         merge commit        parents: (current, given)
//! ```
//!
//! 1. find the split point (see [`find_split_point`])
//! 2. split == given: nothing to do; split == current: fast-forward
//! 3. otherwise resolve every file changed on either side:
//!    - changed only in given: take given's version
//!    - changed only in current: keep it
//!    - changed in both to the same blob: keep it
//!    - changed in both differently: write conflict markers
//! 4. commit the result with both heads as parents
//!
//! Nothing is written until every touched file has passed the
//! untracked-file scan.

use std::collections::{BTreeMap, HashSet};

use super::checkout::{ensure_no_untracked, RestoreMode};
use super::error::{RepoError, RepoResult};
use super::repository::Repository;
use crate::storage::{
    diff_snapshots, BlobId, BranchName, Change, CommitId, CommitMessage, FileName, ObjectStore,
    StorageError, StorageResult,
};

pub const CONFLICT_HEAD: &str = "<<<<<<< HEAD\n";
pub const CONFLICT_SEPARATOR: &str = "=======\n";
pub const CONFLICT_END: &str = ">>>>>>>\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// given is already reachable from current
    AlreadyAncestor,
    /// current was behind; the branch now points at given's head
    FastForwarded { head: CommitId },
    /// a merge commit was made; `conflicted` lists files holding markers
    Merged {
        commit: CommitId,
        conflicted: Vec<FileName>,
    },
}

impl MergeOutcome {
    pub fn has_conflicts(&self) -> bool {
        matches!(self, MergeOutcome::Merged { conflicted, .. } if !conflicted.is_empty())
    }
}

/// What happens to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
enum FileAction {
    /// take given's state; `None` means delete
    Take(Option<BlobId>),
    Conflict {
        current: Option<BlobId>,
        given: Option<BlobId>,
    },
}

/// Bytes written for a file both sides changed differently.
///
/// A removed side contributes nothing between its markers.
pub fn conflict_content(current: &[u8], given: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(
        CONFLICT_HEAD.len() + current.len() + CONFLICT_SEPARATOR.len() + given.len() + CONFLICT_END.len(),
    );
    out.extend_from_slice(CONFLICT_HEAD.as_bytes());
    out.extend_from_slice(current);
    out.extend_from_slice(CONFLICT_SEPARATOR.as_bytes());
    out.extend_from_slice(given);
    out.extend_from_slice(CONFLICT_END.as_bytes());
    out
}

/// Every commit reachable from `start` over both parent links, `start`
/// included.
fn ancestors(store: &ObjectStore, start: CommitId) -> StorageResult<HashSet<CommitId>> {
    let mut seen = HashSet::new();
    let mut stack = vec![start];
    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        stack.extend(store.get_commit(id)?.parents());
    }
    Ok(seen)
}

/// Walk the primary chain from `start`, checking each merge commit's second
/// parent as it is met; on a miss, retry from those second parents in the
/// order met.
fn search_chain(
    store: &ObjectStore,
    start: CommitId,
    targets: &HashSet<CommitId>,
    visited: &mut HashSet<CommitId>,
) -> StorageResult<Option<CommitId>> {
    let mut side_branches = Vec::new();
    let mut next = Some(start);
    while let Some(id) = next {
        if targets.contains(&id) {
            return Ok(Some(id));
        }
        if !visited.insert(id) {
            break;
        }
        let commit = store.get_commit(id)?;
        if let Some(side) = commit.second_parent() {
            if targets.contains(&side) {
                return Ok(Some(side));
            }
            side_branches.push(side);
        }
        next = commit.parent();
    }

    for side in side_branches {
        if let Some(found) = search_chain(store, side, targets, visited)? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

/// The split point of `current` and `given`.
///
/// This is the first commit on current's primary-parent chain, or the
/// second parent of a merge commit on that chain, that is an ancestor of
/// `given`. It is biased towards first parents and is not always the
/// textbook lowest common ancestor.
pub fn find_split_point(
    store: &ObjectStore,
    current: CommitId,
    given: CommitId,
) -> StorageResult<CommitId> {
    let targets = ancestors(store, given)?;
    let mut visited = HashSet::new();
    search_chain(store, current, &targets, &mut visited)?.ok_or_else(|| {
        StorageError::CorruptedData {
            path: store.path().to_path_buf(),
            reason: format!("{} and {} share no history", current, given),
        }
    })
}

/// Decide what to do with every file either side changed.
fn plan(
    current: &BTreeMap<FileName, Change>,
    given: &BTreeMap<FileName, Change>,
) -> BTreeMap<FileName, FileAction> {
    let mut actions = BTreeMap::new();
    for (name, theirs) in given {
        let action = match current.get(name) {
            None => FileAction::Take(theirs.blob),
            Some(ours) if ours.blob == theirs.blob => continue,
            Some(ours) => FileAction::Conflict {
                current: ours.blob,
                given: theirs.blob,
            },
        };
        actions.insert(name.clone(), action);
    }
    actions
}

impl Repository {
    /// Merge branch `given` into the active branch.
    pub fn merge(&mut self, given: &BranchName) -> RepoResult<MergeOutcome> {
        if !self.state.staging.is_empty() {
            return Err(RepoError::UncommittedChanges);
        }
        let given_head = self
            .state
            .refs
            .branch_head(given)
            .map_err(|_| RepoError::UnknownBranch(given.clone()))?;
        let current = self.state.refs.active().clone();
        if *given == current {
            return Err(RepoError::SelfMerge(given.clone()));
        }

        let current_head = self.state.refs.head();
        if ancestors(&self.store, current_head)?.contains(&given_head) {
            log::info!("given branch is an ancestor of the current branch");
            return Ok(MergeOutcome::AlreadyAncestor);
        }
        let split = find_split_point(&self.store, current_head, given_head)?;
        log::debug!(
            "merge {} into {}: split point {}",
            given,
            current,
            split.short()
        );

        if split == current_head {
            let target = self.store.get_commit(given_head)?;
            self.restore_snapshot(target.snapshot(), RestoreMode::Full)?;
            self.state.refs.advance_active(given_head);
            self.state.staging.clear();
            log::info!("current branch fast-forwarded to {}", given_head.short());
            return Ok(MergeOutcome::FastForwarded { head: given_head });
        }

        let base = self.store.get_commit(split)?;
        let ours = self.store.get_commit(current_head)?;
        let theirs = self.store.get_commit(given_head)?;
        let actions = plan(
            &diff_snapshots(base.snapshot(), ours.snapshot()),
            &diff_snapshots(base.snapshot(), theirs.snapshot()),
        );

        ensure_no_untracked(ours.snapshot(), &self.worktree, actions.keys())?;

        // load everything first so a missing blob aborts before any write
        let mut writes = Vec::with_capacity(actions.len());
        let mut conflicted = Vec::new();
        for (name, action) in &actions {
            let content = match action {
                FileAction::Take(None) => None,
                FileAction::Take(Some(blob)) => Some(self.read_blob(*blob)?),
                FileAction::Conflict {
                    current: ours_blob,
                    given: theirs_blob,
                } => {
                    conflicted.push(name.clone());
                    let ours_bytes = ours_blob.map(|b| self.read_blob(b)).transpose()?;
                    let theirs_bytes = theirs_blob.map(|b| self.read_blob(b)).transpose()?;
                    Some(conflict_content(
                        ours_bytes.as_deref().unwrap_or_default(),
                        theirs_bytes.as_deref().unwrap_or_default(),
                    ))
                }
            };
            log::debug!("merge {}: {:?}", name, action);
            writes.push((name, content));
        }

        for (name, content) in writes {
            match content {
                Some(bytes) => {
                    self.worktree.write(name, &bytes)?;
                    self.state.staging.force_add(name, bytes);
                }
                None => {
                    self.worktree.delete(name)?;
                    self.state.staging.force_remove(name);
                }
            }
        }

        let message = CommitMessage::merge(given, &current);
        let commit = self.commit_staged(&message, Some(given_head))?;
        if conflicted.is_empty() {
            log::info!("merged '{}' into '{}'", given, current);
        } else {
            log::info!("encountered a merge conflict in {} file(s)", conflicted.len());
        }
        Ok(MergeOutcome::Merged { commit, conflicted })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::{ErrorKind, RepositoryConfig};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Repository) {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(RepositoryConfig::new(dir.path())).unwrap();
        (dir, repo)
    }

    fn name(s: &str) -> FileName {
        FileName::new(s).unwrap()
    }

    fn branch(s: &str) -> BranchName {
        BranchName::new(s).unwrap()
    }

    fn commit_file(repo: &mut Repository, dir: &Path, file: &str, content: &str) -> CommitId {
        fs::write(dir.join(file), content).unwrap();
        repo.add(&name(file)).unwrap();
        repo.commit(&format!("write {}", file)).unwrap()
    }

    fn remove_file(repo: &mut Repository, file: &str) -> CommitId {
        repo.remove(&name(file)).unwrap();
        repo.commit(&format!("remove {}", file)).unwrap()
    }

    /// main and dev diverge from a commit holding `shared.txt`
    fn diverged() -> (TempDir, Repository) {
        let (dir, mut repo) = setup();
        commit_file(&mut repo, dir.path(), "shared.txt", "base\n");
        repo.create_branch(branch("dev")).unwrap();
        (dir, repo)
    }

    #[test]
    fn test_conflict_content() {
        assert_eq!(
            conflict_content(b"left", b"right"),
            b"<<<<<<< HEAD\nleft=======\nright>>>>>>>\n"
        );
        assert_eq!(conflict_content(b"", b"x\n"), b"<<<<<<< HEAD\n=======\nx\n>>>>>>>\n");
    }

    #[test]
    fn test_preconditions() {
        let (dir, mut repo) = diverged();

        assert_eq!(
            repo.merge(&branch("main")).unwrap_err().kind(),
            ErrorKind::SelfMerge
        );
        assert_eq!(
            repo.merge(&branch("ghost")).unwrap_err().kind(),
            ErrorKind::UnknownBranch
        );

        fs::write(dir.path().join("x.txt"), "x").unwrap();
        repo.add(&name("x.txt")).unwrap();
        assert_eq!(
            repo.merge(&branch("dev")).unwrap_err().kind(),
            ErrorKind::UncommittedChanges
        );
    }

    #[test]
    fn test_merge_ancestor_is_noop() {
        let (dir, mut repo) = diverged();
        let head = commit_file(&mut repo, dir.path(), "more.txt", "m");

        assert_eq!(
            repo.merge(&branch("dev")).unwrap(),
            MergeOutcome::AlreadyAncestor
        );
        assert_eq!(repo.refs().head(), head);
    }

    #[test]
    fn test_fast_forward() {
        let (dir, mut repo) = diverged();
        repo.checkout_branch(&branch("dev")).unwrap();
        let dev_head = commit_file(&mut repo, dir.path(), "new.txt", "from dev");
        repo.checkout_branch(&branch("main")).unwrap();
        assert!(!dir.path().join("new.txt").exists());

        let outcome = repo.merge(&branch("dev")).unwrap();
        assert_eq!(outcome, MergeOutcome::FastForwarded { head: dev_head });
        assert_eq!(repo.refs().head(), dev_head);
        assert_eq!(repo.active_branch().as_str(), "main");
        assert_eq!(
            fs::read_to_string(dir.path().join("new.txt")).unwrap(),
            "from dev"
        );
    }

    #[test]
    fn test_clean_merge() {
        let (dir, mut repo) = diverged();
        commit_file(&mut repo, dir.path(), "ours.txt", "o");
        let main_head = repo.refs().head();

        repo.checkout_branch(&branch("dev")).unwrap();
        commit_file(&mut repo, dir.path(), "theirs.txt", "t");
        remove_file(&mut repo, "shared.txt");
        let dev_head = repo.refs().head();
        repo.checkout_branch(&branch("main")).unwrap();

        let outcome = repo.merge(&branch("dev")).unwrap();
        let MergeOutcome::Merged { commit, conflicted } = outcome else {
            panic!("expected a merge commit");
        };
        assert!(conflicted.is_empty());

        let merged = repo.head_commit().unwrap();
        assert_eq!(merged.id(), commit);
        assert_eq!(merged.parent(), Some(main_head));
        assert_eq!(merged.second_parent(), Some(dev_head));
        assert_eq!(merged.message(), "Merged dev into main.");

        let files: Vec<&str> = merged.snapshot().keys().map(|n| n.as_str()).collect();
        assert_eq!(files, vec!["ours.txt", "theirs.txt"]);
        assert!(!dir.path().join("shared.txt").exists());
        assert_eq!(fs::read_to_string(dir.path().join("theirs.txt")).unwrap(), "t");
        assert!(repo.staging().is_empty());
    }

    #[test]
    fn test_conflicting_edits() {
        let (dir, mut repo) = setup();
        commit_file(&mut repo, dir.path(), "f.txt", "base");
        repo.create_branch(branch("dev")).unwrap();
        commit_file(&mut repo, dir.path(), "f.txt", "left");
        repo.checkout_branch(&branch("dev")).unwrap();
        commit_file(&mut repo, dir.path(), "f.txt", "right");
        repo.checkout_branch(&branch("main")).unwrap();

        let outcome = repo.merge(&branch("dev")).unwrap();
        assert!(outcome.has_conflicts());
        let MergeOutcome::Merged { conflicted, .. } = outcome else {
            panic!("expected a merge commit");
        };
        assert_eq!(conflicted, vec![name("f.txt")]);

        let expected = "<<<<<<< HEAD\nleft=======\nright>>>>>>>\n";
        assert_eq!(fs::read_to_string(dir.path().join("f.txt")).unwrap(), expected);
        let blob = repo.head_commit().unwrap().blob_for(&name("f.txt")).unwrap();
        assert_eq!(repo.read_blob(blob).unwrap(), expected.as_bytes());
    }

    #[test]
    fn test_modify_versus_delete_conflicts() {
        let (dir, mut repo) = diverged();
        commit_file(&mut repo, dir.path(), "shared.txt", "edited\n");
        repo.checkout_branch(&branch("dev")).unwrap();
        remove_file(&mut repo, "shared.txt");
        repo.checkout_branch(&branch("main")).unwrap();

        let outcome = repo.merge(&branch("dev")).unwrap();
        assert!(outcome.has_conflicts());
        assert_eq!(
            fs::read_to_string(dir.path().join("shared.txt")).unwrap(),
            "<<<<<<< HEAD\nedited\n=======\n>>>>>>>\n"
        );
    }

    #[test]
    fn test_same_change_on_both_sides() {
        let (dir, mut repo) = diverged();
        commit_file(&mut repo, dir.path(), "shared.txt", "same\n");
        repo.checkout_branch(&branch("dev")).unwrap();
        commit_file(&mut repo, dir.path(), "shared.txt", "same\n");
        commit_file(&mut repo, dir.path(), "other.txt", "o");
        repo.checkout_branch(&branch("main")).unwrap();

        let outcome = repo.merge(&branch("dev")).unwrap();
        assert!(!outcome.has_conflicts());
        assert_eq!(
            fs::read_to_string(dir.path().join("shared.txt")).unwrap(),
            "same\n"
        );
    }

    #[test]
    fn test_untracked_file_blocks_merge() {
        let (dir, mut repo) = diverged();
        commit_file(&mut repo, dir.path(), "ours.txt", "o");
        let main_head = repo.refs().head();
        repo.checkout_branch(&branch("dev")).unwrap();
        commit_file(&mut repo, dir.path(), "a.txt", "dev a");
        commit_file(&mut repo, dir.path(), "b.txt", "dev b");
        repo.checkout_branch(&branch("main")).unwrap();

        fs::write(dir.path().join("b.txt"), "mine").unwrap();
        let err = repo.merge(&branch("dev")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UntrackedFileWouldBeOverwritten);

        // a.txt sorts before b.txt and still was not written
        assert!(!dir.path().join("a.txt").exists());
        assert_eq!(fs::read_to_string(dir.path().join("b.txt")).unwrap(), "mine");
        assert_eq!(repo.refs().head(), main_head);
        assert!(repo.staging().is_empty());
    }

    #[test]
    fn test_split_point_follows_first_parents() {
        let (dir, mut repo) = diverged();
        let split = repo.refs().head();
        commit_file(&mut repo, dir.path(), "m1.txt", "1");

        repo.checkout_branch(&branch("dev")).unwrap();
        commit_file(&mut repo, dir.path(), "d1.txt", "1");
        let dev_head = repo.refs().head();
        repo.checkout_branch(&branch("main")).unwrap();

        assert_eq!(
            find_split_point(repo.store(), repo.refs().head(), dev_head).unwrap(),
            split
        );

        // dev's head is now the second parent of main's head
        repo.merge(&branch("dev")).unwrap();
        let main_head = repo.refs().head();
        assert_eq!(
            find_split_point(repo.store(), main_head, dev_head).unwrap(),
            dev_head
        );
        assert_eq!(
            find_split_point(repo.store(), dev_head, main_head).unwrap(),
            dev_head
        );
    }

    #[test]
    fn test_merging_same_branch_twice() {
        let (dir, mut repo) = diverged();
        commit_file(&mut repo, dir.path(), "ours.txt", "o");
        repo.checkout_branch(&branch("dev")).unwrap();
        commit_file(&mut repo, dir.path(), "theirs.txt", "t");
        repo.checkout_branch(&branch("main")).unwrap();

        let first = repo.merge(&branch("dev")).unwrap();
        assert!(matches!(first, MergeOutcome::Merged { .. }));
        let head = repo.refs().head();
        let commits = repo.global_log().unwrap().len();

        assert_eq!(
            repo.merge(&branch("dev")).unwrap(),
            MergeOutcome::AlreadyAncestor
        );
        assert_eq!(repo.refs().head(), head);
        assert_eq!(repo.global_log().unwrap().len(), commits);
        assert!(repo.staging().is_empty());
    }

    #[test]
    fn test_ancestor_behind_second_parents() {
        let (dir, mut repo) = diverged();
        repo.create_branch(branch("topic")).unwrap();
        commit_file(&mut repo, dir.path(), "m.txt", "m");

        // topic -> dev -> main, each by a real merge
        repo.checkout_branch(&branch("topic")).unwrap();
        let topic_head = commit_file(&mut repo, dir.path(), "t.txt", "t");
        repo.checkout_branch(&branch("dev")).unwrap();
        commit_file(&mut repo, dir.path(), "d.txt", "d");
        repo.merge(&branch("topic")).unwrap();
        repo.checkout_branch(&branch("main")).unwrap();
        repo.merge(&branch("dev")).unwrap();
        let head = repo.refs().head();

        // the primary chain reaches the original fork before topic's head
        assert_ne!(
            find_split_point(repo.store(), head, topic_head).unwrap(),
            topic_head
        );
        assert_eq!(
            repo.merge(&branch("topic")).unwrap(),
            MergeOutcome::AlreadyAncestor
        );
        assert_eq!(repo.refs().head(), head);
    }
}
