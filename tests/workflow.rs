//! End-to-end scenarios over the public repository API.

use std::fs;
use std::path::Path;

use gitlet::repo::{
    AddOutcome, CheckoutOutcome, ErrorKind, MergeOutcome, Repository, RepositoryConfig,
};
use gitlet::storage::{BlobId, BranchName, CommitId, FileName};
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

fn write(dir: &Path, file: &str, content: &str) {
    fs::write(dir.join(file), content).unwrap();
}

fn read(dir: &Path, file: &str) -> String {
    fs::read_to_string(dir.join(file)).unwrap()
}

fn commit_file(repo: &mut Repository, dir: &Path, file: &str, content: &str) -> CommitId {
    write(dir, file, content);
    repo.add(&name(file)).unwrap();
    repo.commit(&format!("write {}", file)).unwrap()
}

/// Snapshot of every top-level file, for "nothing changed" checks.
fn worktree_contents(dir: &Path) -> Vec<(String, Vec<u8>)> {
    let mut files: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().unwrap().is_file())
        .map(|e| (e.file_name().into_string().unwrap(), fs::read(e.path()).unwrap()))
        .collect();
    files.sort();
    files
}

#[test]
fn identical_content_shares_one_blob() {
    let (dir, mut repo) = setup();
    write(dir.path(), "a.txt", "same\n");
    write(dir.path(), "b.txt", "same\n");
    repo.add(&name("a.txt")).unwrap();
    repo.add(&name("b.txt")).unwrap();
    repo.commit("two names, one blob").unwrap();

    let head = repo.head_commit().unwrap();
    let a = head.blob_for(&name("a.txt")).unwrap();
    assert_eq!(Some(a), head.blob_for(&name("b.txt")));
    assert_eq!(a, BlobId::for_content(b"same\n").unwrap());
}

#[test]
fn earlier_commits_are_untouched_by_later_ones() {
    let (dir, mut repo) = setup();
    let first = commit_file(&mut repo, dir.path(), "a.txt", "v1");
    let before = repo.store().get_commit(first).unwrap().snapshot().clone();

    commit_file(&mut repo, dir.path(), "a.txt", "v2");
    commit_file(&mut repo, dir.path(), "b.txt", "b");

    let reread = repo.resolve_commit(&first.to_hex()).unwrap();
    assert_eq!(reread.snapshot(), &before);
}

#[test]
fn staging_unchanged_content_is_a_noop() {
    let (dir, mut repo) = setup();
    commit_file(&mut repo, dir.path(), "a.txt", "v1");

    assert_eq!(repo.add(&name("a.txt")).unwrap(), AddOutcome::MatchesHead);
    assert!(repo.staging().is_empty());

    write(dir.path(), "a.txt", "v2");
    assert_eq!(repo.add(&name("a.txt")).unwrap(), AddOutcome::Staged);
    write(dir.path(), "a.txt", "v1");
    assert_eq!(repo.add(&name("a.txt")).unwrap(), AddOutcome::MatchesHead);
    assert!(repo.staging().is_empty());
}

#[test]
fn branch_round_trip_then_nothing_to_commit() {
    let (dir, mut repo) = setup();
    commit_file(&mut repo, dir.path(), "a.txt", "main a");
    repo.create_branch(branch("dev")).unwrap();

    repo.checkout_branch(&branch("dev")).unwrap();
    commit_file(&mut repo, dir.path(), "a.txt", "dev a");
    assert_eq!(
        repo.checkout_branch(&branch("main")).unwrap(),
        CheckoutOutcome::Switched {
            branch: branch("main"),
            head: repo.refs().branch_head(&branch("main")).unwrap(),
        }
    );
    assert_eq!(read(dir.path(), "a.txt"), "main a");

    repo.add(&name("a.txt")).unwrap();
    assert_eq!(
        repo.commit("nothing new").unwrap_err().kind(),
        ErrorKind::NothingToCommit
    );
}

#[test]
fn self_merge_and_ancestor_merge() {
    let (dir, mut repo) = setup();
    repo.create_branch(branch("old")).unwrap();
    commit_file(&mut repo, dir.path(), "a.txt", "a");

    assert_eq!(
        repo.merge(&branch("main")).unwrap_err().kind(),
        ErrorKind::SelfMerge
    );
    assert_eq!(
        repo.merge(&branch("old")).unwrap(),
        MergeOutcome::AlreadyAncestor
    );
}

#[test]
fn fast_forward_moves_branch_without_a_commit() {
    let (dir, mut repo) = setup();
    repo.create_branch(branch("feature")).unwrap();
    repo.checkout_branch(&branch("feature")).unwrap();
    let tip = commit_file(&mut repo, dir.path(), "f.txt", "feature work");
    repo.checkout_branch(&branch("main")).unwrap();
    let commits_before = repo.global_log().unwrap().len();

    assert_eq!(
        repo.merge(&branch("feature")).unwrap(),
        MergeOutcome::FastForwarded { head: tip }
    );
    assert_eq!(repo.refs().head(), tip);
    assert_eq!(repo.global_log().unwrap().len(), commits_before);
    assert_eq!(read(dir.path(), "f.txt"), "feature work");
}

#[test]
fn conflicting_merge_writes_markers_and_commits() {
    let (dir, mut repo) = setup();
    commit_file(&mut repo, dir.path(), "f.txt", "base");
    repo.create_branch(branch("other")).unwrap();
    let ours = commit_file(&mut repo, dir.path(), "f.txt", "left");
    repo.checkout_branch(&branch("other")).unwrap();
    let theirs = commit_file(&mut repo, dir.path(), "f.txt", "right");
    repo.checkout_branch(&branch("main")).unwrap();

    let outcome = repo.merge(&branch("other")).unwrap();
    let MergeOutcome::Merged { commit, conflicted } = outcome else {
        panic!("expected a merge commit, got {:?}", outcome);
    };
    assert_eq!(conflicted, vec![name("f.txt")]);
    assert_eq!(read(dir.path(), "f.txt"), "<<<<<<< HEAD\nleft=======\nright>>>>>>>\n");

    let merged = repo.store().get_commit(commit).unwrap();
    assert_eq!(merged.parent(), Some(ours));
    assert_eq!(merged.second_parent(), Some(theirs));
    assert_eq!(merged.message(), "Merged other into main.");
    let log = repo.log().unwrap();
    assert_eq!(log[0].id(), commit);
}

#[test]
fn untracked_file_guard_leaves_worktree_unchanged() {
    let (dir, mut repo) = setup();
    commit_file(&mut repo, dir.path(), "base.txt", "base");
    repo.create_branch(branch("other")).unwrap();
    commit_file(&mut repo, dir.path(), "ours.txt", "ours");
    repo.checkout_branch(&branch("other")).unwrap();
    commit_file(&mut repo, dir.path(), "base.txt", "changed on other");
    commit_file(&mut repo, dir.path(), "new.txt", "from other");
    repo.checkout_branch(&branch("main")).unwrap();

    write(dir.path(), "new.txt", "untracked and precious");
    let before = worktree_contents(dir.path());
    let head = repo.refs().head();

    let err = repo.merge(&branch("other")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UntrackedFileWouldBeOverwritten);
    assert_eq!(worktree_contents(dir.path()), before);
    assert_eq!(repo.refs().head(), head);

    let err = repo.checkout_branch(&branch("other")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UntrackedFileWouldBeOverwritten);
    assert_eq!(worktree_contents(dir.path()), before);
}

#[test]
fn state_survives_reopen() {
    let (dir, mut repo) = setup();
    commit_file(&mut repo, dir.path(), "a.txt", "a");
    repo.create_branch(branch("dev")).unwrap();
    write(dir.path(), "b.txt", "pending");
    repo.add(&name("b.txt")).unwrap();
    repo.save().unwrap();
    drop(repo);

    let mut repo = Repository::open(RepositoryConfig::new(dir.path())).unwrap();
    assert!(repo.staging().is_staged_for_addition(&name("b.txt")));
    assert_eq!(repo.branches().len(), 2);

    // staged bytes were captured at add time
    write(dir.path(), "b.txt", "edited later");
    repo.commit("commit pending").unwrap();
    let blob = repo.head_commit().unwrap().blob_for(&name("b.txt")).unwrap();
    assert_eq!(repo.store().get_blob(blob).unwrap().content(), b"pending");
}
