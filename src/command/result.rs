//! Command results and their text rendering.
//!
//! Most mutating commands succeed silently; their `Display` output is
//! empty. Queries render in the classic Gitlet layout.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::repo::{AddOutcome, CheckoutOutcome, MergeOutcome, Modification, RemoveOutcome, Status};
use crate::storage::{BranchName, Commit, CommitId, FileName};

/// `Date:` line format, e.g. `Thu Jan 1 00:00:00 1970 +0000`.
pub const DATE_FORMAT: &str = "%a %b %-d %H:%M:%S %Y %z";

/// Result of executing a command.
#[derive(Debug, Clone)]
pub enum Outcome {
    Initialized { meta_dir: PathBuf, root: CommitId },
    Added { file: FileName, outcome: AddOutcome },
    Removed { file: FileName, outcome: RemoveOutcome },
    Committed(CommitId),
    Checkout(CheckoutOutcome),
    BranchCreated { branch: BranchName, at: CommitId },
    BranchRemoved(BranchName),
    Reset(CommitId),
    Merge(MergeOutcome),
    Log(Vec<Arc<Commit>>),
    Found(Vec<CommitId>),
    Status(Status),
}

fn write_commit(f: &mut fmt::Formatter<'_>, commit: &Commit) -> fmt::Result {
    writeln!(f, "===")?;
    writeln!(f, "commit {}", commit.id())?;
    if let (Some(first), Some(second)) = (commit.parent(), commit.second_parent()) {
        writeln!(f, "Merge: {} {}", first.short(), second.short())?;
    }
    writeln!(f, "Date: {}", commit.timestamp().format(DATE_FORMAT))?;
    writeln!(f, "{}", commit.message())?;
    writeln!(f)
}

fn write_section<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    items: impl IntoIterator<Item = T>,
) -> fmt::Result {
    writeln!(f, "=== {} ===", title)?;
    for item in items {
        writeln!(f, "{}", item)?;
    }
    writeln!(f)
}

impl fmt::Display for Modification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modification::Modified => write!(f, "modified"),
            Modification::Deleted => write!(f, "deleted"),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let branches = self.branches.iter().map(|b| {
            if *b == self.active {
                format!("*{}", b)
            } else {
                b.to_string()
            }
        });
        write_section(f, "Branches", branches)?;
        write_section(f, "Staged Files", &self.staged)?;
        write_section(f, "Removed Files", &self.removed)?;
        write_section(
            f,
            "Modifications Not Staged For Commit",
            self.modified.iter().map(|(name, how)| format!("{} ({})", name, how)),
        )?;
        write_section(f, "Untracked Files", &self.untracked)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Log(commits) => commits.iter().try_for_each(|c| write_commit(f, c)),
            Outcome::Found(ids) => ids.iter().try_for_each(|id| writeln!(f, "{}", id)),
            Outcome::Status(status) => write!(f, "{}", status),
            Outcome::Checkout(CheckoutOutcome::AlreadyOnBranch(_)) => {
                writeln!(f, "No need to checkout the current branch.")
            }
            Outcome::Merge(MergeOutcome::AlreadyAncestor) => {
                writeln!(f, "Given branch is an ancestor of the current branch.")
            }
            Outcome::Merge(MergeOutcome::FastForwarded { .. }) => {
                writeln!(f, "Current branch fast-forwarded.")
            }
            Outcome::Merge(outcome) if outcome.has_conflicts() => {
                writeln!(f, "Encountered a merge conflict.")
            }
            _ => Ok(()),
        }
    }
}
