//! The closed set of commands a session understands.

use super::error::{CommandError, CommandResult};
use crate::storage::{BranchName, FileName};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Init,
    Add(FileName),
    Remove(FileName),
    Commit(String),
    /// `checkout -- <file>`
    CheckoutFile(FileName),
    /// `checkout <commit> -- <file>`
    CheckoutFileAt { commit: String, file: FileName },
    /// `checkout <branch>`
    CheckoutBranch(BranchName),
    Branch(BranchName),
    RemoveBranch(BranchName),
    Reset(String),
    Merge(BranchName),
    Log,
    GlobalLog,
    Find(String),
    Status,
}

impl Command {
    /// Parse the operands of `checkout`, which come in three shapes:
    ///
    /// ```text
    /// checkout -- <file>
    /// checkout <commit> -- <file>
    /// checkout <branch>
    /// ```
    pub fn checkout(operands: &[String]) -> CommandResult<Self> {
        match operands {
            [branch] if branch != "--" => Ok(Command::CheckoutBranch(BranchName::new(branch.as_str())?)),
            [dashes, file] if dashes == "--" => Ok(Command::CheckoutFile(FileName::new(file.as_str())?)),
            [commit, dashes, file] if dashes == "--" => Ok(Command::CheckoutFileAt {
                commit: commit.clone(),
                file: FileName::new(file.as_str())?,
            }),
            _ => Err(CommandError::IncorrectOperands(format!(
                "checkout {}",
                operands.join(" ")
            ))),
        }
    }

    /// Whether running this command changes refs, staging or files.
    pub fn is_mutating(&self) -> bool {
        !matches!(
            self,
            Command::Log | Command::GlobalLog | Command::Find(_) | Command::Status
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Init => "init",
            Command::Add(_) => "add",
            Command::Remove(_) => "rm",
            Command::Commit(_) => "commit",
            Command::CheckoutFile(_)
            | Command::CheckoutFileAt { .. }
            | Command::CheckoutBranch(_) => "checkout",
            Command::Branch(_) => "branch",
            Command::RemoveBranch(_) => "rm-branch",
            Command::Reset(_) => "reset",
            Command::Merge(_) => "merge",
            Command::Log => "log",
            Command::GlobalLog => "global-log",
            Command::Find(_) => "find",
            Command::Status => "status",
        }
    }
}
