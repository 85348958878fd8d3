//! Command interpreter.

use super::command::Command;
use super::error::CommandResult;
use super::result::Outcome;
use crate::repo::{Repository, RepositoryConfig};
use crate::storage::StorageError;

/// Runs commands against the repository described by its config.
///
/// Each call opens the repository, runs one command and, if the command
/// changed anything, writes the session state back.
pub struct Interpreter {
    config: RepositoryConfig,
}

impl Interpreter {
    pub fn new(config: RepositoryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Execute a single command.
    pub fn execute(&self, command: Command) -> CommandResult<Outcome> {
        log::debug!("executing {}", command.name());
        if command == Command::Init {
            let repo = Repository::init(self.config.clone())?;
            return Ok(Outcome::Initialized {
                meta_dir: repo.config().meta_dir(),
                root: repo.refs().head(),
            });
        }

        let mut repo = Repository::open(self.config.clone())?;
        let mutating = command.is_mutating();
        let outcome = Self::execute_command(&mut repo, command)?;
        if mutating {
            repo.save()?;
        }
        Ok(outcome)
    }

    /// Execute a command on an already open session. Does not save.
    pub fn execute_command(repo: &mut Repository, command: Command) -> CommandResult<Outcome> {
        let outcome = match command {
            Command::Init => {
                return Err(StorageError::AlreadyInitialized(repo.config().meta_dir()).into())
            }
            Command::Add(file) => {
                let outcome = repo.add(&file)?;
                Outcome::Added { file, outcome }
            }
            Command::Remove(file) => {
                let outcome = repo.remove(&file)?;
                Outcome::Removed { file, outcome }
            }
            Command::Commit(message) => Outcome::Committed(repo.commit(&message)?),
            Command::CheckoutFile(file) => Outcome::Checkout(repo.checkout_file(&file)?),
            Command::CheckoutFileAt { commit, file } => {
                Outcome::Checkout(repo.checkout_file_at(&commit, &file)?)
            }
            Command::CheckoutBranch(branch) => Outcome::Checkout(repo.checkout_branch(&branch)?),
            Command::Branch(branch) => {
                let at = repo.create_branch(branch.clone())?;
                Outcome::BranchCreated { branch, at }
            }
            Command::RemoveBranch(branch) => {
                repo.remove_branch(&branch)?;
                Outcome::BranchRemoved(branch)
            }
            Command::Reset(commit) => Outcome::Reset(repo.reset(&commit)?),
            Command::Merge(branch) => Outcome::Merge(repo.merge(&branch)?),
            Command::Log => Outcome::Log(repo.log()?),
            Command::GlobalLog => Outcome::Log(repo.global_log()?),
            Command::Find(message) => Outcome::Found(repo.find(&message)?),
            Command::Status => Outcome::Status(repo.status()?),
        };
        Ok(outcome)
    }
}
