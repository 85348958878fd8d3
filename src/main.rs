//! Gitlet - a minimal version-control system
//!
//! This is the main entry point for the gitlet command-line interface.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use gitlet::command::{Command, CommandError, Interpreter};
use gitlet::repo::RepositoryConfig;
use gitlet::storage::{BranchName, FileName};

/// Gitlet - a tiny version-control system
#[derive(Parser, Debug)]
#[command(name = "gitlet")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Run as if gitlet was started in this directory
    #[arg(short = 'C', long = "work-dir", global = true)]
    work_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Create a new repository in the working directory
    Init,
    /// Stage a file for the next commit
    Add { file: String },
    /// Unstage a file, or stage its removal
    Rm { file: String },
    /// Record the staged changes
    Commit { message: String },
    /// Restore a file, or switch branches
    ///
    /// checkout -- <file> | checkout <commit> -- <file> | checkout <branch>
    Checkout {
        /// commit id (with `-- <file>`) or branch name
        target: Option<String>,
        /// file to restore, given after `--`
        #[arg(last = true)]
        file: Option<String>,
    },
    /// Create a branch at the current head
    Branch { name: String },
    /// Delete a branch pointer
    RmBranch { name: String },
    /// Move the current branch to a commit and restore its files
    Reset { commit: String },
    /// Merge a branch into the current one
    Merge { branch: String },
    /// Show the first-parent history of the current head
    Log,
    /// Show every commit ever made
    GlobalLog,
    /// Print the ids of commits with the given message
    Find { message: String },
    /// Show branches, staged files and working-directory changes
    Status,
}

impl Cmd {
    fn into_command(self) -> Result<Command, CommandError> {
        let command = match self {
            Cmd::Init => Command::Init,
            Cmd::Add { file } => Command::Add(FileName::new(file)?),
            Cmd::Rm { file } => Command::Remove(FileName::new(file)?),
            Cmd::Commit { message } => Command::Commit(message),
            Cmd::Checkout { target, file } => {
                let mut operands: Vec<String> = target.into_iter().collect();
                if let Some(file) = file {
                    operands.push("--".into());
                    operands.push(file);
                }
                Command::checkout(&operands)?
            }
            Cmd::Branch { name } => Command::Branch(BranchName::new(name)?),
            Cmd::RmBranch { name } => Command::RemoveBranch(BranchName::new(name)?),
            Cmd::Reset { commit } => Command::Reset(commit),
            Cmd::Merge { branch } => Command::Merge(BranchName::new(branch)?),
            Cmd::Log => Command::Log,
            Cmd::GlobalLog => Command::GlobalLog,
            Cmd::Find { message } => Command::Find(message),
            Cmd::Status => Command::Status,
        };
        Ok(command)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let work_dir = cli.work_dir.unwrap_or_else(|| PathBuf::from("."));
    let config = RepositoryConfig::new(work_dir);
    let interpreter = Interpreter::new(config);

    let result = cli
        .command
        .into_command()
        .and_then(|command| interpreter.execute(command));
    match result {
        Ok(outcome) => {
            print!("{}", outcome);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
