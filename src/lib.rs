//! Gitlet - a minimal version-control engine
//!
//! Files are snapshotted into immutable, content-addressed commits that form
//! a DAG. On top of that sit a staging area, named branches, checkout and
//! reset, and a three-way merge with conflict markers.
//!
//! # Example
//!
//! ```no_run
//! use gitlet::command::{Command, Interpreter};
//! use gitlet::repo::RepositoryConfig;
//! use gitlet::storage::FileName;
//!
//! let interpreter = Interpreter::new(RepositoryConfig::new("."));
//! interpreter.execute(Command::Init).unwrap();
//! interpreter.execute(Command::Add(FileName::new("notes.txt").unwrap())).unwrap();
//! interpreter.execute(Command::Commit("add notes".into())).unwrap();
//! print!("{}", interpreter.execute(Command::Log).unwrap());
//! ```

pub mod command;
pub mod repo;
pub mod storage;
