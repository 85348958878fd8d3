//! Command layer for gitlet.
//!
//! Every user-facing operation is a variant of the closed [`Command`] enum;
//! the [`Interpreter`] opens the repository, dispatches the command and
//! persists the session when the command mutated it.

#[allow(clippy::module_inception)]
mod command;
mod error;
mod executor;
mod result;

pub use command::Command;
pub use error::{CommandError, CommandResult};
pub use executor::Interpreter;
pub use result::{Outcome, DATE_FORMAT};
