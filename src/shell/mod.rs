//! Shell execution and process supervision.
//!
//! This module builds the shell invocation for a command line, supervises
//! the child while its output is relayed, and maps the way it ended to an
//! exit code.

mod command;
mod exit;
mod supervisor;

pub use command::{shell_program, ShellCommand};
pub use exit::{RunOutcome, EXIT_FAILURE, EXIT_USAGE};
pub use supervisor::{Captured, LaunchError, Phase, Supervisor};
