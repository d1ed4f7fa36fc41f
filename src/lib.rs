//! prefix-run - run a shell command and relay its output line by line.
//!
//! This library provides the pieces behind the `prefix-run` binary:
//! - A line-prefixing writer that tags every output line
//! - Relays that drain the child's stdout and stderr concurrently
//! - A supervisor that runs the child and waits for all output to drain
//! - Mapping of the child's termination to an exit code
//!
//! # Example
//!
//! ```no_run
//! use prefix_run::{Prefix, ShellCommand, Supervisor};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let supervisor = Supervisor::new(ShellCommand::new("ls -lah"), Prefix::from("[ls] "));
//!     let outcome = supervisor.run().await?;
//!     std::process::exit(outcome.exit_code());
//! }
//! ```

pub mod cli;
pub mod shell;
pub mod stream;
pub mod utils;

// Re-export commonly used types
pub use cli::{Cli, RunConfig};
pub use shell::{LaunchError, RunOutcome, ShellCommand, Supervisor};
pub use stream::{LinePrefixWriter, Prefix, PrefixWriteError};
