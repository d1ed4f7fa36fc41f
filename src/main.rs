//! Main entry point for prefix-run.
//!
//! Parses the flags, initializes logging, runs the command under the
//! supervisor and exits with the child's exit code.

use anyhow::{Context, Result};
use clap::Parser;

use prefix_run::shell::EXIT_FAILURE;
use prefix_run::utils;
use prefix_run::{Cli, RunConfig, RunOutcome, Supervisor};

fn main() {
    // Usage errors print the help text and exit with status 2 here.
    let config = Cli::parse().into_config();

    let log_guard = utils::logger::init_logging(config.log_dir.as_deref());

    let code = match run(config) {
        Ok(RunOutcome::Failed { reason }) => {
            eprintln!("Error: wait for command: {}", reason);
            EXIT_FAILURE
        }
        Ok(outcome) => outcome.exit_code(),
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            EXIT_FAILURE
        }
    };

    // process::exit skips destructors; flush the log writer first.
    drop(log_guard);
    std::process::exit(code);
}

#[tokio::main]
async fn run(config: RunConfig) -> Result<RunOutcome> {
    tracing::info!(command = config.command.line(), "starting");
    Supervisor::new(config.command, config.prefix)
        .run()
        .await
        .context("start command")
}
