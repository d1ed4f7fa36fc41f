//! Command-line flags.
//!
//! Parsing failures (including a missing or empty `--command`) are reported
//! by clap on stderr together with the usage text, with exit status 2.

use std::path::PathBuf;

use clap::builder::NonEmptyStringValueParser;
use clap::Parser;

use crate::shell::ShellCommand;
use crate::stream::Prefix;

const EXAMPLES: &str = "\
Examples:
  prefix-run --command \"ls -lah\"
  prefix-run --append-text-line \"[abc] \" --command \"ls\"";

#[derive(Debug, Parser)]
#[command(name = "prefix-run", version)]
#[command(about = "Run a shell command, relaying its stdout and stderr with an optional line prefix")]
#[command(after_help = EXAMPLES)]
pub struct Cli {
    /// Command string to execute (example: "ls -lah" or "ls")
    #[arg(long, value_name = "CMD", value_parser = NonEmptyStringValueParser::new())]
    pub command: String,

    /// Prefix text to add at the beginning of each output line
    #[arg(
        long = "append-text-line",
        value_name = "TEXT",
        visible_alias = "prefix",
        alias = "apend-text-line",
        allow_hyphen_values = true
    )]
    pub append_text_line: Option<String>,

    /// Write diagnostic logs to a timestamped file in this directory
    #[arg(long, value_name = "DIR", env = "PREFIX_RUN_LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

/// Everything needed for one run, resolved from the flags.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub command: ShellCommand,
    pub prefix: Prefix,
    pub log_dir: Option<PathBuf>,
}

impl Cli {
    pub fn into_config(self) -> RunConfig {
        RunConfig {
            command: ShellCommand::new(self.command),
            prefix: Prefix::from(self.append_text_line),
            log_dir: self.log_dir,
        }
    }
}
