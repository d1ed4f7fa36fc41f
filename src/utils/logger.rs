//! Logging initialization and configuration.
//!
//! Diagnostics must never mix with the child output we relay, so logging is
//! quiet unless asked for:
//!
//! - With a log directory, each run writes its own timestamped file there.
//! - Without one, events go to stderr only when `RUST_LOG` is set.
//!
//! The log level is controlled via the `RUST_LOG` environment variable:
//! - `RUST_LOG=debug` - Show debug and higher level logs
//! - `RUST_LOG=info` - Show info and higher level logs (default for files)
//! - `RUST_LOG=warn` - Show warnings and errors only

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the logging system.
///
/// Returns the guard of the non-blocking file writer when file logging is
/// active. Keep it alive for the whole run and drop it before exiting so
/// buffered lines are flushed.
pub fn init_logging(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    match log_dir {
        Some(dir) => init_file_logging(dir),
        None => {
            init_stderr_logging();
            None
        }
    }
}

/// Log file for a run started at `started`, e.g.
/// `logs/prefix-run.2024-12-06-14-30-25.log`.
pub fn log_file_path(dir: &Path, started: DateTime<Local>) -> PathBuf {
    let timestamp = started.format("%Y-%m-%d-%H-%M-%S");
    dir.join(format!("prefix-run.{}.log", timestamp))
}

fn init_file_logging(log_dir: &Path) -> Option<WorkerGuard> {
    if let Err(e) = fs::create_dir_all(log_dir) {
        eprintln!("Warning: Failed to create logs directory: {}", e);
        return None;
    }

    let log_path = log_file_path(log_dir, Local::now());
    let log_file = match fs::File::create(&log_path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Warning: Failed to create log file: {}", e);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(log_file);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false) // No ANSI colors in log files
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    tracing::info!("Logging initialized - writing to {}", log_path.display());
    Some(guard)
}

fn init_stderr_logging() {
    // Off unless RUST_LOG says otherwise.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off"));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .init();
}
