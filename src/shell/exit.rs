//! Mapping a finished run to the exit code we report.

use std::process::ExitStatus;

/// Generic failure: the child could not be started or waited on.
pub const EXIT_FAILURE: i32 = 1;
/// Invalid invocation (missing or empty `--command`).
pub const EXIT_USAGE: i32 = 2;

/// How one child invocation ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// Normal exit with the given status.
    Exited(i32),
    /// Killed by the given signal (Unix only).
    Signaled(i32),
    /// Waiting on the child failed, or no status could be determined.
    Failed { reason: String },
}

impl RunOutcome {
    pub fn from_status(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return Self::Exited(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return Self::Signaled(signal);
            }
        }
        Self::Failed {
            reason: format!("process ended without an exit status ({})", status),
        }
    }

    /// Exit code following shell conventions: the child's own status,
    /// `128 + signal` for a killed child, `1` for anything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Exited(code) => *code,
            Self::Signaled(signal) => 128 + signal,
            Self::Failed { .. } => EXIT_FAILURE,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code() == 0
    }
}
