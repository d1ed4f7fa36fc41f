//! Child process supervision.
//!
//! The supervisor starts the shell command with piped stdout and stderr,
//! drains both pipes concurrently through their own prefix writers, and only
//! reports an outcome once the child has exited and both relays are done.
//! Draining one stream before the other could deadlock a child that fills
//! the pipe nobody is reading.

use std::fmt;
use std::io;
use std::process::Stdio;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, info, warn};

use super::command::ShellCommand;
use super::exit::RunOutcome;
use crate::stream::{relay, LinePrefixWriter, Prefix, StreamKind};

/// The child could not be brought to the running state.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("child {0} was not captured")]
    MissingPipe(StreamKind),
}

/// Lifecycle of one supervised run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    Running,
    WaitingForStreams,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::NotStarted => "not-started",
            Phase::Running => "running",
            Phase::WaitingForStreams => "waiting-for-streams",
            Phase::Done => "done",
        };
        f.write_str(name)
    }
}

/// Result of [`Supervisor::run_with`]: the outcome plus the sinks handed back.
#[derive(Debug)]
pub struct Captured<O, E> {
    pub outcome: RunOutcome,
    pub stdout: O,
    pub stderr: E,
}

/// Runs one shell command and relays its output.
#[derive(Clone, Debug)]
pub struct Supervisor {
    command: ShellCommand,
    prefix: Prefix,
}

impl Supervisor {
    pub fn new(command: ShellCommand, prefix: Prefix) -> Self {
        Self { command, prefix }
    }

    /// Runs the command, relaying to this process's own stdout and stderr.
    pub async fn run(self) -> Result<RunOutcome, LaunchError> {
        let captured = self
            .run_with(tokio::io::stdout(), tokio::io::stderr())
            .await?;
        Ok(captured.outcome)
    }

    /// Runs the command, relaying the child's stdout to `out` and its stderr
    /// to `err`.
    ///
    /// Returns once the child has exited and both streams are drained.
    ///
    /// # Errors
    /// Returns [`LaunchError`] if the child cannot be spawned or a pipe is
    /// missing. Problems after that point are folded into the
    /// [`RunOutcome`].
    pub async fn run_with<O, E>(self, out: O, err: E) -> Result<Captured<O, E>, LaunchError>
    where
        O: AsyncWrite + Unpin + Send + 'static,
        E: AsyncWrite + Unpin + Send + 'static,
    {
        debug!(phase = %Phase::NotStarted, command = self.command.line(), "launching");

        let mut cmd = self.command.to_command();
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|source| LaunchError::Spawn {
            command: self.command.line().to_string(),
            source,
        })?;

        let (child_stdout, child_stderr) = match (child.stdout.take(), child.stderr.take()) {
            (Some(stdout), Some(stderr)) => (stdout, stderr),
            (stdout, _) => {
                if let Err(e) = child.start_kill() {
                    warn!("Failed to kill child after pipe setup failed: {}", e);
                }
                let missing = if stdout.is_none() {
                    StreamKind::Stdout
                } else {
                    StreamKind::Stderr
                };
                return Err(LaunchError::MissingPipe(missing));
            }
        };
        info!(phase = %Phase::Running, pid = ?child.id(), "child started");

        let stdout_task = spawn_relay(
            StreamKind::Stdout,
            child_stdout,
            LinePrefixWriter::new(out, self.prefix.clone()),
        );
        let stderr_task = spawn_relay(
            StreamKind::Stderr,
            child_stderr,
            LinePrefixWriter::new(err, self.prefix),
        );

        debug!(phase = %Phase::WaitingForStreams, "waiting for child and relays");
        let outcome = match child.wait().await {
            Ok(status) => RunOutcome::from_status(status),
            Err(e) => {
                error!("Failed to wait for child: {}", e);
                RunOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        // Both relays must finish before the outcome is reported, otherwise
        // output written just before exit could be lost.
        let (stdout_sink, stderr_sink) = tokio::join!(stdout_task, stderr_task);
        let stdout = finished_sink(stdout_sink);
        let stderr = finished_sink(stderr_sink);

        info!(phase = %Phase::Done, exit_code = outcome.exit_code(), "child finished");
        Ok(Captured {
            outcome,
            stdout,
            stderr,
        })
    }
}

fn spawn_relay<R, W>(kind: StreamKind, source: R, mut sink: LinePrefixWriter<W>) -> JoinHandle<W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        relay(kind, source, &mut sink).await;
        sink.into_inner()
    })
}

/// Relays never return errors, so a join failure can only be a panic inside
/// one; re-raise it here.
fn finished_sink<W>(joined: Result<W, JoinError>) -> W {
    match joined {
        Ok(sink) => sink,
        Err(e) => std::panic::resume_unwind(e.into_panic()),
    }
}
