//! Shell invocation for a single command line.

use tokio::process::Command;

/// Platform shell interpreter and the flag that makes it run one command
/// string: `/bin/sh -c` on Unix, `cmd.exe /C` on Windows.
pub fn shell_program() -> (&'static str, &'static str) {
    if cfg!(windows) {
        ("cmd.exe", "/C")
    } else {
        ("/bin/sh", "-c")
    }
}

/// A command line to be run through a shell interpreter.
///
/// Going through the shell keeps pipes, globs and redirections inside the
/// command string working.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShellCommand {
    shell: String,
    flag: String,
    line: String,
}

impl ShellCommand {
    /// Runs `line` through the platform shell.
    pub fn new(line: impl Into<String>) -> Self {
        let (shell, flag) = shell_program();
        Self::with_shell(shell, flag, line)
    }

    /// Runs `line` through an explicit interpreter, e.g. `("bash", "-c")`.
    pub fn with_shell(
        shell: impl Into<String>,
        flag: impl Into<String>,
        line: impl Into<String>,
    ) -> Self {
        Self {
            shell: shell.into(),
            flag: flag.into(),
            line: line.into(),
        }
    }

    pub fn line(&self) -> &str {
        &self.line
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }

    /// Builds the process to spawn. Stdio is left for the caller to set up.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.shell);
        cmd.arg(&self.flag).arg(&self.line);
        // The child always runs to completion, even if we stop waiting.
        cmd.kill_on_drop(false);
        cmd
    }
}
