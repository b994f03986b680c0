//! Synchronous execution of one assembled command line through the shell.
//!
//! The child inherits stdin/stdout/stderr and runs to completion; there is no
//! timeout and no way to cancel it.

use std::process::{Command, ExitStatus};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument};

/// Shell program and flags that precede the command line.
pub fn default_shell() -> Vec<String> {
    if cfg!(windows) {
        vec!["cmd".to_string(), "/C".to_string()]
    } else {
        vec!["sh".to_string(), "-c".to_string()]
    }
}

/// Hand `command_line` to `shell` and block until it exits.
///
/// Errors only when the shell itself cannot be launched.
#[instrument(skip_all, fields(shell = ?shell.first()))]
pub fn run_shell(shell: &[String], command_line: &str) -> Result<ExitStatus> {
    let (program, flags) = shell
        .split_first()
        .ok_or_else(|| anyhow!("shell command is empty"))?;

    let mut cmd = Command::new(program);
    cmd.args(flags).arg(command_line);

    debug!(command_line, "spawning shell");
    let status = match cmd.status() {
        Ok(status) => status,
        Err(e) => {
            debug!(err = %e, "failed to spawn shell");
            return Err(e).with_context(|| format!("spawn shell {program}"));
        }
    };

    debug!(exit_code = ?status.code(), "command finished");
    Ok(status)
}
