//! Exit status normalisation for external commands.

use std::process::ExitStatus;

/// The command ran and exited with code 0.
pub const SUCCESS: i32 = 0;
/// Default failure status: empty command line, shell launch failure, or no exit code.
pub const FAILURE: i32 = 1;

/// Collapse an [`ExitStatus`] into a single integer.
///
/// Normal exits keep their code. On unix a signal-terminated process reports
/// the negated signal number. Anything else becomes [`FAILURE`].
pub fn from_exit_status(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    signal_status(status).unwrap_or(FAILURE)
}

#[cfg(unix)]
fn signal_status(status: ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal().map(|signal| -signal)
}

#[cfg(not(unix))]
fn signal_status(_status: ExitStatus) -> Option<i32> {
    None
}
