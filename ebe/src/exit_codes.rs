//! Stable exit codes for the `ebe` CLI.

/// The external command succeeded.
pub const OK: i32 = 0;
/// The external command failed without a usable exit code.
pub const COMMAND_FAILED: i32 = 1;
/// Staging failed before or after the command: bad config, arguments,
/// encode or decode errors.
pub const STAGING_FAILED: i32 = 125;

/// Map an invocation status onto a process exit code.
///
/// Codes 1..=255 pass through, signals become `128 + signal`.
pub fn from_status(status: i32) -> i32 {
    match status {
        0 => OK,
        1..=255 => status,
        s if s < 0 => 128 + s.unsigned_abs().min(127) as i32,
        _ => COMMAND_FAILED,
    }
}
