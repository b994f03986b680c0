//! Pure staging logic: file naming, command-line assembly, status codes.

pub mod command_line;
pub mod naming;
pub mod status;
