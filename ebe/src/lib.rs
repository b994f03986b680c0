//! External binary encapsulation.
//!
//! Stage typed data as temporary files, hand them to an external program on
//! its command line, and read typed results back. The crate is split the same
//! way as the work it does:
//!
//! - **[`core`]**: Pure logic (file naming, command-line tokens, status codes).
//! - **[`io`]**: Staged files, codecs, shell execution, configuration.
//!
//! [`invoke`] ties them together into one eager call, and [`run`] drives it
//! from the `ebe` CLI.

pub mod core;
pub mod exit_codes;
pub mod invoke;
pub mod io;
pub mod logging;
pub mod run;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use crate::core::command_line::{Arg, Staged};
pub use crate::invoke::{Invocation, InvokeOptions};
pub use crate::io::staged::{StageRoot, StagedFile, StagedFileBuilder};
