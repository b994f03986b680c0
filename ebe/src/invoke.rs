//! One eager, synchronous call of an external command.
//!
//! [`Invocation::run`] renders the argument tokens, writes every input file
//! in argument order, hands the joined command line to the shell and records
//! the exit status. A failing command is reported through
//! [`Invocation::status`], never as an `Err`; only encoder errors propagate.
//! The first encoder error aborts the call before anything is executed.

use std::fmt;

use anyhow::Result;
use tracing::{debug, instrument, warn};

use crate::core::command_line::{Arg, assemble, render_all};
use crate::core::status::{FAILURE, SUCCESS, from_exit_status};
use crate::io::process::{default_shell, run_shell};

/// Settings for a single invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeOptions {
    /// Log a warning containing the command line when the status is non-zero.
    pub warn_on_failure: bool,
    /// Shell program and flags that receive the command line.
    pub shell: Vec<String>,
}

impl Default for InvokeOptions {
    fn default() -> Self {
        Self {
            warn_on_failure: true,
            shell: default_shell(),
        }
    }
}

/// A finished external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    argv: Vec<String>,
    command_line: String,
    status: i32,
    warn_on_failure: bool,
}

impl Invocation {
    /// Write inputs, run the command and wait for it.
    #[instrument(skip_all, fields(tokens = args.len()))]
    pub fn run(args: &[Arg<'_>], options: &InvokeOptions) -> Result<Self> {
        let argv = render_all(args);
        let command_line = assemble(&argv);

        for input in args.iter().filter_map(Arg::as_input) {
            input.write()?;
        }

        let status = if command_line.is_empty() {
            debug!("empty command line, nothing to execute");
            FAILURE
        } else {
            match run_shell(&options.shell, &command_line) {
                Ok(status) => from_exit_status(status),
                Err(e) => {
                    debug!(err = %e, "shell launch failed");
                    FAILURE
                }
            }
        };

        if options.warn_on_failure && status != SUCCESS {
            warn!(status, "command line failed to execute: {command_line}");
        }

        Ok(Self {
            argv,
            command_line,
            status,
            warn_on_failure: options.warn_on_failure,
        })
    }

    /// Run with [`InvokeOptions::default`].
    pub fn run_default(args: &[Arg<'_>]) -> Result<Self> {
        Self::run(args, &InvokeOptions::default())
    }

    /// Exit status: 0 on success, non-zero otherwise.
    pub fn status(&self) -> i32 {
        self.status
    }

    pub fn success(&self) -> bool {
        self.status == SUCCESS
    }

    /// Rendered tokens, in order.
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// The exact string handed to the shell.
    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    pub fn warn_on_failure(&self) -> bool {
        self.warn_on_failure
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line)
    }
}
