//! Command-line tokens and their naive assembly into one shell string.

use std::fmt;
use std::path::Path;

use anyhow::Result;

/// A file handle that can appear on a command line.
///
/// Implemented by [`crate::io::staged::StagedFile`]; the invocation only needs
/// the resolved path and, for inputs, a way to materialise the data.
pub trait Staged {
    /// Resolved path of the primary file.
    fn path(&self) -> &Path;

    /// True when the data must be written before the command runs.
    fn is_input(&self) -> bool;

    /// Write the pending data to [`Staged::path`].
    fn write(&self) -> Result<()>;
}

/// One token of an external command.
pub enum Arg<'a> {
    Literal(String),
    File(&'a dyn Staged),
}

impl<'a> Arg<'a> {
    pub fn literal(value: impl Into<String>) -> Self {
        Arg::Literal(value.into())
    }

    pub fn file(file: &'a dyn Staged) -> Self {
        Arg::File(file)
    }

    /// Text that lands on the command line. Files resolve to their path.
    pub fn render(&self) -> String {
        match self {
            Arg::Literal(value) => value.clone(),
            Arg::File(file) => file.path().to_string_lossy().into_owned(),
        }
    }

    /// The staged file behind this token if it has data to write.
    pub fn as_input(&self) -> Option<&'a dyn Staged> {
        match self {
            Arg::File(file) if file.is_input() => Some(*file),
            _ => None,
        }
    }
}

impl fmt::Debug for Arg<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Arg::File(file) => f.debug_tuple("File").field(&file.path()).finish(),
        }
    }
}

impl From<&str> for Arg<'_> {
    fn from(value: &str) -> Self {
        Arg::Literal(value.to_string())
    }
}

impl From<String> for Arg<'_> {
    fn from(value: String) -> Self {
        Arg::Literal(value)
    }
}

/// Render every token.
pub fn render_all(args: &[Arg<'_>]) -> Vec<String> {
    args.iter().map(Arg::render).collect()
}

/// Join rendered tokens with single spaces.
///
/// Nothing is quoted or escaped: a token containing spaces or shell
/// metacharacters reaches the shell as-is.
pub fn assemble(argv: &[String]) -> String {
    argv.join(" ")
}
