//! `ebe run`: stage files named on the command line and call one external command.
//!
//! Tokens prefixed with `in:` name a local file whose bytes are staged as an
//! input; `out:` names a local destination that receives the bytes of a
//! staged output once the command succeeds. Every other token is passed
//! through literally. Staged files take the extension of the local path as
//! their suffix.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, instrument, warn};

use crate::core::command_line::Arg;
use crate::invoke::Invocation;
use crate::io::codec::{read_bytes, write_bytes};
use crate::io::config::EbeConfig;
use crate::io::staged::{StageRoot, StagedFile};

const INPUT_PREFIX: &str = "in:";
const OUTPUT_PREFIX: &str = "out:";

/// A parsed CLI token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Literal(String),
    Input(PathBuf),
    Output(PathBuf),
}

pub fn parse_token(raw: &str) -> Result<Token> {
    if let Some(path) = raw.strip_prefix(INPUT_PREFIX) {
        if path.is_empty() {
            bail!("`{INPUT_PREFIX}` token needs a path");
        }
        return Ok(Token::Input(PathBuf::from(path)));
    }
    if let Some(path) = raw.strip_prefix(OUTPUT_PREFIX) {
        if path.is_empty() {
            bail!("`{OUTPUT_PREFIX}` token needs a path");
        }
        return Ok(Token::Output(PathBuf::from(path)));
    }
    Ok(Token::Literal(raw.to_string()))
}

/// Result of `ebe run`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub status: i32,
    pub command_line: String,
    /// Local files written from staged outputs.
    pub outputs: Vec<PathBuf>,
}

enum Slot {
    Literal(String),
    Input(StagedFile<Vec<u8>>),
    Output(StagedFile<Vec<u8>>, PathBuf),
}

/// Stage, execute, collect, and release.
///
/// Staged files are closed on every path; a close failure is only reported
/// when nothing else failed first.
#[instrument(skip_all, fields(tokens = tokens.len()))]
pub fn run_tokens(tokens: &[String], config: &EbeConfig) -> Result<RunOutcome> {
    let parsed = tokens
        .iter()
        .map(|raw| parse_token(raw))
        .collect::<Result<Vec<_>>>()?;

    let root = config.stage_root();
    let mut slots = Vec::with_capacity(parsed.len());
    for token in parsed {
        let slot = match stage(&root, token) {
            Ok(slot) => slot,
            Err(err) => {
                // Slots staged so far have written nothing yet.
                if let Err(close_err) = release(slots) {
                    warn!(err = ?close_err, "failed to release staged files");
                }
                return Err(err);
            }
        };
        slots.push(slot);
    }

    let result = execute(&slots, config);
    let released = release(slots);
    let outcome = result?;
    released?;
    Ok(outcome)
}

fn stage(root: &StageRoot, token: Token) -> Result<Slot> {
    match token {
        Token::Literal(value) => Ok(Slot::Literal(value)),
        Token::Input(src) => {
            let bytes = fs::read(&src).with_context(|| format!("read input {}", src.display()))?;
            let mut builder = StagedFile::input(root, write_bytes::<Vec<u8>>, bytes);
            if let Some(suffix) = suffix_of(&src) {
                builder = builder.suffix(suffix);
            }
            Ok(Slot::Input(builder.build()))
        }
        Token::Output(dest) => {
            let mut builder = StagedFile::output(root, read_bytes);
            if let Some(suffix) = suffix_of(&dest) {
                builder = builder.suffix(suffix);
            }
            Ok(Slot::Output(builder.build(), dest))
        }
    }
}

fn execute(slots: &[Slot], config: &EbeConfig) -> Result<RunOutcome> {
    let args: Vec<Arg<'_>> = slots
        .iter()
        .map(|slot| match slot {
            Slot::Literal(value) => Arg::literal(value.as_str()),
            Slot::Input(file) | Slot::Output(file, _) => Arg::from(file),
        })
        .collect();

    let invocation = Invocation::run(&args, &config.invoke_options())?;

    let mut outputs = Vec::new();
    if invocation.success() {
        // Decode everything before touching any destination.
        let mut collected = Vec::new();
        for slot in slots {
            if let Slot::Output(file, dest) = slot {
                collected.push((dest, file.read()?));
            }
        }
        for (dest, bytes) in collected {
            fs::write(dest, bytes).with_context(|| format!("write output {}", dest.display()))?;
            debug!(dest = %dest.display(), "collected output");
            outputs.push(dest.clone());
        }
    }

    Ok(RunOutcome {
        status: invocation.status(),
        command_line: invocation.command_line().to_string(),
        outputs,
    })
}

fn release(slots: Vec<Slot>) -> Result<()> {
    let mut first_err = None;
    for slot in slots {
        let closed = match slot {
            Slot::Literal(_) => Ok(()),
            Slot::Input(file) | Slot::Output(file, _) => file.close(),
        };
        if let Err(err) = closed
            && first_err.is_none()
        {
            first_err = Some(err);
        }
    }
    match first_err {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn suffix_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
}
