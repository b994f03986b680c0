//! Test-only helpers for scratch directories and log capture.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tracing::Level;

use crate::io::staged::StageRoot;

/// A fresh temp directory and a stage root pointing at it.
///
/// Keep the `TempDir` alive for as long as the root is used.
pub fn scratch_root() -> Result<(tempfile::TempDir, StageRoot)> {
    let temp = tempfile::tempdir().context("create scratch dir")?;
    let root = StageRoot::new(temp.path());
    Ok((temp, root))
}

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.0.lock() {
            Ok(mut inner) => inner.extend_from_slice(buf),
            Err(poisoned) => poisoned.into_inner().extend_from_slice(buf),
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` with a thread-local subscriber and return the WARN lines it logged.
pub fn capture_warnings<R>(f: impl FnOnce() -> R) -> (R, Vec<String>) {
    let (result, lines) = capture_events(f);
    let warnings = lines
        .into_iter()
        .filter(|line| line.contains("WARN"))
        .collect();
    (result, warnings)
}

/// Run `f` with a thread-local subscriber and return every WARN or ERROR line.
pub fn capture_events<R>(f: impl FnOnce() -> R) -> (R, Vec<String>) {
    let buf = SharedBuf::default();
    let writer = buf.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_max_level(Level::WARN)
        .with_ansi(false)
        .without_time()
        .finish();

    let result = tracing::subscriber::with_default(subscriber, f);

    let bytes = match buf.0.lock() {
        Ok(inner) => inner.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    };
    let lines = String::from_utf8_lossy(&bytes)
        .lines()
        .map(str::to_string)
        .collect();
    (result, lines)
}
