//! Ready-made encoder/decoder pairs for staged files.
//!
//! Each `write_*` function fits [`crate::io::staged::Encoder`] and each
//! `read_*` function fits [`crate::io::staged::Decoder`].

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

pub fn write_bytes<B: AsRef<[u8]>>(path: &Path, data: &B) -> Result<()> {
    fs::write(path, data.as_ref()).with_context(|| format!("write {}", path.display()))
}

pub fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("read {}", path.display()))
}

pub fn write_text<S: AsRef<str>>(path: &Path, text: &S) -> Result<()> {
    fs::write(path, text.as_ref()).with_context(|| format!("write {}", path.display()))
}

pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}

/// Serialize `value` to pretty-printed JSON with trailing newline.
pub fn write_json<V: Serialize>(path: &Path, value: &V) -> Result<()> {
    let mut payload = serde_json::to_string_pretty(value).context("serialize json")?;
    payload.push('\n');
    fs::write(path, payload).with_context(|| format!("write {}", path.display()))
}

pub fn read_json<V: DeserializeOwned>(path: &Path) -> Result<V> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse {}", path.display()))
}
