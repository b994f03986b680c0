//! Staging configuration stored in `ebe.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::invoke::InvokeOptions;
use crate::io::process::default_shell;
use crate::io::staged::StageRoot;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "ebe.toml";

/// Staging configuration (TOML).
///
/// Missing fields fall back to defaults, so an empty file is valid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EbeConfig {
    /// Directory for staged files. Unset means the platform temp directory.
    pub tmp_root: Option<PathBuf>,

    /// Log a warning with the command line when a command exits non-zero.
    pub warn_on_failure: bool,

    /// Shell program and flags that receive the assembled command line
    /// (e.g. `["sh","-c"]`).
    pub shell: Vec<String>,
}

impl Default for EbeConfig {
    fn default() -> Self {
        Self {
            tmp_root: None,
            warn_on_failure: true,
            shell: default_shell(),
        }
    }
}

impl EbeConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(root) = &self.tmp_root
            && root.as_os_str().is_empty()
        {
            return Err(anyhow!("tmp_root must not be empty when set"));
        }
        if self.shell.is_empty() || self.shell[0].trim().is_empty() {
            return Err(anyhow!("shell must be a non-empty array"));
        }
        Ok(())
    }

    pub fn stage_root(&self) -> StageRoot {
        match &self.tmp_root {
            Some(root) => StageRoot::new(root),
            None => StageRoot::default(),
        }
    }

    pub fn invoke_options(&self) -> InvokeOptions {
        InvokeOptions {
            warn_on_failure: self.warn_on_failure,
            shell: self.shell.clone(),
        }
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `EbeConfig::default()`.
pub fn load_config(path: &Path) -> Result<EbeConfig> {
    if !path.exists() {
        let cfg = EbeConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: EbeConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
///
/// A bare file name such as `ebe.toml` is written in the working directory.
pub fn write_config(path: &Path, cfg: &EbeConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
