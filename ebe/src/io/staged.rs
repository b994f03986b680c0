//! Temporary files that carry typed data into and out of external commands.
//!
//! A [`StagedFile`] pairs a generated path with an optional encoder (input
//! handle: written before the command runs) and an optional decoder (output
//! handle: read after the command has produced it). Formats that spread one
//! artifact over several files register the sibling suffixes so that
//! [`StagedFile::exists`] and [`StagedFile::clear`] cover all of them.
//!
//! The handle is a scoped guard. [`StagedFile::close`] releases it explicitly;
//! dropping an unreleased handle whose files are still on disk logs a warning
//! and removes them.

use std::env;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, warn};

use crate::core::command_line::{Arg, Staged};
use crate::core::naming::{NameParts, compose_name};

/// Writes `data` to the given path.
pub type Encoder<T> = Box<dyn Fn(&Path, &T) -> Result<()> + Send + Sync>;
/// Reads a value back from the given path.
pub type Decoder<T> = Box<dyn Fn(&Path) -> Result<T> + Send + Sync>;

/// Directory that staged files are placed in unless overridden per file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRoot(PathBuf);

impl StageRoot {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self(dir.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl Default for StageRoot {
    /// The platform temp directory.
    fn default() -> Self {
        Self(env::temp_dir())
    }
}

#[must_use = "a staged file removes its backing files when dropped; call `close` when done"]
pub struct StagedFile<T> {
    path: PathBuf,
    extra_suffixes: Vec<String>,
    writer: Option<Encoder<T>>,
    reader: Option<Decoder<T>>,
    data: Option<T>,
    released: bool,
}

impl<T> StagedFile<T> {
    pub fn builder(root: &StageRoot) -> StagedFileBuilder<T> {
        StagedFileBuilder::new(root)
    }

    /// Builder for an input handle that writes `data` with `encoder`.
    pub fn input<E>(root: &StageRoot, encoder: E, data: T) -> StagedFileBuilder<T>
    where
        E: Fn(&Path, &T) -> Result<()> + Send + Sync + 'static,
    {
        StagedFileBuilder::new(root).writer(encoder, data)
    }

    /// Builder for an output handle read back with `decoder`.
    pub fn output<D>(root: &StageRoot, decoder: D) -> StagedFileBuilder<T>
    where
        D: Fn(&Path) -> Result<T> + Send + Sync + 'static,
    {
        StagedFileBuilder::new(root).reader(decoder)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn extra_suffixes(&self) -> &[String] {
        &self.extra_suffixes
    }

    /// Replace the sibling suffixes, e.g. once the output format is known.
    pub fn set_extra_suffixes<I, S>(&mut self, suffixes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_suffixes = suffixes.into_iter().map(Into::into).collect();
    }

    pub fn set_writer<E>(&mut self, encoder: E)
    where
        E: Fn(&Path, &T) -> Result<()> + Send + Sync + 'static,
    {
        self.writer = Some(Box::new(encoder));
    }

    pub fn set_reader<D>(&mut self, decoder: D)
    where
        D: Fn(&Path) -> Result<T> + Send + Sync + 'static,
    {
        self.reader = Some(Box::new(decoder));
    }

    pub fn set_data(&mut self, data: T) {
        self.data = Some(data);
    }

    /// Data waiting to be written, if any.
    pub fn pending_data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn is_input(&self) -> bool {
        self.writer.is_some()
    }

    pub fn is_output(&self) -> bool {
        self.reader.is_some()
    }

    /// Primary path followed by one path per extra suffix.
    pub fn all_paths(&self) -> Vec<PathBuf> {
        let mut paths = Vec::with_capacity(1 + self.extra_suffixes.len());
        paths.push(self.path.clone());
        for suffix in &self.extra_suffixes {
            let mut sibling = OsString::from(self.path.as_os_str());
            sibling.push(suffix);
            paths.push(PathBuf::from(sibling));
        }
        paths
    }

    /// True if the primary file or any sibling file exists.
    pub fn exists(&self) -> bool {
        self.all_paths().iter().any(|path| path.is_file())
    }

    /// Run the encoder on the pending data.
    pub fn write(&self) -> Result<()> {
        let writer = self
            .writer
            .as_ref()
            .ok_or_else(|| anyhow!("staged file {} has no writer", self.path.display()))?;
        let data = self
            .data
            .as_ref()
            .ok_or_else(|| anyhow!("staged file {} has no data to write", self.path.display()))?;
        debug!(path = %self.path.display(), "writing staged file");
        writer(&self.path, data).with_context(|| format!("encode {}", self.path.display()))
    }

    /// Run the decoder on the file.
    ///
    /// Reading before the file was produced surfaces whatever error the
    /// decoder reports for a missing file.
    pub fn read(&self) -> Result<T> {
        let reader = self
            .reader
            .as_ref()
            .ok_or_else(|| anyhow!("staged file {} has no reader", self.path.display()))?;
        reader(&self.path).with_context(|| format!("decode {}", self.path.display()))
    }

    /// Remove the primary file and every sibling file that exists.
    ///
    /// Safe to call repeatedly. Every path is attempted even if an earlier
    /// removal fails; the first failure is returned.
    pub fn clear(&self) -> Result<()> {
        let mut first_err = None;
        for path in self.all_paths() {
            if !path.is_file() {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "removed staged file"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %path.display(), err = %e, "failed to remove staged file");
                    if first_err.is_none() {
                        first_err = Some(
                            anyhow::Error::new(e).context(format!("remove {}", path.display())),
                        );
                    }
                }
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Release the handle, removing its files.
    pub fn close(mut self) -> Result<()> {
        self.released = true;
        self.clear()
    }
}

impl<T> Drop for StagedFile<T> {
    fn drop(&mut self) {
        if self.released || !self.exists() {
            return;
        }
        warn!(
            path = %self.path.display(),
            "staged file was not closed before being dropped, removing"
        );
        // Errors were already logged by clear.
        let _ = self.clear();
    }
}

impl<T> Staged for StagedFile<T> {
    fn path(&self) -> &Path {
        &self.path
    }

    fn is_input(&self) -> bool {
        self.writer.is_some()
    }

    fn write(&self) -> Result<()> {
        StagedFile::write(self)
    }
}

impl<'a, T> From<&'a StagedFile<T>> for Arg<'a> {
    fn from(file: &'a StagedFile<T>) -> Self {
        Arg::File(file)
    }
}

impl<T> fmt::Display for StagedFile<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

impl<T> fmt::Debug for StagedFile<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StagedFile")
            .field("path", &self.path)
            .field("extra_suffixes", &self.extra_suffixes)
            .field("input", &self.is_input())
            .field("output", &self.is_output())
            .finish()
    }
}

/// Assembles a [`StagedFile`]; the path is resolved in [`StagedFileBuilder::build`].
pub struct StagedFileBuilder<T> {
    dir: PathBuf,
    parts: NameParts,
    extra_suffixes: Vec<String>,
    writer: Option<Encoder<T>>,
    reader: Option<Decoder<T>>,
    data: Option<T>,
}

impl<T> StagedFileBuilder<T> {
    pub fn new(root: &StageRoot) -> Self {
        Self {
            dir: root.path().to_path_buf(),
            parts: NameParts::default(),
            extra_suffixes: Vec::new(),
            writer: None,
            reader: None,
            data: None,
        }
    }

    /// Place the file in `dir` instead of the stage root.
    pub fn directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }

    /// Scope token that leads the file name.
    pub fn identity(mut self, identity: impl fmt::Display) -> Self {
        self.parts.identity = Some(identity.to_string());
        self
    }

    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.parts.filename = Some(filename.into());
        self
    }

    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.parts.suffix = Some(suffix.into());
        self
    }

    pub fn extra_suffixes<I, S>(mut self, suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_suffixes = suffixes.into_iter().map(Into::into).collect();
        self
    }

    pub fn writer<E>(mut self, encoder: E, data: T) -> Self
    where
        E: Fn(&Path, &T) -> Result<()> + Send + Sync + 'static,
    {
        self.writer = Some(Box::new(encoder));
        self.data = Some(data);
        self
    }

    pub fn reader<D>(mut self, decoder: D) -> Self
    where
        D: Fn(&Path) -> Result<T> + Send + Sync + 'static,
    {
        self.reader = Some(Box::new(decoder));
        self
    }

    /// Resolve the path and create the handle.
    ///
    /// An existing file at the resolved path is not an error: it is logged
    /// and will be overwritten.
    pub fn build(self) -> StagedFile<T> {
        let path = self.dir.join(compose_name(&self.parts));
        if path.exists() {
            warn!(path = %path.display(), "staged path already exists, continuing");
        }
        StagedFile {
            path,
            extra_suffixes: self.extra_suffixes,
            writer: self.writer,
            reader: self.reader,
            data: self.data,
            released: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::io::codec::{read_json, read_text, write_json, write_text};
    use crate::test_support::{capture_warnings, scratch_root};

    fn write_with_siblings(path: &Path, data: &String) -> Result<()> {
        write_text(path, data)?;
        let mut header = OsString::from(path.as_os_str());
        header.push(".hdr");
        fs::write(PathBuf::from(header), "# header\n")?;
        Ok(())
    }

    #[test]
    fn path_uses_root_and_name_parts() {
        let (_temp, root) = scratch_root().expect("root");
        let file: StagedFile<String> = StagedFile::builder(&root)
            .identity(42)
            .filename("traj")
            .suffix(".cfl")
            .build();

        assert_eq!(file.path(), root.path().join("42_traj.cfl"));
        assert_eq!(file.to_string(), root.path().join("42_traj.cfl").display().to_string());
        assert!(!file.is_input());
        assert!(!file.is_output());
        file.close().expect("close");
    }

    #[test]
    fn directory_overrides_root() {
        let (temp, root) = scratch_root().expect("root");
        let other = temp.path().join("other");
        let file: StagedFile<String> = StagedFile::builder(&root)
            .directory(&other)
            .filename("x")
            .build();
        assert_eq!(file.path(), other.join("x"));
        file.close().expect("close");
    }

    #[test]
    fn unnamed_files_never_share_a_path() {
        let (_temp, root) = scratch_root().expect("root");
        let files: Vec<StagedFile<String>> = (0..50)
            .map(|_| StagedFile::builder(&root).suffix(".cfl").build())
            .collect();
        let paths: HashSet<_> = files.iter().map(|f| f.path().to_path_buf()).collect();
        assert_eq!(paths.len(), files.len());
        for file in files {
            file.close().expect("close");
        }
    }

    #[test]
    fn write_then_read_round_trips() {
        let (_temp, root) = scratch_root().expect("root");
        let value = serde_json::json!({"dims": [64, 64], "name": "ksp"});
        let mut file = StagedFile::input(&root, write_json::<serde_json::Value>, value.clone())
            .suffix(".json")
            .build();
        file.set_reader(read_json::<serde_json::Value>);

        file.write().expect("write");
        assert!(file.is_input());
        assert!(file.is_output());
        assert_eq!(file.read().expect("read"), value);
        file.close().expect("close");
    }

    #[test]
    fn write_without_writer_is_an_error() {
        let (_temp, root) = scratch_root().expect("root");
        let file = StagedFile::output(&root, read_text).build();
        let err = file.write().expect_err("no writer");
        assert!(err.to_string().contains("has no writer"));
        file.close().expect("close");
    }

    #[test]
    fn read_missing_file_surfaces_decoder_error() {
        let (_temp, root) = scratch_root().expect("root");
        let file = StagedFile::output(&root, read_text).build();
        assert!(file.read().is_err());
        file.close().expect("close");
    }

    #[test]
    fn exists_and_clear_cover_extra_suffixes() {
        let (_temp, root) = scratch_root().expect("root");
        let file = StagedFile::input(&root, write_with_siblings, "data".to_string())
            .extra_suffixes([".hdr"])
            .build();
        file.write().expect("write");

        // Only the sibling left behind still counts as existing.
        fs::remove_file(file.path()).expect("remove primary");
        assert!(file.exists());

        file.clear().expect("clear");
        assert!(!file.exists());
        for path in file.all_paths() {
            assert!(!path.exists(), "{} left behind", path.display());
        }
        file.close().expect("close");
    }

    #[test]
    fn clear_is_idempotent() {
        let (temp, root) = scratch_root().expect("root");
        let file = StagedFile::input(&root, write_with_siblings, "data".to_string())
            .extra_suffixes([".hdr", ".missing"])
            .build();
        file.write().expect("write");

        file.clear().expect("first clear");
        file.clear().expect("second clear");
        assert!(!file.exists());
        assert_eq!(fs::read_dir(temp.path()).expect("read dir").count(), 0);
        file.close().expect("close");
    }

    #[test]
    fn set_extra_suffixes_replaces_list() {
        let (_temp, root) = scratch_root().expect("root");
        let mut file: StagedFile<String> = StagedFile::builder(&root)
            .filename("base")
            .extra_suffixes([".a"])
            .build();
        file.set_extra_suffixes([".hdr", ".cfl"]);
        assert_eq!(file.extra_suffixes(), [".hdr".to_string(), ".cfl".to_string()]);
        assert_eq!(
            file.all_paths(),
            vec![
                root.path().join("base"),
                root.path().join("base.hdr"),
                root.path().join("base.cfl"),
            ]
        );
        file.close().expect("close");
    }

    #[test]
    fn existing_path_warns_and_continues() {
        let (_temp, root) = scratch_root().expect("root");
        fs::write(root.path().join("stale"), "old").expect("seed stale file");

        let (file, warnings) = capture_warnings(|| {
            StagedFile::input(&root, write_text::<String>, "new".to_string())
                .filename("stale")
                .build()
        });
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("already exists"));

        file.write().expect("overwrite");
        assert_eq!(fs::read_to_string(file.path()).expect("read"), "new");
        file.close().expect("close");
    }

    #[test]
    fn drop_without_close_warns_and_removes() {
        let (_temp, root) = scratch_root().expect("root");
        let file = StagedFile::input(&root, write_text::<String>, "leak".to_string()).build();
        file.write().expect("write");
        let path = file.path().to_path_buf();

        let ((), warnings) = capture_warnings(move || drop(file));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("not closed"));
        assert!(!path.exists());
    }

    #[test]
    fn close_releases_without_warning() {
        let (_temp, root) = scratch_root().expect("root");
        let file = StagedFile::input(&root, write_text::<String>, "ok".to_string()).build();
        file.write().expect("write");
        let path = file.path().to_path_buf();

        let (result, warnings) = capture_warnings(move || file.close());
        result.expect("close");
        assert!(warnings.is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn drop_of_never_written_file_is_silent() {
        let (_temp, root) = scratch_root().expect("root");
        let file = StagedFile::output(&root, read_text).build();
        let ((), warnings) = capture_warnings(move || drop(file));
        assert!(warnings.is_empty());
    }
}
