//! Byte-stream contracts used for discovery and for dump/restore, with
//! directory-backed implementations.

use crate::error::{CoreError, CoreResult};
use crate::file::Opener;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Directory (inside a dump) holding the applied migration scripts.
pub const SCHEMA_DIR: &str = "schema";

/// Directory (inside a dump) holding one entry per data table.
pub const TABLES_DIR: &str = "tables";

/// Destination of a dump: hands out one writer per named entry.
pub trait DumpWriter: Send {
    /// Open a writer for `name` inside `dir`. Dropping it finishes the entry.
    fn writer(&mut self, dir: &str, name: &str) -> CoreResult<Box<dyn Write + Send + '_>>;

    /// Finish the dump.
    fn close(&mut self) -> CoreResult<()> {
        Ok(())
    }
}

/// Source of named, independently openable streams.
pub trait DumpReader: Send + Sync {
    /// Every stream below `dir`, named relative to it. A missing `dir`
    /// has no streams.
    fn files(&self, dir: &str) -> CoreResult<Vec<Opener>>;
}

/// Writes dump entries as plain files below a base directory.
#[derive(Debug, Clone)]
pub struct DirWriter {
    base_dir: PathBuf,
}

impl DirWriter {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}

impl DumpWriter for DirWriter {
    fn writer(&mut self, dir: &str, name: &str) -> CoreResult<Box<dyn Write + Send + '_>> {
        let dir = self.base_dir.join(dir);
        std::fs::create_dir_all(&dir).map_err(|e| CoreError::IoWithPath {
            path: dir.display().to_string(),
            source: e,
        })?;
        let path = dir.join(name);
        let file = std::fs::File::create(&path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(Box::new(std::io::BufWriter::new(file)))
    }
}

/// Lists files below a base directory, recursively.
#[derive(Debug, Clone)]
pub struct DirReader {
    base_dir: PathBuf,
}

impl DirReader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}

impl DumpReader for DirReader {
    fn files(&self, dir: &str) -> CoreResult<Vec<Opener>> {
        let root = self.base_dir.join(dir);
        let mut openers = Vec::new();
        if !root.exists() {
            return Ok(openers);
        }
        walk(&root, &root, &mut openers)?;
        openers.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(openers)
    }
}

fn walk(root: &Path, dir: &Path, openers: &mut Vec<Opener>) -> CoreResult<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| CoreError::IoWithPath {
        path: dir.display().to_string(),
        source: e,
    })?;
    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            walk(root, &path, openers)?;
            continue;
        }
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        openers.push(Opener::from_path(name, path.clone()));
    }
    Ok(())
}

/// True when `dir` is missing or has no entries.
pub fn is_empty_dir(dir: &Path) -> CoreResult<bool> {
    match std::fs::read_dir(dir) {
        Ok(mut entries) => Ok(entries.next().is_none()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
        Err(e) => Err(CoreError::IoWithPath {
            path: dir.display().to_string(),
            source: e,
        }),
    }
}

#[cfg(test)]
#[path = "dump_test.rs"]
mod tests;
