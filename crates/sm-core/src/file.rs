//! A single change script and the byte sources it is read from.

use crate::direction::Direction;
use crate::error::{CoreError, CoreResult};
use crate::version::{Version, VersionMode};
use std::borrow::Cow;
use std::fmt;
use std::io::{Cursor, Read};
use std::path::PathBuf;
use std::sync::Arc;

type OpenFn = dyn Fn() -> std::io::Result<Box<dyn Read + Send>> + Send + Sync;

/// A named, independently openable byte stream.
///
/// Discovery hands these out without reading anything; the bytes are only
/// pulled when a [`File`]'s content is first needed.
#[derive(Clone)]
pub struct Opener {
    name: String,
    open: Arc<OpenFn>,
}

impl Opener {
    pub fn new<F>(name: impl Into<String>, open: F) -> Self
    where
        F: Fn() -> std::io::Result<Box<dyn Read + Send>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            open: Arc::new(open),
        }
    }

    /// An opener reading a file on disk.
    pub fn from_path(name: impl Into<String>, path: PathBuf) -> Self {
        Self::new(name, move || {
            let f = std::fs::File::open(&path)?;
            Ok(Box::new(f) as Box<dyn Read + Send>)
        })
    }

    /// An opener over bytes already held in memory.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let bytes: Arc<[u8]> = Arc::from(bytes.into());
        Self::new(name, move || {
            Ok(Box::new(Cursor::new(bytes.to_vec())) as Box<dyn Read + Send>)
        })
    }

    /// Relative name of the stream (e.g. `001/0002_add_users.up.sql`).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn open(&self) -> std::io::Result<Box<dyn Read + Send>> {
        (self.open)()
    }

    /// Read the whole stream.
    pub fn read_all(&self) -> CoreResult<Vec<u8>> {
        let mut reader = self.open().map_err(|e| CoreError::IoWithPath {
            path: self.name.clone(),
            source: e,
        })?;
        let mut buf = Vec::new();
        reader
            .read_to_end(&mut buf)
            .map_err(|e| CoreError::IoWithPath {
                path: self.name.clone(),
                source: e,
            })?;
        Ok(buf)
    }
}

impl fmt::Debug for Opener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Opener")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// One change script: `0002_add_users.up.sql`.
#[derive(Debug, Clone)]
pub struct File {
    file_name: String,
    version: Version,
    name: String,
    direction: Direction,
    content: Option<Vec<u8>>,
    source: Option<Opener>,
}

impl File {
    pub fn new(
        file_name: impl Into<String>,
        version: Version,
        name: impl Into<String>,
        direction: Direction,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            version,
            name: name.into(),
            direction,
            content: None,
            source: None,
        }
    }

    /// Attach already-loaded content.
    pub fn with_content(mut self, content: impl Into<Vec<u8>>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Attach a lazy content source.
    pub fn with_source(mut self, source: Opener) -> Self {
        self.source = Some(source);
        self
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Content if it has been loaded.
    pub fn content(&self) -> Option<&[u8]> {
        self.content.as_deref()
    }

    pub fn is_loaded(&self) -> bool {
        self.content.is_some()
    }

    /// Load and cache the content. A no-op when already loaded.
    pub fn read_content(&mut self) -> CoreResult<&[u8]> {
        if self.content.is_none() {
            let bytes = self.read_source()?;
            self.content = Some(bytes);
        }
        Ok(self.content.as_deref().unwrap_or_default())
    }

    /// Content without caching it: borrowed when loaded, read fresh otherwise.
    pub fn load(&self) -> CoreResult<Cow<'_, [u8]>> {
        match &self.content {
            Some(bytes) => Ok(Cow::Borrowed(bytes)),
            None => self.read_source().map(Cow::Owned),
        }
    }

    /// Content as text (lossy for invalid UTF-8).
    pub fn load_text(&self) -> CoreResult<String> {
        Ok(String::from_utf8_lossy(&self.load()?).into_owned())
    }

    /// Drop cached bytes to bound memory. They are re-read on next use.
    pub fn release_content(&mut self) {
        self.content = None;
    }

    /// Sub-directory the file lives in: the major part in versioned mode.
    pub fn relative_dir(&self, mode: VersionMode) -> String {
        match mode {
            VersionMode::Legacy => String::new(),
            VersionMode::Versioned => self.version.major_string(),
        }
    }

    fn read_source(&self) -> CoreResult<Vec<u8>> {
        match &self.source {
            Some(source) => source.read_all(),
            None => Err(CoreError::NoContentSource {
                name: self.file_name.clone(),
            }),
        }
    }
}

#[cfg(test)]
#[path = "file_test.rs"]
mod tests;
