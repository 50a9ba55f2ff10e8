//! Up/down script pairs, directed migrations and sorted collections of them.

use crate::direction::Direction;
use crate::dump::DumpWriter;
use crate::error::{CoreError, CoreResult};
use crate::file::File;
use crate::version::{Version, VersionMode};
use std::io::Write;
use std::path::Path;

/// A version together with its up and down scripts.
#[derive(Debug, Clone)]
pub struct MigrationFile {
    version: Version,
    up: File,
    down: File,
}

impl MigrationFile {
    pub fn new(version: Version, up: File, down: File) -> Self {
        Self { version, up, down }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn up(&self) -> &File {
        &self.up
    }

    pub fn down(&self) -> &File {
        &self.down
    }

    pub fn file(&self, direction: Direction) -> &File {
        match direction {
            Direction::Up => &self.up,
            Direction::Down => &self.down,
        }
    }

    /// Bind this pair to a direction.
    pub fn migration(&self, direction: Direction) -> Migration {
        Migration {
            file: self.clone(),
            direction,
        }
    }

    /// Write both scripts below `base_dir`, in the major sub-directory when
    /// `mode` is versioned.
    pub fn write_files(&mut self, base_dir: &Path, mode: VersionMode) -> CoreResult<()> {
        for file in [&mut self.up, &mut self.down] {
            let dir = base_dir.join(file.relative_dir(mode));
            std::fs::create_dir_all(&dir).map_err(|e| CoreError::IoWithPath {
                path: dir.display().to_string(),
                source: e,
            })?;
            let path = dir.join(file.file_name());
            let content = file.read_content()?;
            std::fs::write(&path, content).map_err(|e| CoreError::IoWithPath {
                path: path.display().to_string(),
                source: e,
            })?;
        }
        Ok(())
    }

    /// Write both scripts through a dump writer under `dir`, optionally
    /// releasing the bytes once written.
    pub fn write_contents(
        &mut self,
        writer: &mut dyn DumpWriter,
        dir: &str,
        mode: VersionMode,
        release: bool,
    ) -> CoreResult<()> {
        for file in [&mut self.up, &mut self.down] {
            let sub_dir = file.relative_dir(mode);
            let target = if sub_dir.is_empty() {
                dir.to_string()
            } else {
                format!("{}/{}", dir.trim_end_matches('/'), sub_dir)
            };
            let name = file.file_name().to_string();
            let content = file.read_content()?;
            let mut sink = writer.writer(&target, &name)?;
            sink.write_all(content).map_err(|e| CoreError::IoWithPath {
                path: format!("{}/{}", target, name),
                source: e,
            })?;
            sink.flush()?;
            drop(sink);
            if release {
                file.release_content();
            }
        }
        Ok(())
    }
}

/// A migration file bound to one direction: the unit that gets applied.
#[derive(Debug, Clone)]
pub struct Migration {
    file: MigrationFile,
    direction: Direction,
}

impl Migration {
    pub fn version(&self) -> Version {
        self.file.version
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_up(&self) -> bool {
        self.direction == Direction::Up
    }

    /// The script to execute for this direction.
    pub fn file(&self) -> &File {
        self.file.file(self.direction)
    }

    pub fn migration_file(&self) -> &MigrationFile {
        &self.file
    }

    pub fn migration_file_mut(&mut self) -> &mut MigrationFile {
        &mut self.file
    }
}

/// An ordered execution plan.
pub type Plan = Vec<Migration>;

/// Migration files sorted ascending by version, each version unique.
#[derive(Debug, Clone, Default)]
pub struct MigrationFiles {
    mode: VersionMode,
    files: Vec<MigrationFile>,
}

impl MigrationFiles {
    /// Sort `files` and reject duplicate versions.
    pub fn new(mode: VersionMode, mut files: Vec<MigrationFile>) -> CoreResult<Self> {
        files.sort_by_key(|f| f.version());
        if let Some(pair) = files.windows(2).find(|w| w[0].version() == w[1].version()) {
            return Err(CoreError::DuplicateVersion {
                version: pair[0].version().display(mode).to_string(),
                direction: Direction::Up,
                first: pair[0].up().file_name().to_string(),
                second: pair[1].up().file_name().to_string(),
            });
        }
        Ok(Self { mode, files })
    }

    pub fn empty(mode: VersionMode) -> Self {
        Self {
            mode,
            files: Vec::new(),
        }
    }

    pub fn mode(&self) -> VersionMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MigrationFile> {
        self.files.iter()
    }

    pub fn first(&self) -> Option<&MigrationFile> {
        self.files.first()
    }

    /// Highest version, or [`Version::ZERO`] when empty.
    pub fn last_version(&self) -> Version {
        self.files
            .last()
            .map(MigrationFile::version)
            .unwrap_or(Version::ZERO)
    }

    pub fn versions(&self) -> Vec<Version> {
        self.files.iter().map(MigrationFile::version).collect()
    }

    /// The first `n` files (all of them when `n` exceeds the length).
    pub fn prefix(&self, n: usize) -> MigrationFiles {
        Self {
            mode: self.mode,
            files: self.files.iter().take(n).cloned().collect(),
        }
    }

    pub fn into_vec(self) -> Vec<MigrationFile> {
        self.files
    }
}

impl<'a> IntoIterator for &'a MigrationFiles {
    type Item = &'a MigrationFile;
    type IntoIter = std::slice::Iter<'a, MigrationFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

#[cfg(test)]
#[path = "migration_test.rs"]
mod tests;
