//! Migration file discovery.
//!
//! File names follow `<minor>_<name>.<up|down>.<ext>`; in versioned mode they
//! sit in a major directory: `<major>/<minor>_<name>.<up|down>.<ext>`.
//! Names that do not fit the grammar are skipped with a warning. Two files
//! claiming the same version and direction abort the scan.

use crate::direction::Direction;
use crate::dump::{DirReader, DumpReader};
use crate::error::{CoreError, CoreResult};
use crate::file::{File, Opener};
use crate::migration::{MigrationFile, MigrationFiles};
use crate::version::{Version, VersionMode};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

const FILE_NAME_SUFFIX: &str =
    r"(?P<minor>[0-9]+)_(?P<name>.*)\.(?P<direction>up|down)\.(?P<ext>.*)$";

static LEGACY_RE: OnceLock<Regex> = OnceLock::new();
static VERSIONED_RE: OnceLock<Regex> = OnceLock::new();

fn file_name_regex(mode: VersionMode) -> &'static Regex {
    match mode {
        VersionMode::Legacy => LEGACY_RE.get_or_init(|| {
            Regex::new(&format!("^{FILE_NAME_SUFFIX}")).expect("valid regex literal")
        }),
        VersionMode::Versioned => VERSIONED_RE.get_or_init(|| {
            Regex::new(&format!("^(?P<major>[0-9]+)/{FILE_NAME_SUFFIX}"))
                .expect("valid regex literal")
        }),
    }
}

/// The parts of a migration file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFileName {
    pub version: Version,
    pub name: String,
    pub direction: Direction,
}

/// Parse a (relative) file name according to `mode`.
pub fn parse_file_name(
    mode: VersionMode,
    file_name: &str,
    extension: &str,
) -> CoreResult<ParsedFileName> {
    let parse_err = |reason: &str| CoreError::FileNameParse {
        name: file_name.to_string(),
        reason: reason.to_string(),
    };

    let caps = file_name_regex(mode)
        .captures(file_name)
        .ok_or_else(|| parse_err("does not match <minor>_<name>.<up|down>.<ext>"))?;

    let major = match caps.name("major") {
        Some(m) => m
            .as_str()
            .parse::<u64>()
            .map_err(|_| parse_err("invalid major version"))?,
        None => 0,
    };
    let minor = caps["minor"]
        .parse::<u64>()
        .map_err(|_| parse_err("invalid minor version"))?;

    let direction = match &caps["direction"] {
        "up" => Direction::Up,
        "down" => Direction::Down,
        _ => return Err(parse_err("expected up or down")),
    };

    if &caps["ext"] != extension {
        return Err(parse_err(&format!("expected extension '{extension}'")));
    }

    Ok(ParsedFileName {
        version: mode.version(major, minor),
        name: caps["name"].to_string(),
        direction,
    })
}

/// Pair up discovered streams into migration files.
pub fn discover(
    mode: VersionMode,
    openers: Vec<Opener>,
    extension: &str,
) -> CoreResult<MigrationFiles> {
    let mut pairs: BTreeMap<Version, (Option<File>, Option<File>)> = BTreeMap::new();

    for opener in openers {
        let parsed = match parse_file_name(mode, opener.name(), extension) {
            Ok(parsed) => parsed,
            Err(e) if e.is_parse_error() => {
                log::warn!("Skipping {}: {}", opener.name(), e);
                continue;
            }
            Err(e) => return Err(e),
        };

        let base_name = opener
            .name()
            .rsplit('/')
            .next()
            .unwrap_or(opener.name())
            .to_string();
        let file = File::new(base_name, parsed.version, parsed.name, parsed.direction)
            .with_source(opener);

        let slot = pairs.entry(parsed.version).or_default();
        let target = match parsed.direction {
            Direction::Up => &mut slot.0,
            Direction::Down => &mut slot.1,
        };
        if let Some(existing) = target {
            return Err(CoreError::DuplicateVersion {
                version: parsed.version.display(mode).to_string(),
                direction: parsed.direction,
                first: existing.file_name().to_string(),
                second: file.file_name().to_string(),
            });
        }
        *target = Some(file);
    }

    let mut files = Vec::with_capacity(pairs.len());
    for (version, (up, down)) in pairs {
        let (up, down) = match (up, down) {
            (Some(up), Some(down)) => (up, down),
            (None, _) => {
                return Err(CoreError::IncompleteMigration {
                    version: version.display(mode).to_string(),
                    missing: Direction::Up,
                })
            }
            (_, None) => {
                return Err(CoreError::IncompleteMigration {
                    version: version.display(mode).to_string(),
                    missing: Direction::Down,
                })
            }
        };
        files.push(MigrationFile::new(version, up, down));
    }

    log::debug!("Discovered {} migration versions", files.len());
    MigrationFiles::new(mode, files)
}

/// Discover migration files below `path`. A missing directory has none.
pub fn read_migration_files(
    path: &Path,
    mode: VersionMode,
    extension: &str,
) -> CoreResult<MigrationFiles> {
    if !path.exists() {
        return Ok(MigrationFiles::empty(mode));
    }
    let openers = DirReader::new(path).files("")?;
    discover(mode, openers, extension)
}

#[cfg(test)]
#[path = "discovery_test.rs"]
mod tests;
