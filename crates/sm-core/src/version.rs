//! Two-part migration versions and the numbering mode they are read in.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How versions are numbered and spelled.
///
/// `Legacy` numbers migrations with a single integer (the major part is
/// always 0). `Versioned` spells a version `<major>/<minor>`, where a new
/// major restarts the minor count at 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionMode {
    #[default]
    Legacy,
    Versioned,
}

impl VersionMode {
    /// Build a version in this mode. Legacy mode discards `major`.
    pub fn version(self, major: u64, minor: u64) -> Version {
        match self {
            VersionMode::Legacy => Version::new(0, minor),
            VersionMode::Versioned => Version::new(major, minor),
        }
    }

    /// Parse a version string.
    ///
    /// Legacy mode expects a single unsigned integer; versioned mode expects
    /// `<major>/<minor>`.
    pub fn parse(self, s: &str) -> CoreResult<Version> {
        let parse_part = |part: &str, what: &str| {
            part.parse::<u64>().map_err(|_| CoreError::VersionParse {
                input: s.to_string(),
                reason: format!("invalid {what} version"),
            })
        };

        match self {
            VersionMode::Legacy => Ok(Version::new(0, parse_part(s, "minor")?)),
            VersionMode::Versioned => {
                let parts: Vec<&str> = s.split('/').collect();
                let [major, minor] = parts.as_slice() else {
                    return Err(CoreError::VersionParse {
                        input: s.to_string(),
                        reason: "expected <major>/<minor>".to_string(),
                    });
                };
                Ok(Version::new(
                    parse_part(*major, "major")?,
                    parse_part(*minor, "minor")?,
                ))
            }
        }
    }

    pub fn is_versioned(self) -> bool {
        self == VersionMode::Versioned
    }
}

impl fmt::Display for VersionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionMode::Legacy => write!(f, "legacy"),
            VersionMode::Versioned => write!(f, "versioned"),
        }
    }
}

/// A migration version: ordered by major, then minor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    major: u64,
    minor: u64,
}

impl Version {
    /// The version of a database with nothing applied.
    pub const ZERO: Version = Version { major: 0, minor: 0 };

    pub const fn new(major: u64, minor: u64) -> Self {
        Self { major, minor }
    }

    pub fn major(&self) -> u64 {
        self.major
    }

    pub fn minor(&self) -> u64 {
        self.minor
    }

    /// The next version. Bumping the major restarts the minor at 1.
    pub fn inc(&self, bump_major: bool) -> Version {
        if bump_major {
            Version::new(self.major + 1, 1)
        } else {
            Version::new(self.major, self.minor + 1)
        }
    }

    /// Major part zero-padded to a multiple of three digits.
    pub fn major_string(&self) -> String {
        pad_left(self.major, 3)
    }

    /// Minor part zero-padded to a multiple of four digits.
    pub fn minor_string(&self) -> String {
        pad_left(self.minor, 4)
    }

    /// Render the version the way `mode` spells it.
    pub fn display(&self, mode: VersionMode) -> VersionDisplay {
        VersionDisplay {
            version: *self,
            mode,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.major, self.minor)
    }
}

/// Mode-aware rendering of a [`Version`], see [`Version::display`].
#[derive(Debug, Clone, Copy)]
pub struct VersionDisplay {
    version: Version,
    mode: VersionMode,
}

impl fmt::Display for VersionDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            VersionMode::Legacy => f.write_str(&self.version.minor_string()),
            VersionMode::Versioned => write!(
                f,
                "{}/{}",
                self.version.major_string(),
                self.version.minor_string()
            ),
        }
    }
}

fn pad_left(n: u64, width: usize) -> String {
    let s = n.to_string();
    let rem = s.len() % width;
    if rem == 0 {
        s
    } else {
        format!("{}{}", "0".repeat(width - rem), s)
    }
}

#[cfg(test)]
#[path = "version_test.rs"]
mod tests;
