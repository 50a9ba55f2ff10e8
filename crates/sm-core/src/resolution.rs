//! Plan resolution: which migrations to run, and in which direction, to move
//! between two states.
//!
//! Every function here reads a sorted [`MigrationFiles`] and returns a fresh
//! [`Plan`]. An empty plan is valid and means there is nothing to do.

use crate::direction::Direction;
use crate::error::{CoreError, CoreResult};
use crate::migration::{MigrationFiles, Plan};
use crate::version::Version;

/// Result of reconciling recorded files against the current ones.
#[derive(Debug, Clone)]
pub struct BetweenPlan {
    /// Version the database is at (last recorded file).
    pub current: Version,
    /// Version the current files end at.
    pub destination: Version,
    pub plan: Plan,
}

impl MigrationFiles {
    /// Up migrations above `version`, ascending.
    pub fn to_last_from(&self, version: Version) -> Plan {
        self.iter()
            .filter(|f| f.version() > version)
            .map(|f| f.migration(Direction::Up))
            .collect()
    }

    /// Down migrations at or below `version`, descending.
    pub fn to_first_from(&self, version: Version) -> Plan {
        self.iter()
            .rev()
            .filter(|f| f.version() <= version)
            .map(|f| f.migration(Direction::Down))
            .collect()
    }

    /// Down migrations above `destination`, descending. `destination` itself
    /// stays applied.
    pub fn down_to(&self, destination: Version) -> Plan {
        self.iter()
            .rev()
            .take_while(|f| f.version() > destination)
            .map(|f| f.migration(Direction::Down))
            .collect()
    }

    /// Migrations moving from `start` to `stop`.
    ///
    /// Covers versions in `(min, max]`; going down, the plan runs from the
    /// highest version to the lowest.
    pub fn from_to(&self, start: Version, stop: Version) -> Plan {
        if start == stop {
            return Plan::new();
        }
        let (direction, low, high) = if start < stop {
            (Direction::Up, start, stop)
        } else {
            (Direction::Down, stop, start)
        };

        let mut plan: Plan = self
            .iter()
            .filter(|f| f.version() > low && f.version() <= high)
            .map(|f| f.migration(direction))
            .collect();
        if direction == Direction::Down {
            plan.reverse();
        }
        plan
    }

    /// Walk `relative_n` steps from `version`: forward applies the next
    /// N up migrations, backward the previous N down migrations (starting
    /// with `version` itself). Zero steps is an empty plan.
    pub fn from(&self, version: Version, relative_n: i64) -> Plan {
        let steps = relative_n.unsigned_abs() as usize;
        match relative_n.signum() {
            1 => self
                .iter()
                .filter(|f| f.version() > version)
                .take(steps)
                .map(|f| f.migration(Direction::Up))
                .collect(),
            -1 => self
                .iter()
                .rev()
                .filter(|f| f.version() <= version)
                .take(steps)
                .map(|f| f.migration(Direction::Down))
                .collect(),
            _ => Plan::new(),
        }
    }

    /// Reconcile previously recorded files (`prev`) with these current files.
    ///
    /// Moving forward, the recorded base must match the current files unless
    /// `force` is set, and the plan applies everything above the recorded
    /// version. When the current files end below the recorded version, the
    /// plan undoes the extra versions using the recorded scripts, since the
    /// current set no longer has them.
    pub fn between(&self, prev: &MigrationFiles, force: bool) -> CoreResult<BetweenPlan> {
        if self.is_empty() {
            return Err(CoreError::NoMigrationFiles);
        }

        let current = prev.last_version();
        let destination = self.last_version();

        let plan = if current <= destination {
            if !force {
                self.validate_base_files(prev)?;
            }
            self.to_last_from(current)
        } else {
            prev.down_to(destination)
        };

        Ok(BetweenPlan {
            current,
            destination,
            plan,
        })
    }

    /// Check that `prev` is an unchanged prefix of these files: at least as
    /// many files, contiguous versions, same version at each position and
    /// byte-identical up scripts.
    pub fn validate_base_files(&self, prev: &MigrationFiles) -> CoreResult<()> {
        if self.len() < prev.len() {
            return Err(CoreError::FewerFilesThanApplied {
                expected: prev.len(),
                found: self.len(),
            });
        }
        if let Some(missing) = self.missing_version() {
            return Err(CoreError::MissingVersion {
                version: missing.display(self.mode()).to_string(),
            });
        }

        for (prev_file, file) in prev.iter().zip(self.iter()) {
            if prev_file.version() != file.version() {
                return Err(CoreError::VersionMismatch {
                    expected: prev_file.version().display(self.mode()).to_string(),
                    found: file.version().display(self.mode()).to_string(),
                });
            }
            let prev_up = prev_file.up().load()?;
            let up = file.up().load()?;
            if prev_up != up {
                return Err(CoreError::ContentMismatch {
                    version: file.version().display(self.mode()).to_string(),
                });
            }
        }
        Ok(())
    }

    /// First version missing from an otherwise contiguous sequence.
    ///
    /// Versions must start at 0/1 and count up by one minor. In versioned
    /// mode a file may also open the next major block at minor 1.
    pub fn missing_version(&self) -> Option<Version> {
        let mut expected = Version::new(0, 1);
        for (i, file) in self.iter().enumerate() {
            let version = file.version();
            if version != expected {
                if self.mode().is_versioned() && i != 0 && version.major() != expected.major() {
                    expected = expected.inc(true);
                }
                if version != expected {
                    return Some(expected);
                }
            }
            expected = expected.inc(false);
        }
        None
    }
}

#[cfg(test)]
#[path = "resolution_test.rs"]
mod tests;
