//! Configuration loaded from `shiftmark.yml`

use crate::error::{CoreError, CoreResult};
use crate::version::VersionMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory holding the migration scripts
    #[serde(default = "default_migrations_path")]
    pub migrations_path: String,

    /// Database connection
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Schema migrations run in (also the live rotation slot)
    #[serde(default = "default_schema")]
    pub schema: String,

    /// Version numbering mode
    #[serde(default)]
    pub mode: VersionMode,

    /// Transaction grouping
    #[serde(default)]
    pub transaction: TxMode,

    /// Table recording applied versions
    #[serde(default = "default_version_table")]
    pub version_table: String,

    /// Skip the base-file content check
    #[serde(default)]
    pub force: bool,

    /// Stop at the next migration boundary on Ctrl-C
    #[serde(default = "default_true")]
    pub interrupts: bool,

    /// Directory dumps are written to and restored from
    #[serde(default = "default_dump_dir")]
    pub dump_dir: String,
}

/// Database connection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// DuckDB file path, or `:memory:`
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// When the open transaction is committed while a plan runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TxMode {
    /// Commit whenever the major version changes
    #[default]
    PerMajorVersion,
    /// Commit after every migration
    PerFile,
}

impl std::fmt::Display for TxMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TxMode::PerMajorVersion => write!(f, "per_major_version"),
            TxMode::PerFile => write!(f, "per_file"),
        }
    }
}

const CONFIG_FILE: &str = "shiftmark.yml";
const CONFIG_FILE_ALT: &str = "shiftmark.yaml";

fn default_migrations_path() -> String {
    "migrations".to_string()
}

fn default_schema() -> String {
    "main".to_string()
}

fn default_version_table() -> String {
    "schema_migrations".to_string()
}

fn default_db_path() -> String {
    ":memory:".to_string()
}

fn default_dump_dir() -> String {
    "dump".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            migrations_path: default_migrations_path(),
            database: DatabaseConfig::default(),
            schema: default_schema(),
            mode: VersionMode::default(),
            transaction: TxMode::default(),
            version_table: default_version_table(),
            force: false,
            interrupts: true,
            dump_dir: default_dump_dir(),
        }
    }
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a directory (looks for shiftmark.yml / shiftmark.yaml)
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join(CONFIG_FILE);
        let yaml_path = dir.join(CONFIG_FILE_ALT);

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: yml_path.display().to_string(),
            })
        }
    }

    /// Load from `dir` when a config file exists there, defaults otherwise.
    pub fn load_or_default(dir: &Path) -> CoreResult<Self> {
        match Self::load_from_dir(dir) {
            Err(CoreError::ConfigNotFound { .. }) => Ok(Self::default()),
            other => other,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> CoreResult<()> {
        let required = [
            ("migrations_path", &self.migrations_path),
            ("database.path", &self.database.path),
            ("schema", &self.schema),
            ("version_table", &self.version_table),
            ("dump_dir", &self.dump_dir),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(CoreError::ConfigInvalid {
                    message: format!("{field} cannot be empty"),
                });
            }
        }
        Ok(())
    }

    /// Migrations directory resolved against the project root
    pub fn migrations_path_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.migrations_path)
    }

    /// Dump directory resolved against the project root
    pub fn dump_dir_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.dump_dir)
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
