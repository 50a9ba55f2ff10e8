//! Error types for sm-core

use crate::direction::Direction;
use thiserror::Error;

/// Core error type for Shiftmark
#[derive(Error, Debug)]
pub enum CoreError {
    /// V001: Version string could not be parsed
    #[error("[V001] Invalid version '{input}': {reason}")]
    VersionParse { input: String, reason: String },

    /// F001: File name does not follow the migration file grammar
    #[error("[F001] Unable to parse migration file name '{name}': {reason}")]
    FileNameParse { name: String, reason: String },

    /// F002: Two files claim the same version and direction
    #[error("[F002] Duplicate {direction} migration file for version {version}: {first} and {second}")]
    DuplicateVersion {
        version: String,
        direction: Direction,
        first: String,
        second: String,
    },

    /// F003: A version has only one of its two scripts
    #[error("[F003] Migration version {version} has no {missing} file")]
    IncompleteMigration { version: String, missing: Direction },

    /// F004: Migration versions are not contiguous
    #[error("[F004] Missing migration version: {version}")]
    MissingVersion { version: String },

    /// F005: Fewer migration files than were previously applied
    #[error("[F005] Found {found} migration files but {expected} were previously applied")]
    FewerFilesThanApplied { expected: usize, found: usize },

    /// F006: Positional version disagreement between recorded and current files
    #[error("[F006] Expected version {expected}, but got {found}")]
    VersionMismatch { expected: String, found: String },

    /// F007: Base up-file content drifted without a version bump
    #[error("[F007] Base up file contents differ for version {version}. Use --force to bypass this check only if the text differs but the schema change is the same (e.g. comments)")]
    ContentMismatch { version: String },

    /// F008: No migration files available to reconcile against
    #[error("[F008] No migration files found")]
    NoMigrationFiles,

    /// F009: File content requested but the file has no content source
    #[error("[F009] Migration file '{name}' has no content source")]
    NoContentSource { name: String },

    /// C001: Configuration file not found
    #[error("[C001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// C002: Invalid configuration value
    #[error("[C002] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// C003: Config YAML parse error
    #[error("[C003] Failed to parse config: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// E001: IO error
    #[error("[E001] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// E002: IO error with file path context
    #[error("[E002] Failed to access '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },
}

impl CoreError {
    /// True for errors that make a file unusable but need not abort a scan.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            CoreError::VersionParse { .. } | CoreError::FileNameParse { .. }
        )
    }
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
