//! Error types for sm-engine

use sm_core::CoreError;
use sm_db::DbError;
use thiserror::Error;

/// Migration engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Model, discovery or resolution error (X001)
    #[error("[X001] {0}")]
    Core(#[from] CoreError),

    /// Driver error (X002)
    #[error("[X002] {0}")]
    Db(#[from] DbError),

    /// Recorded files disagree with the recorded version (X003)
    #[error("[X003] Last recorded file version {recorded} does not match database version {database}")]
    InconsistentState { recorded: String, database: String },

    /// The database is ahead of every known script (X004)
    #[error("[X004] Database version {database} is ahead of the last migration file {files}")]
    DatabaseAhead { database: String, files: String },

    /// Interrupted before the operation finished (X005)
    #[error("[X005] Migration cancelled")]
    Cancelled,

    /// Dump/restore requested from a driver without the capability (X006)
    #[error("[X006] Driver {backend} does not support dump and restore")]
    DumpNotSupported { backend: String },

    /// Dump is missing required content (X007)
    #[error("[X007] Dump is missing {0}")]
    MissingDumpContent(String),

    /// Schema rotation failed and was rolled back (X008)
    #[error("[X008] Failed to rotate schemas at step '{step}': {source}")]
    RotationFailed { step: String, source: DbError },

    /// Goto target is not a known version (X009)
    #[error("[X009] Unknown migration version: {version}")]
    UnknownVersion { version: String },

    /// Revert requested without a backup slot (X010)
    #[error("[X010] No backup schema {schema} to revert to")]
    NoBackup { schema: String },

    /// Background task ended abnormally (X011)
    #[error("[X011] Migration task failed: {0}")]
    TaskFailed(String),
}

/// Result type alias for EngineError
pub type EngineResult<T> = Result<T, EngineError>;
