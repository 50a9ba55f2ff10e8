//! Error types for sm-db

use sm_core::CoreError;
use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Statement execution error (D002)
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionError(String),

    /// A migration script failed (D003)
    #[error("[D003] Migration {file} failed: {message}{}", script_location(.line, .column, .snippet))]
    ScriptError {
        file: String,
        message: String,
        line: Option<usize>,
        column: Option<usize>,
        snippet: String,
    },

    /// Recorded versions would not form a chain (D004)
    #[error("[D004] Unexpected previous version {previous} for version {version}")]
    VersionChain { previous: String, version: String },

    /// Mutex poisoned (D006)
    #[error("[D006] Database mutex poisoned: {0}")]
    MutexPoisoned(String),

    /// Transaction control failed (D007)
    #[error("[D007] Transaction error: {0}")]
    TransactionError(String),

    /// IO error while moving table data (D008)
    #[error("[D008] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Model error surfaced by the driver (D009)
    #[error("[D009] {0}")]
    Core(#[from] CoreError),
}

fn script_location(line: &Option<usize>, column: &Option<usize>, snippet: &str) -> String {
    match (line, column) {
        (Some(line), Some(column)) if !snippet.is_empty() => {
            format!(" in line {line}, column {column}:\n\n{snippet}")
        }
        (Some(line), Some(column)) => format!(" in line {line}, column {column}"),
        _ => String::new(),
    }
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        DbError::ExecutionError(err.to_string())
    }
}
