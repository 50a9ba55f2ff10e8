//! Driver trait definitions

use crate::error::DbResult;
use async_trait::async_trait;
use sm_core::{Migration, MigrationFiles, Version, VersionMode};
use std::io::Write;

/// A backing store migrations are applied to.
///
/// A driver wraps a single logical connection. Transactions are controlled
/// by the caller through [`begin`](Driver::begin) / [`commit`](Driver::commit)
/// / [`rollback`](Driver::rollback); [`migrate`](Driver::migrate) never
/// decides to roll back on its own.
///
/// Implementations must be Send + Sync for async operation.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;

    /// Extension of migration scripts, without the leading dot
    fn filename_extension(&self) -> &'static str;

    /// Name of the table recording applied versions
    fn version_table(&self) -> &str;

    /// Start a transaction
    async fn begin(&self) -> DbResult<()>;

    /// Commit the open transaction
    async fn commit(&self) -> DbResult<()>;

    /// Roll back the open transaction
    async fn rollback(&self) -> DbResult<()>;

    /// Execute one or more statements
    async fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Create `schema` and the version table in it if missing, and make
    /// `schema` the one scripts and version queries run against.
    async fn ensure_version_table(&self, schema: &str) -> DbResult<()>;

    /// Highest recorded version, or [`Version::ZERO`] when none
    async fn version(&self) -> DbResult<Version>;

    /// Recorded migrations, with the scripts stored when they were applied
    async fn get_migration_files(&self, mode: VersionMode) -> DbResult<MigrationFiles>;

    /// Record (up) or remove (down) the migration's version and execute its
    /// script.
    async fn migrate(&self, migration: &Migration) -> DbResult<()>;

    /// Overwrite the stored scripts of an already recorded version
    async fn update_files(&self, migration: &Migration) -> DbResult<()>;

    /// The dump/restore capability, when this driver offers it
    fn as_dump(&self) -> Option<&dyn DumpDriver> {
        None
    }
}

/// Optional capability: moving table data and whole schemas around.
#[async_trait]
pub trait DumpDriver: Send + Sync {
    /// Data tables in `schema`, excluding the version table
    async fn list_tables(&self, schema: &str) -> DbResult<Vec<String>>;

    /// Stream the contents of `schema.table` to `out`
    async fn dump_table(
        &self,
        schema: &str,
        table: &str,
        out: &mut (dyn Write + Send),
    ) -> DbResult<()>;

    /// Load previously dumped contents into `schema.table`
    async fn restore_table(&self, schema: &str, table: &str, data: &[u8]) -> DbResult<()>;

    /// Delete all rows from every data table in `schema`
    async fn truncate_tables(&self, schema: &str) -> DbResult<()>;

    /// Whether `schema` exists
    async fn schema_exists(&self, schema: &str) -> DbResult<bool>;

    /// Create `schema` if it does not exist
    async fn ensure_schema(&self, schema: &str) -> DbResult<()>;

    /// Drop `schema` and everything in it, if it exists
    async fn drop_schema(&self, schema: &str) -> DbResult<()>;

    /// Rename `from` to `to`. `to` must not exist.
    async fn rename_schema(&self, from: &str, to: &str) -> DbResult<()>;
}
