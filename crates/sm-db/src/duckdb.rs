//! DuckDB driver implementation

use crate::error::{DbError, DbResult};
use crate::traits::{DumpDriver, Driver};
use async_trait::async_trait;
use duckdb::{params, Connection};
use regex::Regex;
use sm_core::script::{line_column_from_offset, lines_before_and_after};
use sm_core::{Direction, File, Migration, MigrationFile, MigrationFiles, Version, VersionMode};
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, OnceLock};

/// Table recording applied versions when none is configured
pub const DEFAULT_VERSION_TABLE: &str = "schema_migrations";

/// DuckDB's built-in schema; it can be emptied but never dropped.
const INTERNAL_SCHEMA: &str = "main";

/// Lines of script shown around a failing position
const CONTEXT_LINES: usize = 5;

/// DuckDB migration driver
pub struct DuckDbDriver {
    conn: Mutex<Connection>,
    table_name: String,
    schema: Mutex<String>,
}

impl DuckDbDriver {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory(table_name: &str) -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self::with_connection(conn, table_name))
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path, table_name: &str) -> DbResult<Self> {
        let conn = Connection::open(path).map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self::with_connection(conn, table_name))
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str, table_name: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory(table_name)
        } else {
            Self::from_path(Path::new(path), table_name)
        }
    }

    fn with_connection(conn: Connection, table_name: &str) -> Self {
        let table_name = if table_name.is_empty() {
            DEFAULT_VERSION_TABLE
        } else {
            table_name
        };
        Self {
            conn: Mutex::new(conn),
            table_name: table_name.to_string(),
            schema: Mutex::new(INTERNAL_SCHEMA.to_string()),
        }
    }

    /// Schema scripts currently run against
    pub fn current_schema(&self) -> DbResult<String> {
        self.schema
            .lock()
            .map(|s| s.clone())
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    /// Count rows of a query (for tests and status output)
    pub fn query_count(&self, sql: &str) -> DbResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM ({sql})"), [], |row| {
            row.get(0)
        })?;
        Ok(count.max(0) as usize)
    }

    /// Check whether `schema.table` exists
    pub fn relation_exists(&self, schema: &str, table: &str) -> DbResult<bool> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = ? AND table_name = ?",
            params![schema, table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    fn qualified_version_table(&self) -> DbResult<String> {
        Ok(format!(
            "{}.{}",
            quote_ident(&self.current_schema()?),
            quote_ident(&self.table_name)
        ))
    }

    fn set_schema(&self, conn: &Connection, schema: &str) -> DbResult<()> {
        conn.execute_batch(&format!("SET schema = {}", quote_literal(schema)))?;
        let mut current = self
            .schema
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))?;
        *current = schema.to_string();
        Ok(())
    }

    fn version_sync(&self, conn: &Connection) -> DbResult<Option<Version>> {
        let sql = format!(
            "SELECT major, minor FROM {} ORDER BY major DESC, minor DESC LIMIT 1",
            self.qualified_version_table()?
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        match rows.next()? {
            Some(row) => {
                let major: i64 = row.get(0)?;
                let minor: i64 = row.get(1)?;
                Ok(Some(Version::new(major.max(0) as u64, minor.max(0) as u64)))
            }
            None => Ok(None),
        }
    }

    fn tables_sync(
        &self,
        conn: &Connection,
        schema: &str,
        with_version_table: bool,
    ) -> DbResult<Vec<String>> {
        let mut stmt = conn.prepare(
            "SELECT table_name FROM information_schema.tables \
             WHERE table_schema = ? AND table_type = 'BASE TABLE' ORDER BY table_name",
        )?;
        let names = stmt
            .query_map(params![schema], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names
            .into_iter()
            .filter(|t| with_version_table || *t != self.table_name)
            .collect())
    }

    fn views_sync(&self, conn: &Connection, schema: &str) -> DbResult<Vec<String>> {
        let mut stmt = conn.prepare(
            "SELECT table_name FROM information_schema.tables \
             WHERE table_schema = ? AND table_type = 'VIEW' ORDER BY table_name",
        )?;
        let names = stmt
            .query_map(params![schema], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    fn schema_exists_sync(&self, conn: &Connection, schema: &str) -> DbResult<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM information_schema.schemata WHERE schema_name = ?",
            params![schema],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn drop_schema_sync(&self, conn: &Connection, schema: &str) -> DbResult<()> {
        if schema == INTERNAL_SCHEMA {
            for view in self.views_sync(conn, schema)? {
                conn.execute_batch(&format!(
                    "DROP VIEW IF EXISTS {}.{}",
                    quote_ident(schema),
                    quote_ident(&view)
                ))?;
            }
            for table in self.tables_sync(conn, schema, true)? {
                conn.execute_batch(&format!(
                    "DROP TABLE IF EXISTS {}.{}",
                    quote_ident(schema),
                    quote_ident(&table)
                ))?;
            }
            return Ok(());
        }
        if self.current_schema()? == schema {
            self.set_schema(conn, INTERNAL_SCHEMA)?;
        }
        conn.execute_batch(&format!(
            "DROP SCHEMA IF EXISTS {} CASCADE",
            quote_ident(schema)
        ))?;
        Ok(())
    }

    fn record_sync(&self, conn: &Connection, migration: &Migration) -> DbResult<()> {
        let table = self.qualified_version_table()?;
        let version = migration.version();
        match migration.direction() {
            Direction::Up => {
                let previous = match self.version_sync(conn)? {
                    Some(previous) => {
                        if previous.inc(previous.major() != version.major()) != version {
                            return Err(DbError::VersionChain {
                                previous: previous.to_string(),
                                version: version.to_string(),
                            });
                        }
                        previous
                    }
                    // the first recorded version references itself
                    None => version,
                };
                let pair = migration.migration_file();
                let up = pair.up().load_text()?;
                let down = pair.down().load_text()?;
                conn.execute(
                    &format!(
                        "INSERT INTO {table} (major, minor, prev_major, prev_minor, name, up_file, down_file) \
                         VALUES (?, ?, ?, ?, ?, ?, ?)"
                    ),
                    params![
                        to_i64(version.major()),
                        to_i64(version.minor()),
                        to_i64(previous.major()),
                        to_i64(previous.minor()),
                        pair.up().name(),
                        up,
                        down
                    ],
                )?;
            }
            Direction::Down => {
                conn.execute(
                    &format!("DELETE FROM {table} WHERE major = ? AND minor = ?"),
                    params![to_i64(version.major()), to_i64(version.minor())],
                )?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Driver for DuckDbDriver {
    fn db_type(&self) -> &'static str {
        "duckdb"
    }

    fn filename_extension(&self) -> &'static str {
        "sql"
    }

    fn version_table(&self) -> &str {
        &self.table_name
    }

    async fn begin(&self) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch("BEGIN TRANSACTION")
            .map_err(|e| DbError::TransactionError(format!("BEGIN failed: {e}")))
    }

    async fn commit(&self) -> DbResult<()> {
        let conn = self.lock()?;
        if let Err(e) = conn.execute_batch("COMMIT") {
            if let Err(rollback) = conn.execute_batch("ROLLBACK") {
                log::warn!("Rollback after failed COMMIT failed: {}", rollback);
            }
            return Err(DbError::TransactionError(format!("COMMIT failed: {e}")));
        }
        Ok(())
    }

    async fn rollback(&self) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch("ROLLBACK")
            .map_err(|e| DbError::TransactionError(format!("ROLLBACK failed: {e}")))
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql)?;
        Ok(())
    }

    async fn ensure_version_table(&self, schema: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(&format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(schema)))?;
        self.set_schema(&conn, schema)?;
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                 major      BIGINT    NOT NULL,
                 minor      BIGINT    NOT NULL,
                 prev_major BIGINT    NOT NULL,
                 prev_minor BIGINT    NOT NULL,
                 name       VARCHAR   NOT NULL DEFAULT '',
                 up_file    VARCHAR   NOT NULL DEFAULT '',
                 down_file  VARCHAR   NOT NULL DEFAULT '',
                 applied_at TIMESTAMP NOT NULL DEFAULT now()
             )",
            self.qualified_version_table()?
        ))?;
        log::debug!("Version table {}.{} ready", schema, self.table_name);
        Ok(())
    }

    async fn version(&self) -> DbResult<Version> {
        let conn = self.lock()?;
        Ok(self.version_sync(&conn)?.unwrap_or(Version::ZERO))
    }

    async fn get_migration_files(&self, mode: VersionMode) -> DbResult<MigrationFiles> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT major, minor, name, up_file, down_file FROM {} ORDER BY major, minor",
            self.qualified_version_table()?
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let files = rows
            .into_iter()
            .map(|(major, minor, name, up, down)| {
                let version = Version::new(major.max(0) as u64, minor.max(0) as u64);
                let name = if name.is_empty() { "-".to_string() } else { name };
                let file_name = |direction: Direction| {
                    format!(
                        "{}_{}.{}.{}",
                        version.minor_string(),
                        name,
                        direction,
                        self.filename_extension()
                    )
                };
                MigrationFile::new(
                    version,
                    File::new(file_name(Direction::Up), version, name.clone(), Direction::Up)
                        .with_content(up),
                    File::new(file_name(Direction::Down), version, name.clone(), Direction::Down)
                        .with_content(down),
                )
            })
            .collect();
        Ok(MigrationFiles::new(mode, files)?)
    }

    async fn migrate(&self, migration: &Migration) -> DbResult<()> {
        let file = migration.file();
        let content = file.load_text()?;
        let conn = self.lock()?;
        self.record_sync(&conn, migration)?;
        if content.trim().is_empty() {
            return Ok(());
        }
        conn.execute_batch(&content)
            .map_err(|e| script_error(file.file_name(), &content, &e.to_string()))
    }

    async fn update_files(&self, migration: &Migration) -> DbResult<()> {
        let pair = migration.migration_file();
        let up = pair.up().load_text()?;
        let down = pair.down().load_text()?;
        let version = migration.version();
        let conn = self.lock()?;
        conn.execute(
            &format!(
                "UPDATE {} SET name = ?, up_file = ?, down_file = ? WHERE major = ? AND minor = ?",
                self.qualified_version_table()?
            ),
            params![
                pair.up().name(),
                up,
                down,
                to_i64(version.major()),
                to_i64(version.minor())
            ],
        )?;
        Ok(())
    }

    fn as_dump(&self) -> Option<&dyn DumpDriver> {
        Some(self)
    }
}

#[async_trait]
impl DumpDriver for DuckDbDriver {
    async fn list_tables(&self, schema: &str) -> DbResult<Vec<String>> {
        let conn = self.lock()?;
        self.tables_sync(&conn, schema, false)
    }

    async fn dump_table(
        &self,
        schema: &str,
        table: &str,
        out: &mut (dyn Write + Send),
    ) -> DbResult<()> {
        let tmp = tempfile::NamedTempFile::new()?;
        {
            let conn = self.lock()?;
            conn.execute_batch(&format!(
                "COPY {}.{} TO {} (FORMAT CSV, HEADER)",
                quote_ident(schema),
                quote_ident(table),
                quote_literal(&tmp.path().display().to_string())
            ))?;
        }
        let mut reader = std::fs::File::open(tmp.path())?;
        std::io::copy(&mut reader, out)?;
        out.flush()?;
        Ok(())
    }

    async fn restore_table(&self, schema: &str, table: &str, data: &[u8]) -> DbResult<()> {
        let mut tmp = tempfile::NamedTempFile::new()?;
        tmp.write_all(data)?;
        tmp.flush()?;
        let conn = self.lock()?;
        conn.execute_batch(&format!(
            "COPY {}.{} FROM {} (FORMAT CSV, HEADER)",
            quote_ident(schema),
            quote_ident(table),
            quote_literal(&tmp.path().display().to_string())
        ))?;
        Ok(())
    }

    async fn truncate_tables(&self, schema: &str) -> DbResult<()> {
        let conn = self.lock()?;
        for table in self.tables_sync(&conn, schema, false)? {
            conn.execute_batch(&format!(
                "DELETE FROM {}.{}",
                quote_ident(schema),
                quote_ident(&table)
            ))?;
        }
        Ok(())
    }

    async fn schema_exists(&self, schema: &str) -> DbResult<bool> {
        let conn = self.lock()?;
        self.schema_exists_sync(&conn, schema)
    }

    async fn ensure_schema(&self, schema: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(&format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(schema)))?;
        Ok(())
    }

    async fn drop_schema(&self, schema: &str) -> DbResult<()> {
        let conn = self.lock()?;
        self.drop_schema_sync(&conn, schema)
    }

    /// DuckDB cannot rename a schema: every object of `from` is recreated in
    /// `to` from its catalog DDL, the table data copied and `from` dropped.
    async fn rename_schema(&self, from: &str, to: &str) -> DbResult<()> {
        let conn = self.lock()?;
        if !self.schema_exists_sync(&conn, from)? {
            return Err(DbError::ExecutionError(format!(
                "Schema {from} does not exist"
            )));
        }
        if to != INTERNAL_SCHEMA && self.schema_exists_sync(&conn, to)? {
            return Err(DbError::ExecutionError(format!("Schema {to} already exists")));
        }
        if !self.tables_sync(&conn, to, true)?.is_empty() {
            return Err(DbError::ExecutionError(format!("Schema {to} is not empty")));
        }

        let objects = schema_objects(&conn, from)?;
        conn.execute_batch(&format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(to)))?;
        // unqualified DDL lands in `to`
        conn.execute_batch(&format!("SET schema = {}", quote_literal(to)))?;
        let copied = objects.recreate(&conn, from, to);
        conn.execute_batch(&format!(
            "SET schema = {}",
            quote_literal(&self.current_schema()?)
        ))?;
        copied?;

        self.drop_schema_sync(&conn, from)?;
        log::debug!(
            "Renamed schema {from} to {to} ({} tables, {} views)",
            objects.tables.len(),
            objects.views.len()
        );
        Ok(())
    }
}

/// A sequence and the state needed to continue it elsewhere.
#[derive(Debug)]
struct SequenceState {
    name: String,
    start: i64,
    min: i64,
    max: i64,
    increment: i64,
    cycle: bool,
    last: Option<i64>,
}

impl SequenceState {
    fn ddl(&self, schema: &str) -> String {
        let next = match self.last {
            Some(last) => last.saturating_add(self.increment),
            None => self.start,
        };
        let next = if self.cycle && (next > self.max || next < self.min) {
            if self.increment > 0 {
                self.min
            } else {
                self.max
            }
        } else {
            next
        };
        format!(
            "CREATE SEQUENCE {}.{} INCREMENT BY {} MINVALUE {} MAXVALUE {} START WITH {} {}",
            quote_ident(schema),
            quote_ident(&self.name),
            self.increment,
            self.min,
            self.max,
            next,
            if self.cycle { "CYCLE" } else { "NO CYCLE" }
        )
    }
}

/// Catalog objects of one schema, in creation order.
#[derive(Debug, Default)]
struct SchemaObjects {
    sequences: Vec<SequenceState>,
    tables: Vec<(String, String)>,
    indexes: Vec<String>,
    views: Vec<String>,
}

impl SchemaObjects {
    fn recreate(&self, conn: &Connection, from: &str, to: &str) -> DbResult<()> {
        for sequence in &self.sequences {
            conn.execute_batch(&sequence.ddl(to))?;
        }
        for (_, sql) in &self.tables {
            conn.execute_batch(&retarget_ddl(sql, from, to))?;
        }
        for (table, _) in &self.tables {
            conn.execute_batch(&format!(
                "INSERT INTO {}.{} SELECT * FROM {}.{}",
                quote_ident(to),
                quote_ident(table),
                quote_ident(from),
                quote_ident(table)
            ))?;
        }
        for sql in self.indexes.iter().chain(&self.views) {
            conn.execute_batch(&retarget_ddl(sql, from, to))?;
        }
        Ok(())
    }
}

/// Read everything needed to rebuild `schema` elsewhere. Objects that have
/// no DDL to replay are an error rather than being left behind.
fn schema_objects(conn: &Connection, schema: &str) -> DbResult<SchemaObjects> {
    let unsupported = |kind: &str, name: &str| {
        DbError::ExecutionError(format!(
            "Cannot move {kind} {schema}.{name} to another schema"
        ))
    };
    let mut objects = SchemaObjects::default();

    let mut stmt = conn.prepare(
        "SELECT function_name FROM duckdb_functions() \
         WHERE schema_name = ? AND database_name = current_database() AND NOT internal \
           AND function_type IN ('macro', 'table_macro')",
    )?;
    let macros = stmt
        .query_map(params![schema], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    if let Some(name) = macros.first() {
        return Err(unsupported("macro", name));
    }

    let mut stmt = conn.prepare(
        "SELECT sequence_name, start_value, min_value, max_value, increment_by, cycle, last_value \
         FROM duckdb_sequences() \
         WHERE schema_name = ? AND database_name = current_database() AND NOT temporary \
         ORDER BY sequence_oid",
    )?;
    objects.sequences = stmt
        .query_map(params![schema], |row| {
            Ok(SequenceState {
                name: row.get(0)?,
                start: row.get(1)?,
                min: row.get(2)?,
                max: row.get(3)?,
                increment: row.get(4)?,
                cycle: row.get(5)?,
                last: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT table_name, sql FROM duckdb_tables() \
         WHERE schema_name = ? AND database_name = current_database() AND NOT temporary \
         ORDER BY table_oid",
    )?;
    let tables = stmt
        .query_map(params![schema], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    for (name, sql) in tables {
        let sql = sql.ok_or_else(|| unsupported("table", &name))?;
        objects.tables.push((name, sql));
    }

    let mut stmt = conn.prepare(
        "SELECT index_name, is_unique OR is_primary, sql FROM duckdb_indexes() \
         WHERE schema_name = ? AND database_name = current_database() \
         ORDER BY index_oid",
    )?;
    let indexes = stmt
        .query_map(params![schema], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, bool>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    for (name, constraint, sql) in indexes {
        match sql {
            Some(sql) => objects.indexes.push(sql),
            // key constraints come back with the table DDL
            None if constraint => {}
            None => return Err(unsupported("index", &name)),
        }
    }

    let mut stmt = conn.prepare(
        "SELECT view_name, sql FROM duckdb_views() \
         WHERE schema_name = ? AND database_name = current_database() \
           AND NOT internal AND NOT temporary \
         ORDER BY view_oid",
    )?;
    let views = stmt
        .query_map(params![schema], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    for (name, sql) in views {
        objects
            .views
            .push(sql.ok_or_else(|| unsupported("view", &name))?);
    }

    Ok(objects)
}

/// Point schema-qualified references in `sql` (with or without a catalog
/// prefix, quoted or bare, including inside `nextval('...')` literals) at
/// `to` instead of `from`.
fn retarget_ddl(sql: &str, from: &str, to: &str) -> String {
    let pattern = format!(
        r#"(^|[^A-Za-z0-9_$."])(?:(?:"(?:[^"]|"")*"|[A-Za-z_][A-Za-z0-9_$]*)\.)?(?:"{}"|{})\."#,
        regex::escape(&from.replace('"', "\"\"")),
        regex::escape(from)
    );
    let Ok(re) = Regex::new(&pattern) else {
        return sql.to_string();
    };
    let target = if is_plain_ident(to) {
        to.to_string()
    } else {
        quote_ident(to)
    };
    re.replace_all(sql, |caps: &regex::Captures<'_>| {
        format!("{}{}.", &caps[1], target)
    })
    .into_owned()
}

fn is_plain_ident(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

fn to_i64(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

static NEAR_TOKEN_RE: OnceLock<Regex> = OnceLock::new();
static LINE_RE: OnceLock<Regex> = OnceLock::new();

/// 1-based line and column of the failure DuckDB reports in `message`.
///
/// The `LINE n:` marker wins; within that line the quoted near-token, then
/// the caret, gives the column. Without a marker the first occurrence of the
/// near-token in the script is used.
fn error_position(content: &str, message: &str) -> Option<(usize, usize)> {
    let near = NEAR_TOKEN_RE
        .get_or_init(|| Regex::new(r#"at or near "([^"]+)""#).expect("valid regex literal"))
        .captures(message)
        .and_then(|caps| caps.get(1))
        .map(|token| token.as_str());
    let marker = LINE_RE
        .get_or_init(|| {
            Regex::new(r"(LINE (\d+): )(.*)\n( *)\^").expect("valid regex literal")
        })
        .captures(message);

    if let Some(caps) = marker {
        let line: usize = caps[2].parse().ok()?;
        let text = content.lines().nth(line.checked_sub(1)?)?;
        let caret = caps[4].len().checked_sub(caps[1].len());
        let column = near
            .and_then(|token| text.find(token))
            .or_else(|| caret.filter(|_| !caps[3].starts_with("...")))
            .map_or(1, |index| index + 1);
        return Some((line, column));
    }

    let offset = content.find(near?)?;
    Some(line_column_from_offset(content.as_bytes(), offset))
}

/// Build a script error, locating the failure when DuckDB reports where it is.
fn script_error(file_name: &str, content: &str, message: &str) -> DbError {
    match error_position(content, message) {
        Some((line, column)) => DbError::ScriptError {
            file: file_name.to_string(),
            message: message.to_string(),
            line: Some(line),
            column: Some(column),
            snippet: lines_before_and_after(
                content.as_bytes(),
                line,
                CONTEXT_LINES,
                CONTEXT_LINES,
                true,
            ),
        },
        None => DbError::ScriptError {
            file: file_name.to_string(),
            message: message.to_string(),
            line: None,
            column: None,
            snippet: String::new(),
        },
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
