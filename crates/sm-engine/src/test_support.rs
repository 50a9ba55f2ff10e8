//! In-memory recording driver for engine tests.
//!
//! State lives in a committed snapshot plus, while a transaction is open, a
//! working copy that commit promotes and rollback discards. Scripts are not
//! interpreted beyond `CREATE TABLE <name>` / `DROP TABLE <name>` lines.

use crate::migrator::Migrator;
use async_trait::async_trait;
use sm_core::{Direction, File, Migration, MigrationFile, MigrationFiles, Version, VersionMode};
use sm_db::{DbError, DbResult, Driver, DumpDriver};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Default)]
struct Recorded {
    name: String,
    up: String,
    down: String,
}

#[derive(Debug, Clone, Default)]
struct SchemaState {
    versions: BTreeMap<Version, Recorded>,
    tables: BTreeMap<String, Vec<u8>>,
}

type Store = BTreeMap<String, SchemaState>;

#[derive(Default)]
struct Inner {
    committed: Store,
    working: Option<Store>,
    schema: String,
    begins: usize,
    commits: usize,
    rollbacks: usize,
    executed: Vec<String>,
    fail_marker: Option<String>,
    fail_rename_to: Option<String>,
    panic_marker: Option<String>,
}

impl Inner {
    fn store(&mut self) -> &mut Store {
        match &mut self.working {
            Some(working) => working,
            None => &mut self.committed,
        }
    }

    fn current(&mut self) -> &mut SchemaState {
        let schema = self.schema.clone();
        self.store().entry(schema).or_default()
    }
}

pub struct MockDriver {
    inner: Mutex<Inner>,
    dump: bool,
}

impl MockDriver {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                schema: "main".to_string(),
                ..Inner::default()
            }),
            dump: true,
        }
    }

    /// A driver without the dump capability.
    pub fn without_dump() -> Self {
        Self {
            dump: false,
            ..Self::new()
        }
    }

    /// Fail any script whose content contains `marker`.
    pub fn fail_scripts_containing(&self, marker: &str) {
        self.lock().fail_marker = Some(marker.to_string());
    }

    /// Panic inside `migrate` for any script containing `marker`.
    pub fn panic_on_scripts_containing(&self, marker: &str) {
        self.lock().panic_marker = Some(marker.to_string());
    }

    /// Fail any schema rename targeting `schema`.
    pub fn fail_rename_to(&self, schema: &str) {
        self.lock().fail_rename_to = Some(schema.to_string());
    }

    pub fn begins(&self) -> usize {
        self.lock().begins
    }

    pub fn commits(&self) -> usize {
        self.lock().commits
    }

    pub fn rollbacks(&self) -> usize {
        self.lock().rollbacks
    }

    pub fn in_transaction(&self) -> bool {
        self.lock().working.is_some()
    }

    /// Contents of every script executed, in order.
    pub fn executed(&self) -> Vec<String> {
        self.lock().executed.clone()
    }

    /// Committed schema names.
    pub fn schema_names(&self) -> Vec<String> {
        self.lock().committed.keys().cloned().collect()
    }

    /// Committed versions recorded in `schema`.
    pub fn recorded_versions(&self, schema: &str) -> Vec<Version> {
        self.lock()
            .committed
            .get(schema)
            .map(|s| s.versions.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Committed table names in `schema`.
    pub fn table_names(&self, schema: &str) -> Vec<String> {
        self.lock()
            .committed
            .get(schema)
            .map(|s| s.tables.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn table_data(&self, schema: &str, table: &str) -> Option<Vec<u8>> {
        self.lock()
            .committed
            .get(schema)
            .and_then(|s| s.tables.get(table).cloned())
    }

    pub fn put_table(&self, schema: &str, table: &str, data: &[u8]) {
        self.lock()
            .store()
            .entry(schema.to_string())
            .or_default()
            .tables
            .insert(table.to_string(), data.to_vec());
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_script(state: &mut SchemaState, script: &str) {
    for line in script.lines() {
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            ["CREATE", "TABLE", name, ..] => {
                let name = name.trim_end_matches(';').to_string();
                state.tables.entry(name).or_default();
            }
            ["DROP", "TABLE", name, ..] => {
                state.tables.remove(name.trim_end_matches(';'));
            }
            _ => {}
        }
    }
}

#[async_trait]
impl Driver for MockDriver {
    fn db_type(&self) -> &'static str {
        "mock"
    }

    fn filename_extension(&self) -> &'static str {
        "sql"
    }

    fn version_table(&self) -> &str {
        "schema_migrations"
    }

    async fn begin(&self) -> DbResult<()> {
        let mut inner = self.lock();
        if inner.working.is_some() {
            return Err(DbError::TransactionError("transaction already open".into()));
        }
        inner.working = Some(inner.committed.clone());
        inner.begins += 1;
        Ok(())
    }

    async fn commit(&self) -> DbResult<()> {
        let mut inner = self.lock();
        let working = inner
            .working
            .take()
            .ok_or_else(|| DbError::TransactionError("no transaction".into()))?;
        inner.committed = working;
        inner.commits += 1;
        Ok(())
    }

    async fn rollback(&self) -> DbResult<()> {
        let mut inner = self.lock();
        if inner.working.take().is_none() {
            return Err(DbError::TransactionError("no transaction".into()));
        }
        inner.rollbacks += 1;
        Ok(())
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        let mut inner = self.lock();
        inner.executed.push(sql.to_string());
        apply_script(inner.current(), sql);
        Ok(())
    }

    async fn ensure_version_table(&self, schema: &str) -> DbResult<()> {
        let mut inner = self.lock();
        inner.schema = schema.to_string();
        inner.current();
        Ok(())
    }

    async fn version(&self) -> DbResult<Version> {
        let mut inner = self.lock();
        Ok(inner
            .current()
            .versions
            .keys()
            .next_back()
            .copied()
            .unwrap_or(Version::ZERO))
    }

    async fn get_migration_files(&self, mode: VersionMode) -> DbResult<MigrationFiles> {
        let mut inner = self.lock();
        let files = inner
            .current()
            .versions
            .iter()
            .map(|(version, recorded)| {
                let base = format!("{}_{}", version.minor_string(), recorded.name);
                MigrationFile::new(
                    *version,
                    File::new(format!("{base}.up.sql"), *version, &recorded.name, Direction::Up)
                        .with_content(recorded.up.clone()),
                    File::new(
                        format!("{base}.down.sql"),
                        *version,
                        &recorded.name,
                        Direction::Down,
                    )
                    .with_content(recorded.down.clone()),
                )
            })
            .collect();
        Ok(MigrationFiles::new(mode, files)?)
    }

    async fn migrate(&self, migration: &Migration) -> DbResult<()> {
        let script = migration.file().load_text()?;
        let panic_marker = self.lock().panic_marker.clone();
        if let Some(marker) = panic_marker {
            assert!(!script.contains(&marker), "driver crashed on {marker}");
        }
        let pair = migration.migration_file();
        let recorded = Recorded {
            name: pair.up().name().to_string(),
            up: pair.up().load_text()?,
            down: pair.down().load_text()?,
        };

        let mut inner = self.lock();
        let version = migration.version();
        {
            let state = inner.current();
            match migration.direction() {
                Direction::Up => {
                    if let Some(previous) = state.versions.keys().next_back().copied() {
                        if previous.inc(previous.major() != version.major()) != version {
                            return Err(DbError::VersionChain {
                                previous: previous.to_string(),
                                version: version.to_string(),
                            });
                        }
                    }
                    state.versions.insert(version, recorded);
                }
                Direction::Down => {
                    state.versions.remove(&version);
                }
            }
        }

        inner.executed.push(script.clone());
        if let Some(marker) = &inner.fail_marker {
            if script.contains(marker.as_str()) {
                return Err(DbError::ScriptError {
                    file: migration.file().file_name().to_string(),
                    message: format!("script contains {marker}"),
                    line: None,
                    column: None,
                    snippet: String::new(),
                });
            }
        }
        apply_script(inner.current(), &script);
        Ok(())
    }

    async fn update_files(&self, migration: &Migration) -> DbResult<()> {
        let pair = migration.migration_file();
        let up = pair.up().load_text()?;
        let down = pair.down().load_text()?;
        let mut inner = self.lock();
        if let Some(recorded) = inner.current().versions.get_mut(&migration.version()) {
            recorded.name = pair.up().name().to_string();
            recorded.up = up;
            recorded.down = down;
        }
        Ok(())
    }

    fn as_dump(&self) -> Option<&dyn DumpDriver> {
        if self.dump {
            Some(self)
        } else {
            None
        }
    }
}

#[async_trait]
impl DumpDriver for MockDriver {
    async fn list_tables(&self, schema: &str) -> DbResult<Vec<String>> {
        let mut inner = self.lock();
        Ok(inner
            .store()
            .get(schema)
            .map(|s| s.tables.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn dump_table(
        &self,
        schema: &str,
        table: &str,
        out: &mut (dyn Write + Send),
    ) -> DbResult<()> {
        let data = {
            let mut inner = self.lock();
            inner
                .store()
                .get(schema)
                .and_then(|s| s.tables.get(table).cloned())
                .ok_or_else(|| DbError::ExecutionError(format!("no table {schema}.{table}")))?
        };
        out.write_all(&data)?;
        Ok(())
    }

    async fn restore_table(&self, schema: &str, table: &str, data: &[u8]) -> DbResult<()> {
        let mut inner = self.lock();
        let state = inner
            .store()
            .get_mut(schema)
            .ok_or_else(|| DbError::ExecutionError(format!("no schema {schema}")))?;
        let slot = state
            .tables
            .get_mut(table)
            .ok_or_else(|| DbError::ExecutionError(format!("no table {schema}.{table}")))?;
        *slot = data.to_vec();
        Ok(())
    }

    async fn truncate_tables(&self, schema: &str) -> DbResult<()> {
        let mut inner = self.lock();
        if let Some(state) = inner.store().get_mut(schema) {
            for data in state.tables.values_mut() {
                data.clear();
            }
        }
        Ok(())
    }

    async fn schema_exists(&self, schema: &str) -> DbResult<bool> {
        Ok(self.lock().store().contains_key(schema))
    }

    async fn ensure_schema(&self, schema: &str) -> DbResult<()> {
        self.lock().store().entry(schema.to_string()).or_default();
        Ok(())
    }

    async fn drop_schema(&self, schema: &str) -> DbResult<()> {
        self.lock().store().remove(schema);
        Ok(())
    }

    async fn rename_schema(&self, from: &str, to: &str) -> DbResult<()> {
        let mut inner = self.lock();
        if inner.fail_rename_to.as_deref() == Some(to) {
            return Err(DbError::ExecutionError(format!(
                "rename {from} to {to} refused"
            )));
        }
        let store = inner.store();
        if store.contains_key(to) {
            return Err(DbError::ExecutionError(format!("schema {to} exists")));
        }
        let state = store
            .remove(from)
            .ok_or_else(|| DbError::ExecutionError(format!("no schema {from}")))?;
        store.insert(to.to_string(), state);
        Ok(())
    }
}

/// Write a legacy-numbered up/down pair into `dir`.
pub fn write_pair(dir: &Path, minor: u64, name: &str, up: &str, down: &str) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join(format!("{minor:04}_{name}.up.sql")), up).unwrap();
    std::fs::write(dir.join(format!("{minor:04}_{name}.down.sql")), down).unwrap();
}

/// Write a versioned up/down pair into `dir/<major>`.
pub fn write_versioned_pair(dir: &Path, major: u64, minor: u64, name: &str, up: &str, down: &str) {
    write_pair(&dir.join(format!("{major:03}")), minor, name, up, down);
}

/// A legacy-mode migrator over `driver` reading scripts from `dir`.
pub fn migrator(driver: &Arc<MockDriver>, dir: &Path) -> Migrator {
    let driver: Arc<dyn Driver> = driver.clone();
    Migrator::new(driver, dir)
}
