//! The migrator: loads recorded and on-disk migrations, resolves a plan and
//! applies it inside transaction groups, reporting progress as events.

use crate::error::{EngineError, EngineResult};
use crate::event::{self, forward, EventSender, EventStream, FileEvent, Forwarded};
use crate::transaction::TransactionGroup;
use sm_core::{
    read_migration_files, Config, Direction, File, MigrationFile, MigrationFiles, Plan, TxMode,
    Version, VersionMode,
};
use sm_db::Driver;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Applies migrations from a directory to one schema of a driver.
///
/// Cloning is cheap; clones share the driver and the cancellation token.
/// Streaming operations ([`up`](Migrator::up), [`down`](Migrator::down), ...)
/// run on a spawned task and must be called from within a tokio runtime.
#[derive(Clone)]
pub struct Migrator {
    driver: Arc<dyn Driver>,
    path: PathBuf,
    mode: VersionMode,
    tx_mode: TxMode,
    force: bool,
    schema: String,
    cancel: CancellationToken,
}

impl Migrator {
    pub fn new(driver: Arc<dyn Driver>, path: impl Into<PathBuf>) -> Self {
        Self {
            driver,
            path: path.into(),
            mode: VersionMode::Legacy,
            tx_mode: TxMode::default(),
            force: false,
            schema: "main".to_string(),
            cancel: CancellationToken::new(),
        }
    }

    /// Build a migrator from project configuration rooted at `root`.
    pub fn from_config(driver: Arc<dyn Driver>, config: &Config, root: &Path) -> Self {
        Self::new(driver, config.migrations_path_absolute(root))
            .with_mode(config.mode)
            .with_tx_mode(config.transaction)
            .with_force(config.force)
            .with_schema(&config.schema)
    }

    pub fn with_mode(mut self, mode: VersionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_tx_mode(mut self, tx_mode: TxMode) -> Self {
        self.tx_mode = tx_mode;
        self
    }

    /// Skip base file validation.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    /// Use `cancel` as the parent of every operation's token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> VersionMode {
        self.mode
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// A copy of this migrator pointed at another schema.
    pub(crate) fn for_schema(&self, schema: &str) -> Migrator {
        self.clone().with_schema(schema)
    }

    /// Apply every pending up migration.
    pub fn up(&self) -> EventStream {
        self.spawn(|m, events, cancel| async move { m.run_up(&events, &cancel).await })
    }

    /// Undo every applied migration.
    pub fn down(&self) -> EventStream {
        self.spawn(|m, events, cancel| async move { m.run_down(&events, &cancel).await })
    }

    /// Move `n` steps: forward when positive, backward when negative.
    pub fn migrate(&self, n: i64) -> EventStream {
        self.spawn(move |m, events, cancel| async move {
            m.run_migrate(&events, &cancel, n).await
        })
    }

    /// Move to `target`, up or down.
    pub fn goto(&self, target: Version) -> EventStream {
        self.spawn(move |m, events, cancel| async move {
            m.run_goto(&events, &cancel, target).await
        })
    }

    /// Undo and reapply the last migration.
    pub fn redo(&self) -> EventStream {
        self.spawn(|m, events, cancel| async move { m.run_redo(&events, &cancel).await })
    }

    /// Undo everything, then apply everything.
    pub fn reset(&self) -> EventStream {
        self.spawn(|m, events, cancel| async move { m.run_reset(&events, &cancel).await })
    }

    /// Reconcile the database with the files on disk, in either direction.
    pub fn between(&self) -> EventStream {
        self.spawn(|m, events, cancel| async move { m.run_between(&events, &cancel).await })
    }

    /// Current database version.
    pub async fn version(&self) -> EngineResult<Version> {
        self.driver.ensure_version_table(&self.schema).await?;
        Ok(self.driver.version().await?)
    }

    /// Write a new migration pair after the last one on disk.
    ///
    /// Spaces in `name` become underscores. `bump_major` opens a new major
    /// block in versioned mode and is ignored in legacy mode.
    pub fn create(
        &self,
        bump_major: bool,
        name: &str,
        up: Option<&str>,
        down: Option<&str>,
    ) -> EngineResult<MigrationFile> {
        let files = self.read_files()?;
        let bump = bump_major && self.mode.is_versioned();
        let next = files.last_version().inc(bump);
        let version = self.mode.version(next.major(), next.minor());

        let name = name.trim().replace(' ', "_");
        let extension = self.driver.filename_extension();
        let file = |direction: Direction, content: Option<&str>| {
            File::new(
                format!(
                    "{}_{}.{}.{}",
                    version.minor_string(),
                    name,
                    direction,
                    extension
                ),
                version,
                name.as_str(),
                direction,
            )
            .with_content(content.unwrap_or_default())
        };

        let mut pair = MigrationFile::new(
            version,
            file(Direction::Up, up),
            file(Direction::Down, down),
        );
        pair.write_files(&self.path, self.mode)?;
        log::info!(
            "Created migration {} ({})",
            version.display(self.mode),
            pair.up().file_name()
        );
        Ok(pair)
    }

    /// Run `op` on its own task, turning a returned error into a final
    /// [`Event::Error`](crate::Event::Error).
    pub(crate) fn spawn<F, Fut>(&self, op: F) -> EventStream
    where
        F: FnOnce(Migrator, EventSender, CancellationToken) -> Fut,
        Fut: Future<Output = EngineResult<()>> + Send + 'static,
    {
        let (events, stream) = event::channel();
        let task = op(self.clone(), events.clone(), self.cancel.child_token());
        launch(events, task);
        stream
    }

    fn read_files(&self) -> EngineResult<MigrationFiles> {
        Ok(read_migration_files(
            &self.path,
            self.mode,
            self.driver.filename_extension(),
        )?)
    }

    /// Load recorded and on-disk migrations and check they agree.
    ///
    /// Returns `(recorded, on_disk)`.
    pub(crate) async fn init(
        &self,
        validate: bool,
        allow_ahead: bool,
    ) -> EngineResult<(MigrationFiles, MigrationFiles)> {
        self.driver.ensure_version_table(&self.schema).await?;
        let prev = self.driver.get_migration_files(self.mode).await?;
        let files = self.read_files()?;
        let version = self.driver.version().await?;

        if prev.last_version() != version {
            return Err(EngineError::InconsistentState {
                recorded: prev.last_version().display(self.mode).to_string(),
                database: version.display(self.mode).to_string(),
            });
        }
        if !allow_ahead && version > files.last_version() {
            return Err(EngineError::DatabaseAhead {
                database: version.display(self.mode).to_string(),
                files: files.last_version().display(self.mode).to_string(),
            });
        }
        if validate && !self.force {
            let shared = prev.len().min(files.len());
            files.validate_base_files(&prev.prefix(shared))?;
        }

        log::debug!(
            "Schema {} at version {} with {} migration files on disk",
            self.schema,
            version.display(self.mode),
            files.len()
        );
        Ok((prev, files))
    }

    async fn run_up(&self, events: &EventSender, cancel: &CancellationToken) -> EngineResult<()> {
        let (prev, files) = self.init(true, false).await?;
        let plan = files.to_last_from(prev.last_version());
        self.migrate_files(events, cancel, &prev, &files, plan).await
    }

    async fn run_down(&self, events: &EventSender, cancel: &CancellationToken) -> EngineResult<()> {
        let (prev, files) = self.init(true, false).await?;
        let plan = files.to_first_from(prev.last_version());
        self.migrate_files(events, cancel, &prev, &files, plan).await
    }

    async fn run_migrate(
        &self,
        events: &EventSender,
        cancel: &CancellationToken,
        n: i64,
    ) -> EngineResult<()> {
        let (prev, files) = self.init(true, false).await?;
        let plan = files.from(prev.last_version(), n);
        self.migrate_files(events, cancel, &prev, &files, plan).await
    }

    async fn run_goto(
        &self,
        events: &EventSender,
        cancel: &CancellationToken,
        target: Version,
    ) -> EngineResult<()> {
        let (prev, files) = self.init(true, false).await?;
        if target != Version::ZERO && !files.versions().contains(&target) {
            return Err(EngineError::UnknownVersion {
                version: target.display(self.mode).to_string(),
            });
        }
        let plan = files.from_to(prev.last_version(), target);
        self.migrate_files(events, cancel, &prev, &files, plan).await
    }

    pub(crate) async fn run_between(
        &self,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> EngineResult<()> {
        let (prev, files) = self.init(true, true).await?;
        let (current, destination, plan) = if prev.is_empty() {
            let current = prev.last_version();
            let destination = files.last_version();
            let plan = if current <= destination {
                files.to_last_from(current)
            } else {
                files.down_to(destination)
            };
            (current, destination, plan)
        } else {
            let between = files.between(&prev, self.force)?;
            (between.current, between.destination, between.plan)
        };

        events
            .status(format!(
                "Migrating {} from {} to {}",
                self.schema,
                current.display(self.mode),
                destination.display(self.mode)
            ))
            .await;
        self.migrate_files(events, cancel, &prev, &files, plan).await
    }

    async fn run_redo(&self, events: &EventSender, cancel: &CancellationToken) -> EngineResult<()> {
        let back = self.clone();
        let undo = self.spawn_child(cancel, move |events, cancel| async move {
            back.run_migrate(&events, &cancel, -1).await
        });
        if self.chain(undo, events, cancel).await? {
            self.run_migrate(events, cancel, 1).await?;
        }
        Ok(())
    }

    async fn run_reset(&self, events: &EventSender, cancel: &CancellationToken) -> EngineResult<()> {
        let back = self.clone();
        let undo = self.spawn_child(cancel, move |events, cancel| async move {
            back.run_down(&events, &cancel).await
        });
        if self.chain(undo, events, cancel).await? {
            self.run_up(events, cancel).await?;
        }
        Ok(())
    }

    /// Run the first half of a compound operation on its own task, under a
    /// child of `cancel`.
    fn spawn_child<F, Fut>(&self, cancel: &CancellationToken, op: F) -> EventStream
    where
        F: FnOnce(EventSender, CancellationToken) -> Fut,
        Fut: Future<Output = EngineResult<()>> + Send + 'static,
    {
        let (events, stream) = event::channel();
        let task = op(events.clone(), cancel.child_token());
        launch(events, task);
        stream
    }

    /// Relay the first half's events. Returns whether the second half
    /// should run.
    async fn chain(
        &self,
        mut first: EventStream,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> EngineResult<bool> {
        match forward(&mut first, events, cancel).await {
            Forwarded::Cancelled => Err(EngineError::Cancelled),
            Forwarded::Completed { errors } if errors > 0 => {
                log::debug!("First step reported {} errors, not continuing", errors);
                Ok(false)
            }
            Forwarded::Completed { .. } => Ok(true),
        }
    }

    /// Apply `plan`, refreshing stored scripts of already-applied versions
    /// first when the plan starts by going up.
    pub(crate) async fn migrate_files(
        &self,
        events: &EventSender,
        cancel: &CancellationToken,
        prev: &MigrationFiles,
        files: &MigrationFiles,
        plan: Plan,
    ) -> EngineResult<()> {
        let Some(first) = plan.first() else {
            // Older records may predate stored scripts.
            if let Some(recorded) = prev.first() {
                if recorded.up().load()?.is_empty() {
                    let stop = files.last_version().inc(true);
                    self.refresh_files(events, cancel, files, stop).await?;
                }
            }
            events.status("No migrations to apply").await;
            return Ok(());
        };

        if first.is_up() && !prev.is_empty() {
            self.refresh_files(events, cancel, files, first.version())
                .await?;
        }

        let total = plan.len();
        let mut group = TransactionGroup::new(self.driver.as_ref(), self.tx_mode);
        for migration in plan {
            if cancel.is_cancelled() {
                group.rollback().await?;
                return Err(EngineError::Cancelled);
            }
            group.prepare(migration.version()).await?;
            events.file(FileEvent::migrate(migration.file())).await;
            if let Err(e) = self.driver.migrate(&migration).await {
                if let Err(rollback) = group.rollback().await {
                    log::warn!("Rollback after failed migration failed: {}", rollback);
                }
                return Err(e.into());
            }
            group.applied(migration.version());
        }

        let commits = group.finish().await?;
        log::info!(
            "Applied {} migrations to {} in {} transactions",
            total,
            self.schema,
            commits
        );
        Ok(())
    }

    /// Rewrite the stored scripts of every version below `stop` from the
    /// on-disk files, in one transaction.
    async fn refresh_files(
        &self,
        events: &EventSender,
        cancel: &CancellationToken,
        files: &MigrationFiles,
        stop: Version,
    ) -> EngineResult<()> {
        let stale: Vec<&MigrationFile> = files
            .iter()
            .take_while(|f| f.version() < stop)
            .collect();
        if stale.is_empty() {
            return Ok(());
        }

        self.driver.begin().await?;
        for pair in stale {
            if cancel.is_cancelled() {
                self.driver.rollback().await?;
                return Err(EngineError::Cancelled);
            }
            events.file(FileEvent::refresh(pair.up())).await;
            if let Err(e) = self.driver.update_files(&pair.migration(Direction::Up)).await {
                rollback_quietly(self.driver.as_ref()).await;
                return Err(e.into());
            }
        }
        self.driver.commit().await?;
        Ok(())
    }
}

fn launch<Fut>(events: EventSender, task: Fut)
where
    Fut: Future<Output = EngineResult<()>> + Send + 'static,
{
    let handle = tokio::spawn(task);
    tokio::spawn(async move {
        let error = match handle.await {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e,
            Err(e) => {
                log::error!("Migration task ended abnormally: {}", e);
                EngineError::TaskFailed(e.to_string())
            }
        };
        events.error(error).await;
    });
}

pub(crate) async fn rollback_quietly(driver: &dyn Driver) {
    if let Err(e) = driver.rollback().await {
        log::warn!("Rollback failed: {}", e);
    }
}

#[cfg(test)]
#[path = "migrator_test.rs"]
mod tests;
