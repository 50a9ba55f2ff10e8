//! Dump, restore, revert and rebuild.
//!
//! A dump holds the applied scripts under `schema/` and one entry per data
//! table under `tables/`. Restoring builds the dump into the tmp slot, brings
//! it up to the on-disk scripts and rotates it over the live schema.

use crate::error::{EngineError, EngineResult};
use crate::event::{EventSender, EventStream, FileAction, FileEvent};
use crate::migrator::Migrator;
use crate::rotation::{backup_schema, tmp_schema, Rotation};
use sm_core::{
    discover, CoreError, DumpReader, DumpWriter, MigrationFiles, Version, SCHEMA_DIR, TABLES_DIR,
};
use sm_db::DumpDriver;
use std::io::Write;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

impl Migrator {
    /// Write the applied scripts and every data table to `writer`.
    pub fn dump(&self, writer: Box<dyn DumpWriter>) -> EventStream {
        self.spawn(move |m, events, cancel| async move {
            m.run_dump(&events, &cancel, writer).await
        })
    }

    /// Replace the live schema with the contents of a dump. The previous
    /// live schema is kept as the backup.
    pub fn restore(&self, reader: Arc<dyn DumpReader>) -> EventStream {
        self.spawn(move |m, events, cancel| async move {
            m.run_restore(&events, &cancel, reader.as_ref()).await
        })
    }

    /// Bring the backup up to date and swap it with the live schema.
    pub fn revert(&self) -> EventStream {
        self.spawn(|m, events, cancel| async move { m.run_revert(&events, &cancel).await })
    }

    /// Build a fresh schema from the on-disk scripts and swap it in. The
    /// previous live schema is kept as the backup.
    pub fn rebuild(&self) -> EventStream {
        self.spawn(|m, events, cancel| async move { m.run_rebuild(&events, &cancel).await })
    }

    fn dump_driver(&self) -> EngineResult<&dyn DumpDriver> {
        self.driver()
            .as_dump()
            .ok_or_else(|| EngineError::DumpNotSupported {
                backend: self.driver().db_type().to_string(),
            })
    }

    async fn run_dump(
        &self,
        events: &EventSender,
        cancel: &CancellationToken,
        mut writer: Box<dyn DumpWriter>,
    ) -> EngineResult<()> {
        let dump = self.dump_driver()?;
        self.driver().ensure_version_table(self.schema()).await?;
        let applied = self.driver().get_migration_files(self.mode()).await?;
        events
            .status(format!(
                "Dumping {} at version {}",
                self.schema(),
                applied.last_version().display(self.mode())
            ))
            .await;

        for mut pair in applied.into_vec() {
            check_cancelled(cancel)?;
            pair.write_contents(writer.as_mut(), SCHEMA_DIR, self.mode(), true)?;
            for file in [pair.up(), pair.down()] {
                let name = format!("{SCHEMA_DIR}/{}", file.file_name());
                events.file(FileEvent::table(name, FileAction::Dumped)).await;
            }
        }

        for table in dump.list_tables(self.schema()).await? {
            check_cancelled(cancel)?;
            let mut data = Vec::new();
            dump.dump_table(self.schema(), &table, &mut data).await?;
            {
                let mut sink = writer.writer(TABLES_DIR, &table)?;
                sink.write_all(&data).map_err(CoreError::from)?;
                sink.flush().map_err(CoreError::from)?;
            }
            events
                .file(FileEvent::table(
                    format!("{TABLES_DIR}/{table}"),
                    FileAction::Dumped,
                ))
                .await;
        }

        writer.close()?;
        log::info!("Dumped schema {}", self.schema());
        Ok(())
    }

    async fn run_restore(
        &self,
        events: &EventSender,
        cancel: &CancellationToken,
        reader: &dyn DumpReader,
    ) -> EngineResult<()> {
        let dump = self.dump_driver()?;
        let tmp = tmp_schema(self.schema());
        events.status(format!("Restoring dump into {tmp}")).await;

        let scripts = discover(
            self.mode(),
            reader.files(SCHEMA_DIR)?,
            self.driver().filename_extension(),
        )?;
        if scripts.is_empty() {
            return Err(EngineError::MissingDumpContent(format!(
                "migration scripts in {SCHEMA_DIR}/"
            )));
        }

        dump.drop_schema(&tmp).await?;
        dump.ensure_schema(&tmp).await?;
        let staged = self.for_schema(&tmp);
        self.driver().ensure_version_table(&tmp).await?;

        let empty = MigrationFiles::empty(self.mode());
        let plan = scripts.to_last_from(Version::ZERO);
        staged
            .migrate_files(events, cancel, &empty, &scripts, plan)
            .await?;

        dump.truncate_tables(&tmp).await?;
        for table in reader.files(TABLES_DIR)? {
            check_cancelled(cancel)?;
            let data = table.read_all()?;
            dump.restore_table(&tmp, table.name(), &data).await?;
            events
                .file(FileEvent::table(
                    format!("{TABLES_DIR}/{}", table.name()),
                    FileAction::Restored,
                ))
                .await;
        }

        staged.run_between(events, cancel).await?;
        self.cut_over(dump, events, cancel, Rotation::restore(self.schema()))
            .await
    }

    async fn run_revert(
        &self,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> EngineResult<()> {
        let dump = self.dump_driver()?;
        let backup = backup_schema(self.schema());
        if !dump.schema_exists(&backup).await? {
            return Err(EngineError::NoBackup { schema: backup });
        }

        events.status(format!("Reverting {} to {backup}", self.schema())).await;
        self.for_schema(&backup).run_between(events, cancel).await?;
        self.cut_over(dump, events, cancel, Rotation::revert(self.schema()))
            .await
    }

    async fn run_rebuild(
        &self,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> EngineResult<()> {
        let dump = self.dump_driver()?;
        let tmp = tmp_schema(self.schema());
        events.status(format!("Rebuilding {} in {tmp}", self.schema())).await;

        dump.drop_schema(&tmp).await?;
        dump.ensure_schema(&tmp).await?;
        self.for_schema(&tmp).run_between(events, cancel).await?;
        self.cut_over(dump, events, cancel, Rotation::restore(self.schema()))
            .await
    }

    /// Make sure the live slot exists, then run the rotation. Rotation is
    /// not interrupted once started.
    async fn cut_over(
        &self,
        dump: &dyn DumpDriver,
        events: &EventSender,
        cancel: &CancellationToken,
        rotation: Rotation,
    ) -> EngineResult<()> {
        check_cancelled(cancel)?;
        dump.ensure_schema(self.schema()).await?;
        rotation.run(self.driver().as_ref(), dump, events).await?;
        self.driver().ensure_version_table(self.schema()).await?;
        events
            .status(format!("Schema {} rotated", self.schema()))
            .await;
        Ok(())
    }
}

fn check_cancelled(cancel: &CancellationToken) -> EngineResult<()> {
    if cancel.is_cancelled() {
        return Err(EngineError::Cancelled);
    }
    Ok(())
}

#[cfg(test)]
#[path = "dump_test.rs"]
mod tests;
