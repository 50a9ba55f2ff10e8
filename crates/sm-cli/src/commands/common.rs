//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use sm_core::{Config, TxMode, VersionMode};
use sm_db::{Driver, DuckDbDriver};
use sm_engine::{Event, EventStream, Migrator};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::cli::GlobalArgs;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and cleanup happens properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; never shown to the user.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Loaded configuration and the directory relative paths resolve against.
#[derive(Debug, Clone)]
pub(crate) struct Project {
    pub(crate) root: PathBuf,
    pub(crate) config: Config,
}

impl Project {
    pub(crate) fn migrations_dir(&self) -> PathBuf {
        self.config.migrations_path_absolute(&self.root)
    }

    pub(crate) fn dump_dir(&self, override_dir: Option<&str>) -> PathBuf {
        match override_dir {
            Some(dir) => self.root.join(dir),
            None => self.config.dump_dir_absolute(&self.root),
        }
    }

    /// Database location: `:memory:` as is, anything else relative to root.
    pub(crate) fn database_path(&self) -> String {
        let path = &self.config.database.path;
        if path == ":memory:" || Path::new(path).is_absolute() {
            path.clone()
        } else {
            self.root.join(path).display().to_string()
        }
    }
}

/// Load the project configuration and apply command line overrides.
pub(crate) fn load_project(global: &GlobalArgs) -> Result<Project> {
    let root = PathBuf::from(&global.project_dir);
    let mut config = match &global.config {
        Some(path) => Config::load(Path::new(path))
            .with_context(|| format!("Failed to load config from {path}"))?,
        None => Config::load_or_default(&root).context("Failed to load config")?,
    };
    apply_overrides(&mut config, global);
    config.validate().context("Invalid configuration")?;
    Ok(Project { root, config })
}

pub(crate) fn apply_overrides(config: &mut Config, global: &GlobalArgs) {
    if let Some(path) = &global.path {
        config.migrations_path = path.clone();
    }
    if let Some(database) = &global.database {
        config.database.path = database.clone();
    }
    if let Some(schema) = &global.schema {
        config.schema = schema.clone();
    }
    if global.versioned {
        config.mode = VersionMode::Versioned;
    }
    if global.per_file {
        config.transaction = TxMode::PerFile;
    }
    if global.force {
        config.force = true;
    }
}

/// Open the database and build a migrator for the project.
///
/// When interrupts are enabled, Ctrl-C cancels the running operation.
pub(crate) fn build_migrator(project: &Project) -> Result<Migrator> {
    let database = project.database_path();
    let driver = DuckDbDriver::new(&database, &project.config.version_table)
        .with_context(|| format!("Failed to open database {database}"))?;
    log::debug!("Opened {} database {}", driver.db_type(), database);

    let driver: Arc<dyn Driver> = Arc::new(driver);
    let migrator = Migrator::from_config(driver, &project.config, &project.root);
    if project.config.interrupts {
        Ok(migrator.with_cancellation(interrupt_token()))
    } else {
        Ok(migrator)
    }
}

/// A token cancelled on the first Ctrl-C.
fn interrupt_token() -> CancellationToken {
    let token = CancellationToken::new();
    let cancel = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Interrupted, rolling back the open transaction...");
            cancel.cancel();
        }
    });
    token
}

/// Print an operation's events as they arrive. Fails with exit code 1 if
/// any error was reported.
pub(crate) async fn report(mut stream: EventStream, global: &GlobalArgs) -> Result<()> {
    let mut failed = 0;
    while let Some(event) = stream.next().await {
        match event {
            Event::Status(message) => {
                if global.verbose {
                    println!("{message}");
                }
            }
            Event::File(file) => println!("  {file}"),
            Event::Error(err) => {
                failed += 1;
                eprintln!("Error: {err}");
            }
        }
    }
    if failed > 0 {
        return Err(ExitCode(1).into());
    }
    Ok(())
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
