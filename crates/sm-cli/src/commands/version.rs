//! Version command implementation

use anyhow::{Context, Result};

use crate::cli::GlobalArgs;
use crate::commands::common::{build_migrator, load_project};

/// Execute the version command
pub async fn execute(global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let migrator = build_migrator(&project)?;
    let version = migrator
        .version()
        .await
        .context("Failed to read database version")?;
    println!("{}", version.display(migrator.mode()));
    Ok(())
}
