//! Dump, restore, revert and rebuild commands

use anyhow::Result;
use sm_core::{DirReader, DirWriter};
use std::sync::Arc;

use crate::cli::{DumpArgs, GlobalArgs};
use crate::commands::common::{build_migrator, load_project, report};

/// Execute the dump command
pub async fn dump(args: &DumpArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let migrator = build_migrator(&project)?;
    let dir = project.dump_dir(args.dir.as_deref());
    if !sm_core::is_empty_dir(&dir)? {
        anyhow::bail!("Dump directory {} is not empty", dir.display());
    }

    println!("Dumping {} to {}", project.config.schema, dir.display());
    report(migrator.dump(Box::new(DirWriter::new(&dir))), global).await
}

/// Execute the restore command
pub async fn restore(args: &DumpArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let migrator = build_migrator(&project)?;
    let dir = project.dump_dir(args.dir.as_deref());
    if !dir.is_dir() {
        anyhow::bail!("Dump directory {} does not exist", dir.display());
    }

    println!("Restoring {} from {}", project.config.schema, dir.display());
    report(migrator.restore(Arc::new(DirReader::new(&dir))), global).await
}

/// Execute the revert command
pub async fn revert(global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let migrator = build_migrator(&project)?;
    report(migrator.revert(), global).await
}

/// Execute the rebuild command
pub async fn rebuild(global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let migrator = build_migrator(&project)?;
    report(migrator.rebuild(), global).await
}
