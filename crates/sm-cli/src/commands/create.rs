//! Create command implementation

use anyhow::{Context, Result};

use crate::cli::{CreateArgs, GlobalArgs};
use crate::commands::common::{build_migrator, load_project};

/// Execute the create command
pub async fn execute(args: &CreateArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let migrator = build_migrator(&project)?;

    let pair = migrator
        .create(
            args.major,
            &args.name,
            args.up.as_deref(),
            args.down.as_deref(),
        )
        .context("Failed to create migration")?;

    let dir = project
        .migrations_dir()
        .join(pair.up().relative_dir(migrator.mode()));
    println!(
        "Created version {}",
        pair.version().display(migrator.mode())
    );
    for file in [pair.up(), pair.down()] {
        println!("  {}", dir.join(file.file_name()).display());
    }
    Ok(())
}
