//! Migration commands: up, down, redo, reset, goto, migrate and between

use anyhow::{Context, Result};

use crate::cli::{Commands, GlobalArgs};
use crate::commands::common::{build_migrator, load_project, report};

/// Execute a migration command
pub async fn execute(command: &Commands, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let migrator = build_migrator(&project)?;
    let mode = migrator.mode();

    let stream = match command {
        Commands::Up => migrator.up(),
        Commands::Down => migrator.down(),
        Commands::Redo => migrator.redo(),
        Commands::Reset => migrator.reset(),
        Commands::Between => migrator.between(),
        Commands::Migrate(args) => migrator.migrate(args.steps),
        Commands::Goto(args) => {
            let target = mode
                .parse(&args.version)
                .with_context(|| format!("Invalid target version '{}'", args.version))?;
            migrator.goto(target)
        }
        other => anyhow::bail!("{other:?} is not a migration command"),
    };

    let result = report(stream, global).await;
    match migrator.version().await {
        Ok(version) => println!("Database at version {}", version.display(mode)),
        Err(e) => log::warn!("Could not read database version: {}", e),
    }
    result
}
