//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand};

/// Shiftmark - versioned SQL schema migrations
#[derive(Parser, Debug)]
#[command(name = "sm")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Override the migrations directory
    #[arg(long, global = true)]
    pub path: Option<String>,

    /// Override the database file (or :memory:)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Override the schema migrations are applied to
    #[arg(short, long, global = true)]
    pub schema: Option<String>,

    /// Read versions as <major>/<minor>
    #[arg(long, global = true)]
    pub versioned: bool,

    /// Commit after every migration instead of every major version
    #[arg(long, global = true)]
    pub per_file: bool,

    /// Skip the check that applied scripts are unchanged on disk
    #[arg(short, long, global = true)]
    pub force: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new migration pair
    Create(CreateArgs),

    /// Apply every pending migration
    Up,

    /// Undo every applied migration
    Down,

    /// Undo and reapply the last migration
    Redo,

    /// Undo everything, then apply everything
    Reset,

    /// Migrate up or down to a version
    Goto(GotoArgs),

    /// Move a number of steps (negative to go back)
    Migrate(MigrateArgs),

    /// Reconcile the database with the migrations on disk
    Between,

    /// Print the current database version
    Version,

    /// Dump applied scripts and table data
    Dump(DumpArgs),

    /// Restore a dump, keeping the current schema as backup
    Restore(DumpArgs),

    /// Swap the backup schema back in
    Revert,

    /// Rebuild the schema from the migrations on disk, keeping the current
    /// schema as backup
    Rebuild,
}

/// Arguments for the create command
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Migration name (spaces become underscores)
    pub name: String,

    /// Start a new major version
    #[arg(long)]
    pub major: bool,

    /// Initial content of the up script
    #[arg(long)]
    pub up: Option<String>,

    /// Initial content of the down script
    #[arg(long)]
    pub down: Option<String>,
}

/// Arguments for the goto command
#[derive(Args, Debug)]
pub struct GotoArgs {
    /// Target version (`3`, or `1/2` when versioned); 0 undoes everything
    pub version: String,
}

/// Arguments for the migrate command
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Steps to move; negative values go back
    #[arg(allow_hyphen_values = true)]
    pub steps: i64,
}

/// Arguments for dump and restore
#[derive(Args, Debug)]
pub struct DumpArgs {
    /// Dump directory (default: dump_dir from config)
    #[arg(long)]
    pub dir: Option<String>,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
