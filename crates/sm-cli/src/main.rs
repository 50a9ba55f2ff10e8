//! Shiftmark CLI - versioned SQL schema migrations

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::common::ExitCode;
use commands::{create, dump, migrate, version};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.global.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    colog::default_builder().filter_level(level).init();

    if let Err(err) = run(&cli).await {
        let code = match err.downcast_ref::<ExitCode>() {
            Some(ExitCode(code)) => *code,
            None => {
                eprintln!("Error: {err:#}");
                1
            }
        };
        std::process::exit(code);
    }
}

async fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Create(args) => create::execute(args, &cli.global).await,
        Commands::Version => version::execute(&cli.global).await,
        Commands::Dump(args) => dump::dump(args, &cli.global).await,
        Commands::Restore(args) => dump::restore(args, &cli.global).await,
        Commands::Revert => dump::revert(&cli.global).await,
        Commands::Rebuild => dump::rebuild(&cli.global).await,
        command => migrate::execute(command, &cli.global).await,
    }
}
