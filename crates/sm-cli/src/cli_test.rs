use super::*;
use clap::CommandFactory;

#[test]
fn verify_cli_args() {
    // Validates the entire command tree: short flag conflicts,
    // duplicate args, and other clap definition errors.
    Cli::command().debug_assert();
}

#[test]
fn test_negative_steps() {
    let cli = Cli::try_parse_from(["sm", "migrate", "-2"]).unwrap();
    match cli.command {
        Commands::Migrate(args) => assert_eq!(args.steps, -2),
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn test_global_overrides_after_subcommand() {
    let cli = Cli::try_parse_from([
        "sm",
        "up",
        "--schema",
        "app",
        "--per-file",
        "--versioned",
        "--database",
        "dev.duckdb",
    ])
    .unwrap();
    assert!(matches!(cli.command, Commands::Up));
    assert_eq!(cli.global.schema.as_deref(), Some("app"));
    assert_eq!(cli.global.database.as_deref(), Some("dev.duckdb"));
    assert!(cli.global.per_file);
    assert!(cli.global.versioned);
    assert!(!cli.global.force);
}

#[test]
fn test_create_args() {
    let cli = Cli::try_parse_from([
        "sm",
        "create",
        "add users",
        "--major",
        "--up",
        "CREATE TABLE users (id INTEGER);",
    ])
    .unwrap();
    match cli.command {
        Commands::Create(args) => {
            assert_eq!(args.name, "add users");
            assert!(args.major);
            assert_eq!(args.up.as_deref(), Some("CREATE TABLE users (id INTEGER);"));
            assert!(args.down.is_none());
        }
        other => panic!("unexpected command {other:?}"),
    }
}
