use super::*;
use crate::cli::Cli;
use clap::Parser;

fn global(args: &[&str]) -> GlobalArgs {
    let mut argv = vec!["sm", "version"];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).unwrap().global
}

#[test]
fn test_overrides_replace_config_values() {
    let mut config = Config::default();
    apply_overrides(
        &mut config,
        &global(&[
            "--path",
            "db/migrations",
            "--schema",
            "app",
            "--versioned",
            "--per-file",
            "--force",
        ]),
    );
    assert_eq!(config.migrations_path, "db/migrations");
    assert_eq!(config.schema, "app");
    assert_eq!(config.mode, VersionMode::Versioned);
    assert_eq!(config.transaction, TxMode::PerFile);
    assert!(config.force);
}

#[test]
fn test_no_overrides_keep_defaults() {
    let mut config = Config::default();
    apply_overrides(&mut config, &global(&[]));
    assert_eq!(config.schema, Config::default().schema);
    assert_eq!(config.mode, VersionMode::Legacy);
    assert!(!config.force);
}

#[test]
fn test_load_project_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("shiftmark.yml"),
        "migrations_path: db\ndatabase:\n  path: app.duckdb\nschema: app\n",
    )
    .unwrap();

    let project_dir = dir.path().display().to_string();
    let project = load_project(&global(&["-p", &project_dir])).unwrap();
    assert_eq!(project.config.schema, "app");
    assert_eq!(project.migrations_dir(), dir.path().join("db"));
    assert_eq!(
        project.database_path(),
        dir.path().join("app.duckdb").display().to_string()
    );
}

#[test]
fn test_load_project_rejects_empty_schema() {
    let dir = tempfile::tempdir().unwrap();
    let project_dir = dir.path().display().to_string();
    let result = load_project(&global(&["-p", &project_dir, "--schema", ""]));
    assert!(result.is_err());
}

#[test]
fn test_memory_database_is_not_resolved() {
    let project = Project {
        root: PathBuf::from("/project"),
        config: Config::default(),
    };
    assert_eq!(project.database_path(), ":memory:");
    assert_eq!(project.dump_dir(None), Path::new("/project/dump"));
    assert_eq!(project.dump_dir(Some("snap")), Path::new("/project/snap"));
}
