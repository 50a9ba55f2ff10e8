use super::*;
use crate::test_support::{migrator, write_pair, MockDriver};
use sm_core::{DirReader, DirWriter};
use tempfile::TempDir;

struct Fixture {
    migrations: TempDir,
    dump_dir: TempDir,
    driver: Arc<MockDriver>,
    migrator: Migrator,
}

async fn fixture() -> Fixture {
    let migrations = tempfile::tempdir().unwrap();
    write_pair(
        migrations.path(),
        1,
        "users",
        "CREATE TABLE users;",
        "DROP TABLE users;",
    );
    write_pair(
        migrations.path(),
        2,
        "orders",
        "CREATE TABLE orders;",
        "DROP TABLE orders;",
    );
    let driver = Arc::new(MockDriver::new());
    let migrator = migrator(&driver, migrations.path());
    let errors = migrator.up().errors().await;
    assert!(errors.is_empty(), "{errors:?}");
    driver.put_table("main", "users", b"id,name\n1,alice\n");

    Fixture {
        migrations,
        dump_dir: tempfile::tempdir().unwrap(),
        driver,
        migrator,
    }
}

async fn dumped() -> Fixture {
    let f = fixture().await;
    let errors = f
        .migrator
        .dump(Box::new(DirWriter::new(f.dump_dir.path())))
        .errors()
        .await;
    assert!(errors.is_empty(), "{errors:?}");
    f
}

fn reader(dir: &TempDir) -> Arc<dyn DumpReader> {
    Arc::new(DirReader::new(dir.path()))
}

#[tokio::test]
async fn test_dump_writes_scripts_and_tables() {
    let f = dumped().await;
    let root = f.dump_dir.path();

    assert_eq!(
        std::fs::read_to_string(root.join("schema/0001_users.up.sql")).unwrap(),
        "CREATE TABLE users;"
    );
    assert_eq!(
        std::fs::read_to_string(root.join("schema/0002_orders.down.sql")).unwrap(),
        "DROP TABLE orders;"
    );
    assert_eq!(
        std::fs::read(root.join("tables/users")).unwrap(),
        b"id,name\n1,alice\n"
    );
    assert!(std::fs::read(root.join("tables/orders")).unwrap().is_empty());
}

#[tokio::test]
async fn test_dump_requires_capability() {
    let dir = tempfile::tempdir().unwrap();
    let driver = Arc::new(MockDriver::without_dump());
    let m = migrator(&driver, dir.path());
    let errors = m.dump(Box::new(DirWriter::new(dir.path()))).errors().await;
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], EngineError::DumpNotSupported { .. }));
}

#[tokio::test]
async fn test_restore_replaces_live_and_keeps_backup() {
    let f = dumped().await;
    f.driver.put_table("main", "users", b"id,name\n2,bob\n");

    let errors = f.migrator.restore(reader(&f.dump_dir)).errors().await;
    assert!(errors.is_empty(), "{errors:?}");

    assert_eq!(f.driver.schema_names(), vec!["main", "main_bak"]);
    assert_eq!(
        f.driver.table_data("main", "users").unwrap(),
        b"id,name\n1,alice\n"
    );
    assert_eq!(
        f.driver.table_data("main_bak", "users").unwrap(),
        b"id,name\n2,bob\n"
    );
    assert_eq!(
        f.driver.recorded_versions("main"),
        vec![Version::new(0, 1), Version::new(0, 2)]
    );
    assert_eq!(f.migrator.version().await.unwrap(), Version::new(0, 2));
}

#[tokio::test]
async fn test_restore_brings_dump_up_to_disk_scripts() {
    let f = dumped().await;
    write_pair(
        f.migrations.path(),
        3,
        "items",
        "CREATE TABLE items;",
        "DROP TABLE items;",
    );

    let errors = f.migrator.restore(reader(&f.dump_dir)).errors().await;
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(f.driver.recorded_versions("main").len(), 3);
    assert_eq!(f.driver.table_names("main"), vec!["items", "orders", "users"]);
    // The backup still reflects the schema before the restore.
    assert_eq!(f.driver.recorded_versions("main_bak").len(), 2);
}

#[tokio::test]
async fn test_restore_from_empty_dump() {
    let f = fixture().await;
    let errors = f.migrator.restore(reader(&f.dump_dir)).errors().await;
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], EngineError::MissingDumpContent(_)));
    assert_eq!(f.driver.schema_names(), vec!["main"]);
}

#[tokio::test]
async fn test_revert_swaps_backup_back_in() {
    let f = dumped().await;
    f.driver.put_table("main", "users", b"id,name\n2,bob\n");
    assert!(f
        .migrator
        .restore(reader(&f.dump_dir))
        .errors()
        .await
        .is_empty());

    let errors = f.migrator.revert().errors().await;
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(
        f.driver.table_data("main", "users").unwrap(),
        b"id,name\n2,bob\n"
    );
    assert_eq!(
        f.driver.table_data("main_bak", "users").unwrap(),
        b"id,name\n1,alice\n"
    );
    assert!(!f.driver.schema_names().contains(&"main_tmp".to_string()));
}

#[tokio::test]
async fn test_revert_without_backup() {
    let f = fixture().await;
    let errors = f.migrator.revert().errors().await;
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], EngineError::NoBackup { ref schema } if schema == "main_bak"));
}

#[tokio::test]
async fn test_rebuild_starts_from_scripts() {
    let f = fixture().await;
    let errors = f.migrator.rebuild().errors().await;
    assert!(errors.is_empty(), "{errors:?}");

    assert_eq!(f.driver.table_data("main", "users").unwrap(), b"");
    assert_eq!(
        f.driver.table_data("main_bak", "users").unwrap(),
        b"id,name\n1,alice\n"
    );
    assert_eq!(f.driver.recorded_versions("main").len(), 2);
}

#[tokio::test]
async fn test_failed_rotation_keeps_live_schema() {
    let f = dumped().await;
    f.driver.put_table("main", "users", b"id,name\n2,bob\n");
    f.driver.fail_rename_to("main");

    let errors = f.migrator.restore(reader(&f.dump_dir)).errors().await;
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], EngineError::RotationFailed { .. }));
    assert_eq!(
        f.driver.table_data("main", "users").unwrap(),
        b"id,name\n2,bob\n"
    );
    assert!(!f.driver.schema_names().contains(&"main_bak".to_string()));
}
