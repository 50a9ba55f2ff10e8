use super::*;
use crate::dump::{DirReader, DirWriter, DumpReader};

fn pair(major: u64, minor: u64, up: &str, down: &str) -> MigrationFile {
    let version = Version::new(major, minor);
    let base = format!("{}_m{}", version.minor_string(), minor);
    MigrationFile::new(
        version,
        File::new(format!("{base}.up.sql"), version, format!("m{minor}"), Direction::Up)
            .with_content(up),
        File::new(format!("{base}.down.sql"), version, format!("m{minor}"), Direction::Down)
            .with_content(down),
    )
}

#[test]
fn test_new_sorts_ascending() {
    let files = MigrationFiles::new(
        VersionMode::Versioned,
        vec![pair(1, 1, "c", "c"), pair(0, 2, "b", "b"), pair(0, 1, "a", "a")],
    )
    .unwrap();
    assert_eq!(
        files.versions(),
        vec![Version::new(0, 1), Version::new(0, 2), Version::new(1, 1)]
    );
    assert_eq!(files.last_version(), Version::new(1, 1));
}

#[test]
fn test_new_rejects_duplicate_versions() {
    let err = MigrationFiles::new(
        VersionMode::Legacy,
        vec![pair(0, 1, "a", "a"), pair(0, 1, "b", "b")],
    )
    .unwrap_err();
    assert!(matches!(err, CoreError::DuplicateVersion { .. }));
}

#[test]
fn test_empty_last_version_is_zero() {
    assert_eq!(MigrationFiles::empty(VersionMode::Legacy).last_version(), Version::ZERO);
}

#[test]
fn test_migration_picks_file_by_direction() {
    let mf = pair(0, 3, "CREATE TABLE t3 (id INT);", "DROP TABLE t3;");
    let up = mf.migration(Direction::Up);
    let down = mf.migration(Direction::Down);

    assert!(up.is_up());
    assert_eq!(up.file().file_name(), "0003_m3.up.sql");
    assert!(!down.is_up());
    assert_eq!(down.file().file_name(), "0003_m3.down.sql");
    assert_eq!(down.version(), Version::new(0, 3));
}

#[test]
fn test_prefix() {
    let files = MigrationFiles::new(
        VersionMode::Legacy,
        vec![pair(0, 1, "a", "a"), pair(0, 2, "b", "b")],
    )
    .unwrap();
    assert_eq!(files.prefix(1).versions(), vec![Version::new(0, 1)]);
    assert_eq!(files.prefix(5).len(), 2);
}

#[test]
fn test_write_files_versioned_layout() {
    let dir = tempfile::tempdir().unwrap();
    let mut mf = pair(1, 2, "up", "down");
    mf.write_files(dir.path(), VersionMode::Versioned).unwrap();

    let up = std::fs::read_to_string(dir.path().join("001/0002_m2.up.sql")).unwrap();
    let down = std::fs::read_to_string(dir.path().join("001/0002_m2.down.sql")).unwrap();
    assert_eq!(up, "up");
    assert_eq!(down, "down");
}

#[test]
fn test_write_contents_releases_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let mut writer = DirWriter::new(dir.path());
    let mut mf = pair(0, 1, "CREATE TABLE t (id INT);", "DROP TABLE t;");

    mf.write_contents(&mut writer, "schema", VersionMode::Legacy, true)
        .unwrap();

    assert!(!mf.up().is_loaded());
    let openers = DirReader::new(dir.path()).files("schema").unwrap();
    let mut names: Vec<&str> = openers.iter().map(|o| o.name()).collect();
    names.sort();
    assert_eq!(names, vec!["0001_m1.down.sql", "0001_m1.up.sql"]);
}
