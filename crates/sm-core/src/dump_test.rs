use super::*;

#[test]
fn test_dir_writer_then_reader() {
    let dir = tempfile::tempdir().unwrap();
    let mut writer = DirWriter::new(dir.path());
    {
        let mut w = writer.writer("tables", "users").unwrap();
        w.write_all(b"1,alice\n2,bob\n").unwrap();
    }
    {
        let mut w = writer.writer("schema/001", "0001_init.up.sql").unwrap();
        w.write_all(b"CREATE TABLE users (id INT);").unwrap();
    }
    writer.close().unwrap();

    let reader = DirReader::new(dir.path());
    let tables = reader.files(TABLES_DIR).unwrap();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].name(), "users");
    assert_eq!(tables[0].read_all().unwrap(), b"1,alice\n2,bob\n");

    let schema = reader.files(SCHEMA_DIR).unwrap();
    assert_eq!(schema.len(), 1);
    assert_eq!(schema[0].name(), "001/0001_init.up.sql");
}

#[test]
fn test_reader_missing_dir_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let reader = DirReader::new(dir.path());
    assert!(reader.files("nope").unwrap().is_empty());
}

#[test]
fn test_is_empty_dir() {
    let dir = tempfile::tempdir().unwrap();
    assert!(is_empty_dir(dir.path()).unwrap());
    assert!(is_empty_dir(&dir.path().join("missing")).unwrap());
    std::fs::write(dir.path().join("x"), "1").unwrap();
    assert!(!is_empty_dir(dir.path()).unwrap());
}
