use super::*;

#[test]
fn test_compare_major_before_minor() {
    assert!(Version::new(0, 9) < Version::new(1, 1));
    assert!(Version::new(1, 2) > Version::new(1, 1));
    assert_eq!(Version::new(2, 3), Version::new(2, 3));
    assert_eq!(
        Version::new(0, 1).cmp(&Version::new(0, 2)),
        std::cmp::Ordering::Less
    );
}

#[test]
fn test_inc_minor() {
    assert_eq!(Version::new(0, 3).inc(false), Version::new(0, 4));
}

#[test]
fn test_inc_major_resets_minor() {
    assert_eq!(Version::new(0, 3).inc(true), Version::new(1, 1));
    assert_eq!(Version::ZERO.inc(true), Version::new(1, 1));
}

#[test]
fn test_inc_does_not_mutate() {
    let v = Version::new(1, 1);
    let _ = v.inc(false);
    assert_eq!(v, Version::new(1, 1));
}

#[test]
fn test_parse_legacy() {
    let v = VersionMode::Legacy.parse("12").unwrap();
    assert_eq!(v, Version::new(0, 12));
}

#[test]
fn test_parse_versioned() {
    let v = VersionMode::Versioned.parse("3/7").unwrap();
    assert_eq!(v, Version::new(3, 7));
}

#[test]
fn test_parse_errors() {
    assert!(matches!(
        VersionMode::Legacy.parse("abc"),
        Err(CoreError::VersionParse { .. })
    ));
    assert!(VersionMode::Legacy.parse("-1").is_err());
    assert!(VersionMode::Versioned.parse("7").is_err());
    assert!(VersionMode::Versioned.parse("1/2/3").is_err());
    assert!(VersionMode::Versioned.parse("x/2").is_err());
    assert!(VersionMode::Versioned.parse("1/").is_err());
}

#[test]
fn test_display_round_trips() {
    let samples = [
        (0, 0),
        (0, 1),
        (0, 42),
        (1, 1),
        (12, 9999),
        (999, 12345),
        (1234, 1),
    ];
    for (major, minor) in samples {
        let v = Version::new(major, minor);
        let rendered = v.display(VersionMode::Versioned).to_string();
        assert_eq!(VersionMode::Versioned.parse(&rendered).unwrap(), v);

        let legacy = VersionMode::Legacy.version(major, minor);
        let rendered = legacy.display(VersionMode::Legacy).to_string();
        assert_eq!(VersionMode::Legacy.parse(&rendered).unwrap(), legacy);
    }
}

#[test]
fn test_padding() {
    assert_eq!(Version::new(1, 2).major_string(), "001");
    assert_eq!(Version::new(1, 2).minor_string(), "0002");
    assert_eq!(Version::new(0, 12345).minor_string(), "00012345");
    assert_eq!(Version::new(1, 2).display(VersionMode::Versioned).to_string(), "001/0002");
    assert_eq!(Version::new(0, 2).display(VersionMode::Legacy).to_string(), "0002");
}

#[test]
fn test_legacy_mode_discards_major() {
    assert_eq!(VersionMode::Legacy.version(5, 2), Version::new(0, 2));
    assert_eq!(VersionMode::Versioned.version(5, 2), Version::new(5, 2));
}
