use super::*;
use crate::test_support::MockDriver;

fn versions() -> Vec<Version> {
    vec![
        Version::new(1, 1),
        Version::new(1, 2),
        Version::new(2, 1),
        Version::new(2, 2),
    ]
}

async fn run_group(driver: &MockDriver, mode: TxMode) -> usize {
    let mut group = TransactionGroup::new(driver, mode);
    for version in versions() {
        group.prepare(version).await.unwrap();
        assert!(group.is_open());
        group.applied(version);
    }
    group.finish().await.unwrap()
}

#[tokio::test]
async fn test_per_major_commits_once_per_major() {
    let driver = MockDriver::new();
    let commits = run_group(&driver, TxMode::PerMajorVersion).await;
    assert_eq!(commits, 2);
    assert_eq!(driver.begins(), 2);
    assert_eq!(driver.commits(), 2);
    assert!(!driver.in_transaction());
}

#[tokio::test]
async fn test_per_file_commits_every_migration() {
    let driver = MockDriver::new();
    let commits = run_group(&driver, TxMode::PerFile).await;
    assert_eq!(commits, 4);
    assert_eq!(driver.begins(), 4);
    assert_eq!(driver.commits(), 4);
}

#[tokio::test]
async fn test_single_major_is_one_transaction() {
    let driver = MockDriver::new();
    let mut group = TransactionGroup::new(&driver, TxMode::PerMajorVersion);
    for minor in 1..=3 {
        let version = Version::new(0, minor);
        group.prepare(version).await.unwrap();
        group.applied(version);
    }
    assert_eq!(group.commits(), 0);
    assert_eq!(group.finish().await.unwrap(), 1);
}

#[tokio::test]
async fn test_rollback_closes_the_group() {
    let driver = MockDriver::new();
    let mut group = TransactionGroup::new(&driver, TxMode::PerMajorVersion);
    group.prepare(Version::new(0, 1)).await.unwrap();
    group.applied(Version::new(0, 1));

    group.rollback().await.unwrap();
    assert!(!group.is_open());
    assert_eq!(driver.rollbacks(), 1);

    // Nothing left to commit after a rollback.
    assert_eq!(group.finish().await.unwrap(), 0);
    assert_eq!(driver.commits(), 0);
}

#[tokio::test]
async fn test_empty_group_commits_nothing() {
    let driver = MockDriver::new();
    let group = TransactionGroup::new(&driver, TxMode::PerFile);
    assert_eq!(group.finish().await.unwrap(), 0);
    assert_eq!(driver.begins(), 0);
}
