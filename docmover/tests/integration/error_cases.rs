//! Configuration and input errors.

use docmover::mover::{DocumentMover, RunLock};
use docmover::{DocMoverError, GroupOptions, MoverConfig};
use docmover::merge::ConsecutiveGrouper;
use rstest::rstest;
use tempfile::TempDir;

use crate::common::Staging;

#[tokio::test]
async fn test_missing_source_directory() {
    let staging = Staging::new();
    let mut config = staging.config();
    config.source_dir = staging.incoming.join("nope");

    let err = DocumentMover::new(config).run().await.unwrap_err();
    assert!(matches!(err, DocMoverError::InvalidConfig { .. }));
    assert_eq!(err.exit_code(), 1);
}

#[tokio::test]
async fn test_source_equal_to_destination_is_rejected() {
    let staging = Staging::new();
    let config = MoverConfig::new(&staging.incoming, &staging.incoming);

    let result = DocumentMover::new(config).run().await;
    assert!(matches!(result, Err(DocMoverError::InvalidConfig { .. })));
}

#[rstest]
#[case(Vec::new())]
#[case(vec![String::new()])]
#[tokio::test]
async fn test_empty_file_types_rejected(#[case] file_types: Vec<String>) {
    let staging = Staging::new();
    let mut config = staging.config();
    config.file_types = docmover::config::normalize_file_types(file_types);

    let result = DocumentMover::new(config).run().await;
    assert!(matches!(result, Err(DocMoverError::InvalidConfig { .. })));
}

#[tokio::test]
async fn test_group_on_missing_folder() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("missing");

    let result = ConsecutiveGrouper::new()
        .run(&missing, &GroupOptions::new(&missing))
        .await;
    assert!(result.is_err());
}

#[test]
fn test_second_run_lock_is_refused() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("docmover.lock");

    let _held = RunLock::acquire(&path).unwrap();
    let err = RunLock::acquire(&path).unwrap_err();
    assert!(matches!(err, DocMoverError::LockHeld { .. }));
    assert_eq!(err.exit_code(), 0);
}
