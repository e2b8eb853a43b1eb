//! Folder-level grouping of consecutively numbered scans.

use docmover::GroupOptions;
use docmover::error::FailureKind;
use docmover::merge::{ConsecutiveGrouper, GroupOutcome, SkipCause};
use tempfile::TempDir;

use crate::common::{file_names, read_labels, write_pdf};

#[tokio::test]
async fn test_group_merges_consecutive_pairs() {
    let temp_dir = TempDir::new().unwrap();
    let folder = temp_dir.path();
    write_pdf(&folder.join("scan_001.pdf"), &["001p1", "001p2"]);
    write_pdf(&folder.join("scan_002.pdf"), &["002p1", "002p2"]);
    write_pdf(&folder.join("scan_003.pdf"), &["003p1"]);
    write_pdf(&folder.join("scan_005.pdf"), &["005p1"]);

    let report = ConsecutiveGrouper::new()
        .run(folder, &GroupOptions::new(folder))
        .await
        .unwrap();

    assert_eq!(report.merged(), 1);
    assert_eq!(report.skipped(), 2);
    assert_eq!(
        read_labels(&folder.join("scan_001-002.pdf")),
        vec!["001p1", "002p1", "001p2", "002p2"]
    );
    // Sources are kept unless deletion is requested.
    assert!(folder.join("scan_001.pdf").exists());
}

#[tokio::test]
async fn test_group_rerun_ignores_merged_outputs() {
    let temp_dir = TempDir::new().unwrap();
    let folder = temp_dir.path();
    write_pdf(&folder.join("doc_7.pdf"), &["7"]);
    write_pdf(&folder.join("doc_8.pdf"), &["8"]);

    let grouper = ConsecutiveGrouper::new();
    grouper
        .run(folder, &GroupOptions::new(folder))
        .await
        .unwrap();
    let second = grouper
        .run(folder, &GroupOptions::new(folder))
        .await
        .unwrap();

    // The existing output blocks the pair; it is never overwritten.
    assert_eq!(second.failed(), 1);
    assert!(matches!(
        &second.outcomes[0],
        GroupOutcome::Failed {
            kind: FailureKind::OutputCollision,
            ..
        }
    ));
    assert_eq!(second.skipped(), 1);
    assert!(matches!(
        &second.outcomes[1],
        GroupOutcome::Skipped {
            reason: SkipCause::MergedRange,
            ..
        }
    ));
    assert_eq!(file_names(folder), vec!["doc_7-8.pdf", "doc_7.pdf", "doc_8.pdf"]);
}

#[tokio::test]
async fn test_group_into_separate_folder_with_deletion() {
    let temp_dir = TempDir::new().unwrap();
    let folder = temp_dir.path().join("scans");
    let dest = temp_dir.path().join("merged");
    std::fs::create_dir_all(&folder).unwrap();
    write_pdf(&folder.join("page10.pdf"), &["10"]);
    write_pdf(&folder.join("page11.pdf"), &["11"]);

    let mut options = GroupOptions::new(&dest);
    options.merge.delete_source = true;
    let report = ConsecutiveGrouper::new().run(&folder, &options).await.unwrap();

    assert_eq!(report.merged(), 1);
    assert!(file_names(&folder).is_empty());
    assert_eq!(read_labels(&dest.join("page10-11.pdf")), vec!["10", "11"]);
}

#[tokio::test]
async fn test_group_broken_pair_does_not_stop_others() {
    let temp_dir = TempDir::new().unwrap();
    let folder = temp_dir.path();
    std::fs::write(folder.join("a_1.pdf"), b"not a pdf").unwrap();
    write_pdf(&folder.join("a_2.pdf"), &["a2"]);
    write_pdf(&folder.join("b_1.pdf"), &["b1"]);
    write_pdf(&folder.join("b_2.pdf"), &["b2"]);

    let report = ConsecutiveGrouper::new()
        .run(folder, &GroupOptions::new(folder))
        .await
        .unwrap();

    assert_eq!(report.failed(), 1);
    assert_eq!(report.merged(), 1);
    assert!(folder.join("b_1-2.pdf").exists());
    assert!(!folder.join("a_1-2.pdf").exists());
}
