//! Full mover runs over a staging directory.

use docmover::error::FailureKind;
use docmover::mover::{DocumentMover, MoveStatus, SkipReason};
use std::sync::Arc;
use std::time::Duration;

use crate::common::{Staging, TruncatingFileSystem, backdate, file_names, read_labels};

#[tokio::test]
async fn test_mixed_batch() {
    let staging = Staging::new();
    std::fs::write(staging.incoming.join("receipt.jpg"), b"jpeg").unwrap();
    std::fs::write(staging.incoming.join("letter.pdf"), b"%PDF-1.4").unwrap();
    std::fs::write(staging.incoming.join("notes.txt"), b"ignored").unwrap();
    staging.scan("double-sided_front_tax.pdf", &["T1", "T3"]);
    staging.scan("double-sided_back_tax.pdf", &["T2", "T4"]);

    let report = DocumentMover::new(staging.config()).run().await.unwrap();

    assert_eq!(report.moved(), 3);
    assert_eq!(report.failed(), 0);
    assert_eq!(file_names(&staging.archive), vec!["letter.pdf", "receipt.jpg"]);
    assert_eq!(file_names(&staging.duplex), vec!["double-sided_tax_merged.pdf"]);
    assert_eq!(
        read_labels(&staging.duplex.join("double-sided_tax_merged.pdf")),
        vec!["T1", "T2", "T3", "T4"]
    );
    assert_eq!(file_names(&staging.incoming), vec!["notes.txt"]);
}

#[tokio::test]
async fn test_numbered_dual_side_pair() {
    let staging = Staging::new();
    staging.scan("double-sided_0041.pdf", &["odd1", "odd2"]);
    staging.scan("double-sided_0042.pdf", &["even1", "even2"]);

    let mut config = staging.config();
    config.reverse_back_side = true;
    DocumentMover::new(config).run().await.unwrap();

    assert_eq!(
        read_labels(&staging.duplex.join("double-sided_0041_0042_merged.pdf")),
        vec!["odd1", "even2", "odd2", "even1"]
    );
}

#[tokio::test]
async fn test_lone_side_waits_then_moves_alone() {
    let staging = Staging::new();
    let lone = staging.scan("double-sided_front_memo.pdf", &["M1"]);

    let report = DocumentMover::new(staging.config()).run().await.unwrap();
    assert!(matches!(
        report.outcome_for(&lone).unwrap().status,
        MoveStatus::Skipped {
            reason: SkipReason::PairingPending
        }
    ));

    backdate(&lone, Duration::from_secs(15 * 60));
    let report = DocumentMover::new(staging.config()).run().await.unwrap();

    assert_eq!(report.moved(), 1);
    assert_eq!(file_names(&staging.archive), vec!["double-sided_front_memo.pdf"]);
    assert!(file_names(&staging.duplex).is_empty());
}

#[tokio::test]
async fn test_old_side_is_merged_once_late_partner_settles() {
    let staging = Staging::new();
    let front = staging.scan("double-sided_front_lease.pdf", &["L1", "L3"]);
    backdate(&front, Duration::from_secs(20 * 60));
    let back = staging.scan("double-sided_back_lease.pdf", &["L2", "L4"]);

    let mut config = staging.config();
    config.stability_wait = Duration::from_millis(200);
    let report = DocumentMover::new(config.clone()).run().await.unwrap();

    assert_eq!(report.moved(), 0);
    assert!(matches!(
        report.outcome_for(&front).unwrap().status,
        MoveStatus::Skipped {
            reason: SkipReason::PairingPending
        }
    ));
    assert!(file_names(&staging.archive).is_empty());

    backdate(&back, Duration::from_secs(60));
    let report = DocumentMover::new(config).run().await.unwrap();

    assert_eq!(report.moved(), 1);
    assert!(file_names(&staging.archive).is_empty());
    assert_eq!(
        read_labels(&staging.duplex.join("double-sided_lease_merged.pdf")),
        vec!["L1", "L2", "L3", "L4"]
    );
}

#[tokio::test]
async fn test_stability_wait_defers_fresh_files() {
    let staging = Staging::new();
    let fresh = staging.incoming.join("fresh.pdf");
    let settled = staging.incoming.join("settled.pdf");
    std::fs::write(&fresh, b"new").unwrap();
    std::fs::write(&settled, b"old").unwrap();
    backdate(&settled, Duration::from_secs(120));

    let mut config = staging.config();
    config.stability_wait = Duration::from_millis(200);
    let report = DocumentMover::new(config).run().await.unwrap();

    assert!(matches!(
        report.outcome_for(&fresh).unwrap().status,
        MoveStatus::Skipped {
            reason: SkipReason::Deferred
        }
    ));
    assert_eq!(file_names(&staging.archive), vec!["settled.pdf"]);
}

#[tokio::test]
async fn test_short_cross_device_copy_keeps_both_files() {
    let staging = Staging::new();
    let source = staging.incoming.join("contract.pdf");
    std::fs::write(&source, b"0123456789abcdef").unwrap();

    let report = DocumentMover::with_file_system(staging.config(), Arc::new(TruncatingFileSystem))
        .run()
        .await
        .unwrap();

    assert!(matches!(
        report.outcome_for(&source).unwrap().status,
        MoveStatus::Failed {
            kind: FailureKind::Verification,
            ..
        }
    ));
    assert!(source.exists());
    assert!(!staging.archive.join("contract.pdf").exists());
    assert_eq!(
        std::fs::metadata(staging.archive.join("contract.pdf.tmp"))
            .unwrap()
            .len(),
        15
    );
}

#[tokio::test]
async fn test_interrupted_merge_is_finished_next_run() {
    let staging = Staging::new();
    let config = staging.config();
    let work_dir = config.work_dir();
    std::fs::create_dir_all(&work_dir).unwrap();
    crate::common::write_pdf(&work_dir.join("double-sided_x_merged.pdf"), &["x"]);

    let report = DocumentMover::new(config).run().await.unwrap();

    assert_eq!(report.moved(), 1);
    assert_eq!(file_names(&staging.duplex), vec!["double-sided_x_merged.pdf"]);
    assert!(file_names(&work_dir).is_empty());
}
