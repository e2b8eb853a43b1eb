//! Dry runs report the plan and leave the filesystem untouched.

use docmover::GroupOptions;
use docmover::merge::ConsecutiveGrouper;
use docmover::mover::{DocumentMover, MoveStatus};
use std::path::Path;
use std::time::SystemTime;
use tempfile::TempDir;

use crate::common::{Staging, file_names, write_pdf};

fn snapshot(dir: &Path) -> Vec<(String, u64, SystemTime)> {
    file_names(dir)
        .into_iter()
        .map(|name| {
            let metadata = std::fs::metadata(dir.join(&name)).unwrap();
            (name, metadata.len(), metadata.modified().unwrap())
        })
        .collect()
}

#[tokio::test]
async fn test_mover_dry_run_changes_nothing() {
    let staging = Staging::new();
    std::fs::write(staging.incoming.join("invoice.pdf"), b"%PDF").unwrap();
    staging.scan("double-sided_front_q.pdf", &["F"]);
    staging.scan("double-sided_back_q.pdf", &["B"]);
    let before = snapshot(&staging.incoming);

    let mut config = staging.config();
    config.dry_run = true;
    let work_dir = config.work_dir();
    let report = DocumentMover::new(config).run().await.unwrap();

    assert!(report.dry_run);
    assert_eq!(report.moved(), 2);
    assert_eq!(snapshot(&staging.incoming), before);
    assert!(file_names(&staging.archive).is_empty());
    assert!(file_names(&staging.duplex).is_empty());
    assert!(!work_dir.join("double-sided_q_merged.pdf").exists());

    let planned: Vec<_> = report
        .outcomes
        .iter()
        .filter_map(|o| match &o.status {
            MoveStatus::Moved { destination, .. } => Some(destination.clone()),
            _ => None,
        })
        .collect();
    assert!(planned.contains(&staging.duplex.join("double-sided_q_merged.pdf")));
    assert!(planned.contains(&staging.archive.join("invoice.pdf")));
}

#[tokio::test]
async fn test_group_dry_run_changes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let folder = temp_dir.path();
    write_pdf(&folder.join("scan_1.pdf"), &["1"]);
    write_pdf(&folder.join("scan_2.pdf"), &["2"]);
    let before = snapshot(folder);

    let mut options = GroupOptions::new(folder);
    options.dry_run = true;
    options.merge.delete_source = true;
    let report = ConsecutiveGrouper::new().run(folder, &options).await.unwrap();

    assert_eq!(report.planned(), 1);
    assert_eq!(snapshot(folder), before);
}
