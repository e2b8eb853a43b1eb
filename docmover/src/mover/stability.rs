//! Detection of files that are still being written.
//!
//! A file is stable when two `(size, mtime)` snapshots taken `wait` apart
//! are identical. The batch check takes every first snapshot, sleeps once,
//! then takes every second snapshot, so its latency does not grow with the
//! number of files.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::mover::fs::{FileStat, FileSystem, LocalFileSystem};

/// The two snapshots of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StabilityRecord {
    /// The file.
    pub path: PathBuf,
    /// Snapshot before the wait; `None` if the file was missing.
    pub first: Option<FileStat>,
    /// Snapshot after the wait; `None` if the file was missing.
    pub second: Option<FileStat>,
}

impl StabilityRecord {
    /// Both snapshots exist and match exactly.
    pub fn is_stable(&self) -> bool {
        match (&self.first, &self.second) {
            (Some(first), Some(second)) => {
                first.size == second.size && first.mtime == second.mtime
            }
            _ => false,
        }
    }

    /// Size from the second snapshot.
    pub fn size(&self) -> Option<u64> {
        self.second.map(|s| s.size)
    }
}

/// Compares snapshots taken a fixed interval apart.
#[derive(Debug, Clone)]
pub struct StabilityChecker {
    fs: Arc<dyn FileSystem>,
}

impl Default for StabilityChecker {
    fn default() -> Self {
        Self::new(Arc::new(LocalFileSystem))
    }
}

impl StabilityChecker {
    /// Create a checker reading metadata through `fs`.
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Check a single file. A file that disappears is unstable.
    pub async fn is_stable(&self, path: &Path, wait: Duration) -> bool {
        self.check_all(&[path.to_path_buf()], wait)
            .await
            .first()
            .is_some_and(StabilityRecord::is_stable)
    }

    /// Check many files with a single shared wait.
    ///
    /// Records are returned in input order.
    pub async fn check_all(&self, paths: &[PathBuf], wait: Duration) -> Vec<StabilityRecord> {
        let first: Vec<Option<FileStat>> = paths.iter().map(|p| self.snapshot(p)).collect();

        if !paths.is_empty() && !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }

        paths
            .iter()
            .zip(first)
            .map(|(path, first)| {
                let record = StabilityRecord {
                    path: path.clone(),
                    first,
                    second: self.snapshot(path),
                };
                if !record.is_stable() {
                    tracing::debug!(path = %path.display(), "file changed during stability wait");
                }
                record
            })
            .collect()
    }

    fn snapshot(&self, path: &Path) -> Option<FileStat> {
        self.fs.stat(path).ok().filter(|stat| stat.is_file)
    }
}
