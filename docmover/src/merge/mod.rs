//! PDF merging operations.
//!
//! This module provides the interleaving merge and the folder-level pairing
//! built on top of it:
//! - Alternating page order (primary page, then secondary page)
//! - Blank page removal
//! - Pairing of consecutively numbered scans
//!
//! # Examples
//!
//! ```no_run
//! use docmover::config::MergeOptions;
//! use docmover::merge::{MergeJob, PageSource, PdfMerger};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let job = MergeJob::new(
//!     PageSource::from_path(Path::new("scan_001.pdf"))?,
//!     PageSource::from_path(Path::new("scan_002.pdf"))?,
//!     "scan_001-002.pdf",
//!     MergeOptions::default(),
//! );
//!
//! let report = PdfMerger::new().execute(job).await?;
//! println!("Merged {} pages", report.pages_written);
//! # Ok(())
//! # }
//! ```

pub mod grouper;
pub mod merger;
pub mod pages;

pub use grouper::{
    ConsecutiveGrouper, GroupOutcome, GroupPlan, GroupReport, PlannedPair, SkipCause,
};
pub use merger::{MergeReport, PdfMerger};
pub use pages::{PageInterleaver, PageSlot, interleave_order, is_blank_page};

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::config::MergeOptions;
use crate::error::{DocMoverError, Result};

/// An on-disk PDF used as one side of a merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageSource {
    /// Location of the file.
    pub path: PathBuf,
    /// Size in bytes when the source was described.
    pub size: u64,
    /// Modification time when the source was described.
    #[serde(skip)]
    pub mtime: Option<SystemTime>,
}

impl PageSource {
    /// Describe the file at `path` from its current metadata.
    ///
    /// # Errors
    ///
    /// Returns [`DocMoverError::InvalidInput`] if the file cannot be stat'ed
    /// or is not a regular file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path)
            .map_err(|e| DocMoverError::invalid_input(path, e.to_string()))?;

        if !metadata.is_file() {
            return Err(DocMoverError::invalid_input(path, "Not a regular file"));
        }

        Ok(Self {
            path: path.to_path_buf(),
            size: metadata.len(),
            mtime: metadata.modified().ok(),
        })
    }
}

/// A single pending merge. Consumed by [`PdfMerger::execute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeJob {
    /// Document whose pages come first in each pair.
    pub primary: PageSource,
    /// Document whose pages are interleaved after the primary's.
    pub secondary: PageSource,
    /// Destination of the merged document.
    pub output: PathBuf,
    /// Merge behavior.
    pub options: MergeOptions,
}

impl MergeJob {
    /// Create a merge job.
    pub fn new(
        primary: PageSource,
        secondary: PageSource,
        output: impl Into<PathBuf>,
        options: MergeOptions,
    ) -> Self {
        Self {
            primary,
            secondary,
            output: output.into(),
            options,
        }
    }
}
