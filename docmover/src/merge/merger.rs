//! Core interleaving merge.
//!
//! A merge loads two documents, alternates their pages, optionally drops
//! blank pages, and writes the result atomically. Inputs are only deleted
//! after the output has been renamed into place.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::task;

use crate::config::MergeOptions;
use crate::error::{DocMoverError, Result};
use crate::io::{PdfReader, PdfWriter};
use crate::merge::pages::PageInterleaver;
use crate::merge::{MergeJob, PageSource};

/// Outcome of a successful merge.
#[derive(Debug, Clone, Serialize)]
pub struct MergeReport {
    /// Path of the merged document.
    pub output: PathBuf,

    /// Primary input.
    pub primary: PathBuf,

    /// Secondary input.
    pub secondary: PathBuf,

    /// Pages in the primary input.
    pub primary_pages: usize,

    /// Pages in the secondary input.
    pub secondary_pages: usize,

    /// Pages in the merged document.
    pub pages_written: usize,

    /// Pages dropped as blank.
    pub pages_removed: usize,

    /// Size of the merged document in bytes.
    pub output_size: u64,

    /// Whether the inputs were deleted.
    pub sources_deleted: bool,

    /// Inputs that could not be deleted after a successful write.
    pub deletion_warnings: Vec<String>,

    /// Total time taken.
    #[serde(skip)]
    pub merge_time: Duration,
}

impl MergeReport {
    /// Format output size as human-readable string.
    pub fn format_output_size(&self) -> String {
        crate::io::writer::format_file_size(self.output_size)
    }
}

/// Merges two PDFs into one with alternating page order.
#[derive(Debug, Clone, Default)]
pub struct PdfMerger {
    /// Reader for loading PDFs.
    reader: PdfReader,

    /// Writer for the merged output.
    writer: PdfWriter,
}

impl PdfMerger {
    /// Create a new merger with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `primary` and `secondary` into `output`.
    ///
    /// # Arguments
    ///
    /// * `primary` - Document contributing the first page of every pair
    /// * `secondary` - Document contributing the second page of every pair
    /// * `output` - Destination path; parent directories are created
    /// * `options` - Blank page removal, reversal and source deletion
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Either input is missing, unparseable or has no pages
    /// - No page survives blank page removal
    /// - The output cannot be written
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use docmover::merge::PdfMerger;
    /// # use docmover::config::MergeOptions;
    /// # use std::path::Path;
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let report = PdfMerger::new()
    ///     .merge(
    ///         Path::new("odd.pdf"),
    ///         Path::new("even.pdf"),
    ///         Path::new("out.pdf"),
    ///         MergeOptions::default(),
    ///     )
    ///     .await?;
    /// println!("{} pages, {}", report.pages_written, report.format_output_size());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn merge(
        &self,
        primary: &Path,
        secondary: &Path,
        output: &Path,
        options: MergeOptions,
    ) -> Result<MergeReport> {
        let job = MergeJob::new(
            PageSource::from_path(primary)?,
            PageSource::from_path(secondary)?,
            output,
            options,
        );
        self.execute(job).await
    }

    /// Run a merge job to completion.
    ///
    /// # Errors
    ///
    /// See [`PdfMerger::merge`].
    pub async fn execute(&self, job: MergeJob) -> Result<MergeReport> {
        let start = Instant::now();
        let MergeJob {
            primary,
            secondary,
            output,
            options,
        } = job;

        let primary_pdf = self.reader.load(&primary.path).await?;
        let secondary_pdf = self.reader.load(&secondary.path).await?;

        tracing::debug!(
            primary = %primary_pdf.path.display(),
            primary_pages = primary_pdf.page_count,
            primary_bytes = primary_pdf.file_size,
            secondary = %secondary_pdf.path.display(),
            secondary_pages = secondary_pdf.page_count,
            secondary_bytes = secondary_pdf.file_size,
            output = %output.display(),
            "merging"
        );

        let interleaver =
            PageInterleaver::new(options.remove_empty_pages, options.reverse_secondary);
        let interleaved = task::spawn_blocking(move || {
            interleaver.interleave(primary_pdf.document, secondary_pdf.document)
        })
        .await
        .map_err(|e| DocMoverError::other(format!("Merge task failed: {e}")))??;

        let Some(interleaved) = interleaved else {
            return Err(DocMoverError::EmptyResult {
                primary: primary.path,
                secondary: secondary.path,
            });
        };

        let pages_removed = interleaved.pages_removed();
        let stats = self.writer.save(interleaved.document, &output).await?;

        let mut deletion_warnings = Vec::new();
        if options.delete_source {
            for source in [&primary.path, &secondary.path] {
                if *source == output {
                    continue;
                }
                if let Err(e) = tokio::fs::remove_file(source).await {
                    tracing::warn!(path = %source.display(), error = %e, "failed to delete merge input");
                    deletion_warnings.push(format!("{}: {e}", source.display()));
                }
            }
        }

        tracing::info!(
            output = %output.display(),
            pages = interleaved.pages_written,
            removed = pages_removed,
            "merged"
        );

        Ok(MergeReport {
            output,
            primary: primary.path,
            secondary: secondary.path,
            primary_pages: interleaved.primary_pages,
            secondary_pages: interleaved.secondary_pages,
            pages_written: interleaved.pages_written,
            pages_removed,
            output_size: stats.file_size,
            sources_deleted: options.delete_source && deletion_warnings.is_empty(),
            deletion_warnings,
            merge_time: start.elapsed(),
        })
    }
}
