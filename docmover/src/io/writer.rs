//! PDF writing and saving operations.
//!
//! Every write is all-or-nothing: the document is serialized into a
//! temporary sibling of the destination, flushed and synced, then renamed
//! into place. A failure at any step removes the temporary file, so a
//! destination path either holds a complete PDF or does not exist.
//!
//! # Examples
//!
//! ```no_run
//! use docmover::io::PdfWriter;
//! use lopdf::Document;
//! use std::path::Path;
//!
//! # async fn example(doc: Document) -> Result<(), Box<dyn std::error::Error>> {
//! let writer = PdfWriter::new();
//! let stats = writer.save(doc, Path::new("merged.pdf")).await?;
//! println!("Wrote {}", stats.format_file_size());
//! # Ok(())
//! # }
//! ```

use lopdf::Document;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::task;

use crate::error::{DocMoverError, Result};

/// Suffix appended to the destination name while a write is in progress.
pub const TEMP_SUFFIX: &str = ".tmp";

/// Options for writing PDF files.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Compress streams before writing.
    pub compress: bool,

    /// Buffer size for writing (in bytes).
    pub buffer_size: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            compress: true,
            buffer_size: 8192,
        }
    }
}

/// Statistics about a write operation.
#[derive(Debug, Clone)]
pub struct WriteStatistics {
    /// Time taken to write the file.
    pub write_time: Duration,

    /// Size of the written file in bytes.
    pub file_size: u64,

    /// Path where the file was written.
    pub output_path: PathBuf,
}

impl WriteStatistics {
    /// Format file size as human-readable string.
    pub fn format_file_size(&self) -> String {
        format_file_size(self.file_size)
    }
}

/// Atomic PDF writer.
#[derive(Debug, Clone, Default)]
pub struct PdfWriter {
    options: WriteOptions,
}

impl PdfWriter {
    /// Create a new PDF writer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer with custom options.
    pub fn with_options(options: WriteOptions) -> Self {
        Self { options }
    }

    /// Save a PDF document, consuming it.
    ///
    /// Parent directories are created as needed.
    ///
    /// # Errors
    ///
    /// Returns [`DocMoverError::Os`] if the directory, temporary file or
    /// rename fails, and [`DocMoverError::Pdf`]-derived I/O errors if
    /// serialization fails. No file is left at `path` or its temporary
    /// sibling on error.
    pub async fn save(&self, doc: Document, path: &Path) -> Result<WriteStatistics> {
        let path_buf = path.to_path_buf();
        let options = self.options.clone();

        task::spawn_blocking(move || write_atomic(doc, &path_buf, &options))
            .await
            .map_err(|e| DocMoverError::other(format!("Write task failed: {e}")))?
    }
}

/// Temporary path used while writing `path`.
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(TEMP_SUFFIX);
    path.with_file_name(name)
}

fn write_atomic(mut doc: Document, path: &Path, options: &WriteOptions) -> Result<WriteStatistics> {
    let start = Instant::now();

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .map_err(|e| DocMoverError::os("create directory", parent, e))?;
    }

    if options.compress {
        doc.compress();
    }

    let temp_path = temp_path_for(path);
    let result = write_to(&mut doc, &temp_path, options.buffer_size)
        .and_then(|()| {
            std::fs::rename(&temp_path, path).map_err(|e| DocMoverError::os("rename", path, e))
        });

    if let Err(err) = result {
        // The temp file may never have been created.
        let _ = std::fs::remove_file(&temp_path);
        return Err(err);
    }

    let file_size = std::fs::metadata(path)
        .map_err(|e| DocMoverError::os("stat", path, e))?
        .len();

    Ok(WriteStatistics {
        write_time: start.elapsed(),
        file_size,
        output_path: path.to_path_buf(),
    })
}

fn write_to(doc: &mut Document, temp_path: &Path, buffer_size: usize) -> Result<()> {
    let file = std::fs::File::create(temp_path)
        .map_err(|e| DocMoverError::os("create", temp_path, e))?;

    let mut writer = std::io::BufWriter::with_capacity(buffer_size, file);

    doc.save_to(&mut writer)
        .map_err(|e| DocMoverError::os("write", temp_path, std::io::Error::other(e)))?;

    let file = writer
        .into_inner()
        .map_err(|e| DocMoverError::os("flush", temp_path, e.into_error()))?;

    file.sync_all()
        .map_err(|e| DocMoverError::os("sync", temp_path, e))?;

    Ok(())
}

/// Format file size as human-readable string.
pub(crate) fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{size} bytes")
    }
}
