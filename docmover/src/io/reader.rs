//! PDF reading and loading operations.
//!
//! Loading is the point where the PDF library's failures are translated into
//! [`DocMoverError::InvalidInput`]: a file that cannot be parsed, or parses to
//! a document with no pages, is never handed to the merge engine.
//!
//! # Examples
//!
//! ```no_run
//! use docmover::io::PdfReader;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let reader = PdfReader::new();
//! let loaded = reader.load(Path::new("scan_001.pdf")).await?;
//! println!("{} pages", loaded.page_count);
//! # Ok(())
//! # }
//! ```

use lopdf::Document;
use std::path::{Path, PathBuf};
use tokio::task;

use crate::error::{DocMoverError, Result};

/// A loaded PDF document with metadata.
#[derive(Debug)]
pub struct LoadedPdf {
    /// The PDF document.
    pub document: Document,

    /// Path to the source file.
    pub path: PathBuf,

    /// Number of pages in the document.
    pub page_count: usize,

    /// File size in bytes.
    pub file_size: u64,
}

/// PDF reader that rejects unparseable and page-less documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfReader;

impl PdfReader {
    /// Create a new PDF reader.
    pub fn new() -> Self {
        Self
    }

    /// Load a PDF on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns [`DocMoverError::InvalidInput`] if the file is missing,
    /// unreadable, not a PDF, encrypted, or has zero pages.
    pub async fn load(&self, path: &Path) -> Result<LoadedPdf> {
        let path_buf = path.to_path_buf();
        let reader = *self;

        task::spawn_blocking(move || reader.load_blocking(&path_buf))
            .await
            .map_err(|e| DocMoverError::other(format!("Load task failed: {e}")))?
    }

    /// Load a PDF on the current thread.
    pub fn load_blocking(&self, path: &Path) -> Result<LoadedPdf> {
        let file_size = std::fs::metadata(path)
            .map_err(|e| DocMoverError::invalid_input(path, e.to_string()))?
            .len();

        let document = Document::load(path).map_err(|e| {
            let err_msg = e.to_string();
            if err_msg.contains("encrypt") || err_msg.contains("password") {
                DocMoverError::invalid_input(path, format!("PDF is encrypted: {err_msg}"))
            } else {
                DocMoverError::invalid_input(path, err_msg)
            }
        })?;

        let page_count = document.get_pages().len();
        if page_count == 0 {
            return Err(DocMoverError::invalid_input(path, "PDF has no pages"));
        }

        Ok(LoadedPdf {
            document,
            path: path.to_path_buf(),
            page_count,
            file_size,
        })
    }
}
