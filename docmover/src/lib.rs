//! docmover - Pair, interleave and relocate scanned documents.
//!
//! This library drives a scanner staging directory. It supports:
//!
//! - Merging two PDFs by alternating their pages (front/back scan passes)
//! - Dropping blank pages from merged output
//! - Pairing consecutively numbered scans in a folder
//! - Detecting files that are still being written
//! - Atomic relocation with ownership and permission normalization
//!
//! # Examples
//!
//! ## Merge a front and a back pass
//!
//! ```no_run
//! use docmover::config::MergeOptions;
//! use docmover::merge::PdfMerger;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = MergeOptions {
//!     remove_empty_pages: true,
//!     ..MergeOptions::default()
//! };
//!
//! let report = PdfMerger::new()
//!     .merge(
//!         Path::new("front.pdf"),
//!         Path::new("back.pdf"),
//!         Path::new("merged.pdf"),
//!         options,
//!     )
//!     .await?;
//! println!("Wrote {} pages", report.pages_written);
//! # Ok(())
//! # }
//! ```
//!
//! ## Move finished scans
//!
//! ```no_run
//! use docmover::MoverConfig;
//! use docmover::mover::DocumentMover;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MoverConfig::new("/srv/scans/incoming", "/srv/scans/archive");
//! let report = DocumentMover::new(config).run().await?;
//! println!("{} moved, {} skipped", report.moved(), report.skipped());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod io;
pub mod merge;
pub mod mover;
pub mod output;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use config::{GroupOptions, MergeOptions, MoverConfig};
pub use error::{DocMoverError, Result};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
