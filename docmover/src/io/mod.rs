//! PDF input/output.
//!
//! [`PdfReader`] turns files into validated `lopdf` documents and
//! [`PdfWriter`] serializes documents atomically.

pub mod reader;
pub mod writer;

pub use reader::{LoadedPdf, PdfReader};
pub use writer::{PdfWriter, WriteOptions, WriteStatistics, temp_path_for};
