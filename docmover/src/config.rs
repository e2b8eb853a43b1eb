//! Configuration for merge, grouping and move operations.
//!
//! These structures are the parsed form of the invocation surface. The CLI
//! builds them from arguments; library users construct them directly. Each
//! carries a `validate` method that rejects inconsistent settings before any
//! filesystem work starts.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{DocMoverError, Result};

/// Default filename prefix identifying dual-sided scans.
pub const DEFAULT_DUAL_SIDE_PREFIX: &str = "double-sided";

/// Default stability wait in seconds.
pub const DEFAULT_STABILITY_WAIT_SECS: u64 = 10;

/// Default maximum age in minutes before an unpaired dual-side scan is
/// moved on its own.
pub const DEFAULT_MAX_AGE_MINUTES: u64 = 10;

/// Default permission bits applied to relocated files.
pub const DEFAULT_FILE_MODE: u32 = 0o660;

/// Default lock file used by the CLI around a move run.
pub const DEFAULT_LOCK_FILE: &str = "/var/run/move-pdfs.lock";

/// Default file extensions picked up from the source directory.
pub const DEFAULT_FILE_TYPES: &[&str] = &["pdf", "jpg", "jpeg", "png", "tiff", "tif"];

/// Name of the work directory created inside the source directory when no
/// explicit work directory is configured.
pub const DEFAULT_WORK_DIR_NAME: &str = ".docmover-work";

/// Options controlling a single two-document merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOptions {
    /// Delete both inputs once the output is durably written.
    pub delete_source: bool,
    /// Drop pages without visible content after interleaving.
    pub remove_empty_pages: bool,
    /// Reverse the secondary's pages before interleaving (back pass fed in
    /// reverse order).
    pub reverse_secondary: bool,
}

/// Options for [`ConsecutiveGrouper::run`](crate::merge::ConsecutiveGrouper::run).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupOptions {
    /// Folder receiving merged outputs.
    pub dest_folder: PathBuf,
    /// Report the plan without merging or touching the filesystem.
    pub dry_run: bool,
    /// Options passed to every merge.
    pub merge: MergeOptions,
}

impl GroupOptions {
    /// Options writing into `dest_folder` with default merge settings.
    pub fn new(dest_folder: impl Into<PathBuf>) -> Self {
        Self {
            dest_folder: dest_folder.into(),
            dry_run: false,
            merge: MergeOptions::default(),
        }
    }
}

/// Complete configuration for a [`DocumentMover`](crate::mover::DocumentMover) run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoverConfig {
    /// Staging directory the scanner writes into.
    pub source_dir: PathBuf,

    /// Destination for regular files.
    pub dest_dir: PathBuf,

    /// Destination for merged dual-side documents (`None` = `dest_dir`).
    pub dual_dest_dir: Option<PathBuf>,

    /// Staging area for merged outputs awaiting relocation
    /// (`None` = `<source_dir>/.docmover-work`).
    pub work_dir: Option<PathBuf>,

    /// Filename prefix marking dual-sided scans.
    pub dual_side_prefix: String,

    /// Owner applied after relocation (`None` = leave unchanged).
    pub user_id: Option<u32>,

    /// Group applied after relocation (`None` = leave unchanged).
    pub group_id: Option<u32>,

    /// Permission bits applied after relocation.
    pub file_mode: u32,

    /// Interval between the two stability snapshots. Files younger than this
    /// are deferred.
    pub stability_wait: Duration,

    /// Age after which an unpaired dual-side scan is moved as a regular file.
    pub max_age: Duration,

    /// Lower-case extensions (without dot) picked up from the source
    /// directory.
    pub file_types: Vec<String>,

    /// Drop empty pages from merged dual-side documents.
    pub remove_empty_pages: bool,

    /// Reverse the back pass before interleaving.
    pub reverse_back_side: bool,

    /// Decide everything, mutate nothing.
    pub dry_run: bool,
}

impl MoverConfig {
    /// Configuration with the stock defaults for the given directories.
    pub fn new(source_dir: impl Into<PathBuf>, dest_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            dest_dir: dest_dir.into(),
            dual_dest_dir: None,
            work_dir: None,
            dual_side_prefix: DEFAULT_DUAL_SIDE_PREFIX.to_string(),
            user_id: None,
            group_id: None,
            file_mode: DEFAULT_FILE_MODE,
            stability_wait: Duration::from_secs(DEFAULT_STABILITY_WAIT_SECS),
            max_age: Duration::from_secs(DEFAULT_MAX_AGE_MINUTES * 60),
            file_types: normalize_file_types(DEFAULT_FILE_TYPES),
            remove_empty_pages: true,
            reverse_back_side: false,
            dry_run: false,
        }
    }

    /// Destination for merged dual-side documents.
    pub fn dual_dest_dir(&self) -> &Path {
        self.dual_dest_dir.as_deref().unwrap_or(&self.dest_dir)
    }

    /// Staging directory for merged outputs.
    pub fn work_dir(&self) -> PathBuf {
        self.work_dir
            .clone()
            .unwrap_or_else(|| self.source_dir.join(DEFAULT_WORK_DIR_NAME))
    }

    /// Check whether a file name carries one of the configured extensions.
    pub fn accepts_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_ascii_lowercase();
                self.file_types.iter().any(|t| *t == ext)
            })
            .unwrap_or(false)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DocMoverError::InvalidConfig`] if:
    /// - a directory path is empty
    /// - source and a destination are the same directory
    /// - the dual-side prefix or the file type list is empty
    /// - the file mode has bits outside `0o7777`
    pub fn validate(&self) -> Result<()> {
        if self.source_dir.as_os_str().is_empty() {
            return Err(DocMoverError::invalid_config("Source directory is empty"));
        }

        if self.dest_dir.as_os_str().is_empty() {
            return Err(DocMoverError::invalid_config(
                "Destination directory is empty",
            ));
        }

        if self.source_dir == self.dest_dir || self.source_dir.as_path() == self.dual_dest_dir() {
            return Err(DocMoverError::invalid_config(format!(
                "Destination cannot be the source directory: {}",
                self.source_dir.display()
            )));
        }

        if self.dual_side_prefix.trim().is_empty() {
            return Err(DocMoverError::invalid_config(
                "Dual-side prefix cannot be empty",
            ));
        }

        if self.file_types.is_empty() {
            return Err(DocMoverError::invalid_config(
                "At least one file type is required",
            ));
        }

        if self.file_mode > 0o7777 {
            return Err(DocMoverError::invalid_config(format!(
                "Invalid file mode: {:o}",
                self.file_mode
            )));
        }

        Ok(())
    }
}

/// Normalize extensions to lower case without a leading dot, dropping
/// duplicates and blanks.
///
/// # Examples
///
/// ```
/// use docmover::config::normalize_file_types;
///
/// let types = normalize_file_types(["PDF", ".pdf", ".JPG", " "]);
/// assert_eq!(types, vec!["pdf".to_string(), "jpg".to_string()]);
/// ```
pub fn normalize_file_types<I>(types: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();
    for ty in types {
        let ty = ty.as_ref().trim().trim_start_matches('.').to_ascii_lowercase();
        if !ty.is_empty() && !normalized.contains(&ty) {
            normalized.push(ty);
        }
    }
    normalized
}

/// Parse an octal permission string such as `660` or `0o640`.
pub fn parse_file_mode(s: &str) -> Result<u32> {
    let digits = s.trim().trim_start_matches("0o");
    let mode = u32::from_str_radix(digits, 8)
        .map_err(|_| DocMoverError::invalid_config(format!("Invalid file mode: {s}")))?;
    if mode > 0o7777 {
        return Err(DocMoverError::invalid_config(format!(
            "Invalid file mode: {s}"
        )));
    }
    Ok(mode)
}
