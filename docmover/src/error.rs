//! Error types for docmover.
//!
//! Every fallible library operation returns [`DocMoverError`]. The variants
//! follow the failure taxonomy of the pipeline:
//!
//! - **Input errors**: unparseable or empty PDFs, merges that filter down to
//!   nothing
//! - **Destination errors**: output collisions, failed copy verification
//! - **OS errors**: failures of the filesystem primitives, always carrying the
//!   path and action that failed
//! - **Configuration errors**: invalid settings or a run lock held elsewhere
//!
//! Transient states such as "file still being written" or "dual-side partner
//! missing" are not errors; they are reported as
//! [`SkipReason`](crate::mover::SkipReason)s.

use serde::Serialize;
use std::io;
use std::path::PathBuf;

/// Result type alias for docmover operations.
pub type Result<T> = std::result::Result<T, DocMoverError>;

/// Main error type for docmover operations.
#[derive(Debug, thiserror::Error)]
pub enum DocMoverError {
    /// Input PDF could not be parsed or has no pages.
    #[error("Invalid input PDF: {}\n  Reason: {reason}", path.display())]
    InvalidInput {
        /// Path to the offending input.
        path: PathBuf,
        /// Why the input was rejected.
        reason: String,
    },

    /// Merge produced zero pages after empty-page removal.
    #[error(
        "Merge of {} and {} produced no pages after removing empty pages",
        primary.display(),
        secondary.display()
    )]
    EmptyResult {
        /// Primary input of the merge.
        primary: PathBuf,
        /// Secondary input of the merge.
        secondary: PathBuf,
    },

    /// Destination file already exists and will not be overwritten.
    #[error("Destination already exists: {}", path.display())]
    OutputCollision {
        /// Path of the existing destination.
        path: PathBuf,
    },

    /// Cross-filesystem copy did not match the source size.
    #[error(
        "Copy verification failed for {} -> {}: expected {expected} bytes, found {actual}",
        source_path.display(),
        destination.display()
    )]
    VerificationFailure {
        /// File that was being relocated.
        source_path: PathBuf,
        /// Copy that failed verification.
        destination: PathBuf,
        /// Size of the source in bytes.
        expected: u64,
        /// Size of the copy in bytes.
        actual: u64,
    },

    /// A filesystem primitive failed.
    #[error("Failed to {action} {}: {source}", path.display())]
    Os {
        /// What was being attempted ("rename", "chown", ...).
        action: &'static str,
        /// Path the primitive was applied to.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The PDF library rejected an operation on an already loaded document.
    #[error("PDF library error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what's wrong with the configuration.
        message: String,
    },

    /// Another invocation holds the run lock.
    #[error("Another instance holds the lock file: {}", path.display())]
    LockHeld {
        /// Path of the lock file.
        path: PathBuf,
    },

    /// Generic I/O error without path context.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Generic error with a custom message.
    #[error("{message}")]
    Other {
        /// Error message.
        message: String,
    },
}

/// Serializable classification of a failure, used in outcome reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Unparseable or empty input PDF.
    InvalidInput,
    /// Merge filtered down to zero pages.
    EmptyResult,
    /// Destination already exists.
    OutputCollision,
    /// Cross-filesystem copy verification failed.
    Verification,
    /// Filesystem primitive failed.
    Os,
    /// PDF library failure.
    Pdf,
    /// Anything else.
    Other,
}

impl DocMoverError {
    /// Create an InvalidInput error.
    pub fn invalid_input(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an OutputCollision error.
    pub fn output_collision(path: impl Into<PathBuf>) -> Self {
        Self::OutputCollision { path: path.into() }
    }

    /// Create an Os error for a failed filesystem primitive.
    pub fn os(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Os {
            action,
            path: path.into(),
            source,
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an Other error with a custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Classify this error for outcome reports.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidInput { .. } => FailureKind::InvalidInput,
            Self::EmptyResult { .. } => FailureKind::EmptyResult,
            Self::OutputCollision { .. } => FailureKind::OutputCollision,
            Self::VerificationFailure { .. } => FailureKind::Verification,
            Self::Os { .. } | Self::Io(_) => FailureKind::Os,
            Self::Pdf(_) => FailureKind::Pdf,
            Self::InvalidConfig { .. } | Self::LockHeld { .. } | Self::Other { .. } => {
                FailureKind::Other
            }
        }
    }

    /// Raw OS error code, when the failure came from the operating system.
    pub fn os_code(&self) -> Option<i32> {
        match self {
            Self::Os { source, .. } | Self::Io(source) => source.raw_os_error(),
            _ => None,
        }
    }

    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidConfig { .. } => 1,
            Self::InvalidInput { .. } => 3,
            Self::EmptyResult { .. } => 3,
            Self::OutputCollision { .. } => 4,
            Self::Os { .. } | Self::Io(_) => 5,
            Self::VerificationFailure { .. } => 5,
            Self::Pdf(_) => 6,
            Self::LockHeld { .. } => 0,
            Self::Other { .. } => 1,
        }
    }
}
