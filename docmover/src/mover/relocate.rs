//! Atomic relocation of finished files.
//!
//! A file is renamed into its destination directory. When source and
//! destination live on different filesystems the rename fails with
//! `CrossesDevices`; the file is then copied under a temporary name in the
//! destination directory, the copy's size verified against the source, and
//! only then is the copy renamed to its final name and the source removed.
//!
//! After a successful move, ownership and permission bits are normalized.
//! Failures at that stage leave the move in place and are returned as
//! warnings.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{DocMoverError, Result};
use crate::io::temp_path_for;
use crate::mover::fs::FileSystem;

/// How a file reached its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocationMethod {
    /// Renamed within one filesystem.
    Renamed,
    /// Copied across filesystems, verified, then removed from the source.
    Copied,
    /// Nothing done (dry run).
    Planned,
}

/// A completed (or planned) relocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    /// Final path of the file.
    pub destination: PathBuf,
    /// How the file got there.
    pub method: RelocationMethod,
    /// Ownership or permission changes that failed.
    pub warnings: Vec<String>,
}

/// Moves files into destination directories.
#[derive(Debug, Clone)]
pub struct Relocator {
    fs: Arc<dyn FileSystem>,
    user_id: Option<u32>,
    group_id: Option<u32>,
    file_mode: u32,
    dry_run: bool,
}

impl Relocator {
    /// Create a relocator.
    pub fn new(
        fs: Arc<dyn FileSystem>,
        user_id: Option<u32>,
        group_id: Option<u32>,
        file_mode: u32,
        dry_run: bool,
    ) -> Self {
        Self {
            fs,
            user_id,
            group_id,
            file_mode,
            dry_run,
        }
    }

    /// Move `source` into `dest_dir`, keeping its file name.
    ///
    /// # Errors
    ///
    /// - [`DocMoverError::OutputCollision`] if the destination exists; the
    ///   source is left alone.
    /// - [`DocMoverError::VerificationFailure`] if a cross-filesystem copy
    ///   differs in size; both files are kept.
    /// - [`DocMoverError::Os`] if a filesystem primitive fails.
    pub fn relocate(&self, source: &Path, dest_dir: &Path) -> Result<Relocation> {
        let name = source
            .file_name()
            .ok_or_else(|| DocMoverError::invalid_input(source, "Path has no file name"))?;
        let destination = dest_dir.join(name);

        if self.fs.exists(&destination) {
            return Err(DocMoverError::output_collision(destination));
        }

        if self.dry_run {
            tracing::info!(
                path = %source.display(),
                destination = %destination.display(),
                "would move"
            );
            return Ok(Relocation {
                destination,
                method: RelocationMethod::Planned,
                warnings: Vec::new(),
            });
        }

        let method = match self.fs.rename(source, &destination) {
            Ok(()) => RelocationMethod::Renamed,
            Err(error) if error.kind() == io::ErrorKind::CrossesDevices => {
                tracing::debug!(path = %source.display(), "rename crosses devices, copying");
                self.copy_verified(source, &destination)?;
                RelocationMethod::Copied
            }
            Err(error) => return Err(DocMoverError::os("rename", source, error)),
        };

        let warnings = self.normalize(&destination);

        tracing::info!(
            path = %source.display(),
            destination = %destination.display(),
            "moved"
        );

        Ok(Relocation {
            destination,
            method,
            warnings,
        })
    }

    /// Copy into a temporary sibling of `destination`, verify its size, then
    /// rename it into place. A verification failure leaves the temporary
    /// copy behind for inspection; the source is kept.
    fn copy_verified(&self, source: &Path, destination: &Path) -> Result<()> {
        let expected = self
            .fs
            .stat(source)
            .map_err(|e| DocMoverError::os("stat", source, e))?
            .size;

        let staging = temp_path_for(destination);
        if self.fs.exists(&staging) {
            // Left by an interrupted or failed earlier attempt
            tracing::debug!(path = %staging.display(), "removing stale partial copy");
            self.fs
                .remove_file(&staging)
                .map_err(|e| DocMoverError::os("remove", &staging, e))?;
        }

        if let Err(error) = self.fs.copy(source, &staging) {
            let _ = self.fs.remove_file(&staging);
            return Err(DocMoverError::os("copy", &staging, error));
        }

        let actual = self
            .fs
            .stat(&staging)
            .map_err(|e| DocMoverError::os("stat", &staging, e))?
            .size;

        if actual != expected {
            return Err(DocMoverError::VerificationFailure {
                source_path: source.to_path_buf(),
                destination: staging,
                expected,
                actual,
            });
        }

        if self.fs.exists(destination) {
            let _ = self.fs.remove_file(&staging);
            return Err(DocMoverError::output_collision(destination));
        }

        self.fs
            .rename(&staging, destination)
            .map_err(|e| DocMoverError::os("rename", &staging, e))?;

        self.fs
            .remove_file(source)
            .map_err(|e| DocMoverError::os("remove", source, e))
    }

    fn normalize(&self, destination: &Path) -> Vec<String> {
        let mut warnings = Vec::new();

        if (self.user_id.is_some() || self.group_id.is_some())
            && let Err(error) = self.fs.set_owner(destination, self.user_id, self.group_id)
        {
            let err = DocMoverError::os("chown", destination, error);
            tracing::warn!(error = %err, code = ?err.os_code(), "ownership not changed");
            warnings.push(err.to_string());
        }

        if let Err(error) = self.fs.set_mode(destination, self.file_mode) {
            let err = DocMoverError::os("chmod", destination, error);
            tracing::warn!(error = %err, code = ?err.os_code(), "permissions not changed");
            warnings.push(err.to_string());
        }

        warnings
    }
}
