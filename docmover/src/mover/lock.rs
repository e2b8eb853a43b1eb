//! Cooperative run lock.
//!
//! Only one mover run may operate on a staging directory at a time. The lock
//! is an advisory exclusive lock on a file; it is released when the
//! [`RunLock`] is dropped, including when the process dies.

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{DocMoverError, Result};

/// Exclusive advisory lock held for the lifetime of the value.
#[derive(Debug)]
pub struct RunLock {
    file: File,
    path: PathBuf,
}

impl RunLock {
    /// Try to take the lock without blocking.
    ///
    /// The lock file is created if missing and receives the holder's PID.
    ///
    /// # Errors
    ///
    /// Returns [`DocMoverError::LockHeld`] if another process holds the
    /// lock, or [`DocMoverError::Os`] if the file cannot be opened or locked.
    pub fn acquire(path: &Path) -> Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| DocMoverError::os("open lock file", path, e))?;

        if let Err(error) = file.try_lock_exclusive() {
            if error.kind() == fs2::lock_contended_error().kind() {
                return Err(DocMoverError::LockHeld {
                    path: path.to_path_buf(),
                });
            }
            return Err(DocMoverError::os("lock", path, error));
        }

        // PID is informational only
        if file.set_len(0).is_ok() {
            let _ = writeln!(file, "{}", std::process::id());
        }

        tracing::debug!(path = %path.display(), "run lock acquired");
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        tracing::debug!(path = %self.path.display(), "run lock released");
    }
}
