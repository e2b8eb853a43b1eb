//! Filesystem primitives used by the mover.
//!
//! The mover never calls `std::fs` directly for anything that changes the
//! filesystem; it goes through [`FileSystem`] so tests can substitute
//! failures such as cross-device renames or short copies.

use std::fmt::Debug;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use std::time::SystemTime;

/// Size and modification time of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    /// Size in bytes.
    pub size: u64,
    /// Modification time, if the platform reports one.
    pub mtime: Option<SystemTime>,
    /// Whether the path is a regular file.
    pub is_file: bool,
}

impl From<&fs::Metadata> for FileStat {
    fn from(metadata: &fs::Metadata) -> Self {
        Self {
            size: metadata.len(),
            mtime: metadata.modified().ok(),
            is_file: metadata.is_file(),
        }
    }
}

/// Filesystem operations the mover depends on.
pub trait FileSystem: Debug + Send + Sync {
    /// Stat a path without following a final symlink.
    fn stat(&self, path: &Path) -> io::Result<FileStat>;

    /// Whether anything exists at `path`.
    fn exists(&self, path: &Path) -> bool {
        self.stat(path).is_ok()
    }

    /// Rename within one filesystem.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Copy `from` to a new file at `to`, failing if `to` exists. Returns the
    /// number of bytes copied.
    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64>;

    /// Remove a file.
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Change owner and/or group. `None` leaves that id unchanged.
    fn set_owner(&self, path: &Path, uid: Option<u32>, gid: Option<u32>) -> io::Result<()>;

    /// Change permission bits.
    fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()>;
}

/// [`FileSystem`] backed by the local operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn stat(&self, path: &Path) -> io::Result<FileStat> {
        fs::symlink_metadata(path).map(|m| FileStat::from(&m))
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64> {
        let mut source = File::open(from)?;
        let mut target = OpenOptions::new().write(true).create_new(true).open(to)?;
        let copied = io::copy(&mut source, &mut target)?;
        target.sync_all()?;
        Ok(copied)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    #[cfg(unix)]
    fn set_owner(&self, path: &Path, uid: Option<u32>, gid: Option<u32>) -> io::Result<()> {
        if uid.is_none() && gid.is_none() {
            return Ok(());
        }
        let owner = uid.map(rustix::fs::Uid::from_raw);
        let group = gid.map(rustix::fs::Gid::from_raw);
        rustix::fs::chown(path, owner, group).map_err(io::Error::from)
    }

    #[cfg(not(unix))]
    fn set_owner(&self, _path: &Path, uid: Option<u32>, gid: Option<u32>) -> io::Result<()> {
        if uid.is_none() && gid.is_none() {
            return Ok(());
        }
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "changing ownership is not supported on this platform",
        ))
    }

    #[cfg(unix)]
    fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))
    }

    #[cfg(not(unix))]
    fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()> {
        let mut permissions = fs::metadata(path)?.permissions();
        permissions.set_readonly(mode & 0o222 == 0);
        fs::set_permissions(path, permissions)
    }
}
