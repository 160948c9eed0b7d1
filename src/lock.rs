//! Exclusive advisory lock over a package database
//!
//! Held for a whole cache rebuild so concurrent invocations never scan and
//! publish at the same time. Readers of the cache do not lock.

use crate::error::{PkgDbError, PkgDbResult};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Lock file name inside the package root
pub const LOCK_FILE: &str = ".pkgdb.lock";

/// Scoped exclusive lock; released on drop
#[derive(Debug)]
pub struct DbLock {
    file: File,
    path: PathBuf,
}

impl DbLock {
    fn open(root: &Path) -> PkgDbResult<(File, PathBuf)> {
        let path = root.join(LOCK_FILE);
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| PkgDbError::Lock {
                path: path.clone(),
                source: e,
            })?;
        Ok((file, path))
    }

    /// Block until the lock on `root` is held
    pub fn acquire(root: &Path) -> PkgDbResult<Self> {
        let (file, path) = Self::open(root)?;
        file.lock_exclusive().map_err(|e| PkgDbError::Lock {
            path: path.clone(),
            source: e,
        })?;
        debug!("Acquired {}", path.display());
        Ok(Self { file, path })
    }

    /// Take the lock only if nobody else holds it
    pub fn try_acquire(root: &Path) -> PkgDbResult<Option<Self>> {
        let (file, path) = Self::open(root)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self { file, path })),
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => Ok(None),
            Err(e) => Err(PkgDbError::Lock { path, source: e }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DbLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!("Failed to release {}: {}", self.path.display(), e);
        } else {
            debug!("Released {}", self.path.display());
        }
    }
}
