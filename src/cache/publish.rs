//! Atomic cache publication
//!
//! The store is written to a temporary file beside the cache and renamed
//! over it, so readers only ever see a complete old or new cache. A failure
//! before the rename deletes the temporary file; a crash leaves it behind
//! as an orphan, never as the cache.

use super::cdb::CdbWriter;
use crate::error::{PkgDbError, PkgDbResult};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Prefix of in-progress cache files
pub const TEMP_PREFIX: &str = "pkgdb.cache-";

/// Publishes a freshly written store at `cache_path`
#[derive(Debug, Clone)]
pub struct AtomicPublisher {
    cache_path: PathBuf,
    mode: u32,
}

impl AtomicPublisher {
    pub fn new(cache_path: impl Into<PathBuf>, mode: u32) -> Self {
        Self {
            cache_path: cache_path.into(),
            mode,
        }
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    fn dir(&self) -> &Path {
        self.cache_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
    }

    /// Fill a new store with `fill`, then move it into place
    pub fn publish<T>(
        &self,
        fill: impl FnOnce(&mut CdbWriter<&mut File>) -> PkgDbResult<T>,
    ) -> PkgDbResult<T> {
        let dir = self.dir();
        let mut tmp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(dir)
            .map_err(|e| PkgDbError::io(format!("creating temporary cache in {}", dir.display()), e))?;
        debug!("Writing cache to {}", tmp.path().display());

        let mut writer = CdbWriter::new(tmp.as_file_mut())?;
        let value = fill(&mut writer)?;
        let file = writer.finish()?;
        file.sync_all()
            .map_err(|e| PkgDbError::io("syncing temporary cache", e))?;
        self.apply_mode(file)?;

        let file = tmp.persist(&self.cache_path).map_err(|e| {
            PkgDbError::io(format!("renaming cache to {}", self.cache_path.display()), e.error)
        })?;

        self.finalize(&file)?;
        debug!("Published {}", self.cache_path.display());
        Ok(value)
    }

    /// Apply the cache mode before the rename; the file is never visible
    /// at the cache path with the temporary file's private mode.
    fn apply_mode(&self, file: &File) -> PkgDbResult<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(self.mode))
                .map_err(|e| PkgDbError::io("setting cache permissions", e))?;
        }
        #[cfg(not(unix))]
        let _ = file;
        Ok(())
    }

    /// Keep the cache at least as new as its directory
    ///
    /// The rename updates the directory mtime, which would otherwise make the
    /// new cache look stale on the next check.
    fn finalize(&self, file: &File) -> PkgDbResult<()> {
        let dir_mtime = fs::metadata(self.dir())
            .and_then(|m| m.modified())
            .map_err(|e| PkgDbError::io("reading package root mtime", e))?;
        let cache_mtime = file
            .metadata()
            .and_then(|m| m.modified())
            .map_err(|e| PkgDbError::io("reading cache mtime", e))?;

        if dir_mtime > cache_mtime {
            file.set_modified(dir_mtime)
                .map_err(|e| PkgDbError::io("updating cache mtime", e))?;
        }
        Ok(())
    }
}
