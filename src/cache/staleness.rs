//! Cache staleness checks
//!
//! The cache is stale when it is missing or older than the package root.
//! Installing or removing a package adds or removes a directory in the
//! root, which bumps the root's mtime.

use super::CACHE_FILE;
use crate::error::{PkgDbError, PkgDbResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Result of a staleness check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Staleness {
    /// The package root does not exist; there is nothing to index
    NoDatabase,
    /// The cache is at least as new as the package root
    Fresh,
    /// No cache file exists yet
    Missing(PathBuf),
    /// The package root changed after the cache was written
    Outdated(PathBuf),
}

impl Staleness {
    pub fn needs_rebuild(&self) -> bool {
        matches!(self, Self::Missing(_) | Self::Outdated(_))
    }
}

/// Path of the cache file for a package root
pub fn cache_path(root: &Path) -> PathBuf {
    root.join(CACHE_FILE)
}

/// Decide whether the cache under `root` must be rebuilt
///
/// A missing root is only tolerated for privileged callers, who could
/// create it; anyone else gets [`PkgDbError::RootInaccessible`].
pub fn check(root: &Path, privileged: bool) -> PkgDbResult<Staleness> {
    let root_meta = match fs::metadata(root) {
        Ok(meta) => meta,
        Err(e) if privileged && e.kind() == ErrorKind::NotFound => {
            debug!("Package root {} does not exist", root.display());
            return Ok(Staleness::NoDatabase);
        }
        Err(e) => {
            return Err(PkgDbError::RootInaccessible {
                path: root.to_path_buf(),
                source: e,
            });
        }
    };

    let path = cache_path(root);
    let cache_meta = match fs::metadata(&path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Staleness::Missing(path)),
        Err(e) => return Err(PkgDbError::CacheStat { path, source: e }),
    };

    let stat_err = |e: std::io::Error| PkgDbError::RootInaccessible {
        path: root.to_path_buf(),
        source: e,
    };
    let root_mtime = root_meta.modified().map_err(stat_err)?;
    let cache_mtime = cache_meta.modified().map_err(|e| PkgDbError::CacheStat {
        path: path.clone(),
        source: e,
    })?;

    if root_mtime > cache_mtime {
        Ok(Staleness::Outdated(path))
    } else {
        Ok(Staleness::Fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn set_mtime(path: &Path, time: SystemTime) {
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(time)
            .unwrap();
    }

    #[test]
    fn missing_root_privileged_is_benign() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("absent");
        assert_eq!(check(&root, true).unwrap(), Staleness::NoDatabase);
    }

    #[test]
    fn missing_root_unprivileged_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = check(&dir.path().join("absent"), false).unwrap_err();
        assert!(matches!(err, PkgDbError::RootInaccessible { .. }));
    }

    #[test]
    fn missing_cache_is_stale() {
        let root = TempDir::new().unwrap();
        let staleness = check(root.path(), false).unwrap();
        assert_eq!(staleness, Staleness::Missing(root.path().join("pkgdb.cache")));
        assert!(staleness.needs_rebuild());
    }

    #[test]
    fn older_cache_is_stale() {
        let root = TempDir::new().unwrap();
        let cache = cache_path(root.path());
        fs::write(&cache, b"").unwrap();
        set_mtime(&cache, SystemTime::UNIX_EPOCH + Duration::from_secs(1));

        assert_eq!(check(root.path(), false).unwrap(), Staleness::Outdated(cache));
    }

    #[test]
    fn newer_or_equal_cache_is_fresh() {
        let root = TempDir::new().unwrap();
        let cache = cache_path(root.path());
        fs::write(&cache, b"").unwrap();

        set_mtime(&cache, SystemTime::now() + Duration::from_secs(3600));
        assert_eq!(check(root.path(), false).unwrap(), Staleness::Fresh);

        let root_mtime = fs::metadata(root.path()).unwrap().modified().unwrap();
        set_mtime(&cache, root_mtime);
        let staleness = check(root.path(), false).unwrap();
        assert_eq!(staleness, Staleness::Fresh);
        assert!(!staleness.needs_rebuild());
    }
}
