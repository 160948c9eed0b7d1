//! Package database handle

use crate::cache::{self, cache_path, CdbReader, RebuildOutcome, Staleness};
use crate::config::schema::CacheConfig;
use crate::config::Config;
use crate::error::PkgDbResult;
use crate::lock::DbLock;
use crate::manifest::{DefaultLoader, ManifestSource, PackageRecord};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Outcome of [`PackageDb::update_cache`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheUpdate {
    /// The package root does not exist
    NoDatabase,
    /// The cache was already current
    Fresh,
    /// A rebuild ran
    Rebuilt(RebuildOutcome),
}

/// Installed-package database rooted at one directory
pub struct PackageDb<S = DefaultLoader> {
    root: PathBuf,
    cache: CacheConfig,
    source: S,
    privileged: bool,
}

impl PackageDb {
    /// Open the database described by `config`
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.db.dir.clone(), config.cache.clone())
    }

    pub fn new(root: impl Into<PathBuf>, cache: CacheConfig) -> Self {
        Self::with_source(root, cache, DefaultLoader::default())
    }
}

impl<S: ManifestSource> PackageDb<S> {
    /// Use a custom manifest source
    pub fn with_source(root: impl Into<PathBuf>, cache: CacheConfig, source: S) -> Self {
        Self {
            root: root.into(),
            cache,
            source,
            privileged: is_superuser(),
        }
    }

    /// Override the privilege used to judge a missing package root
    pub fn privileged(mut self, privileged: bool) -> Self {
        self.privileged = privileged;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cache_path(&self) -> PathBuf {
        cache_path(&self.root)
    }

    /// Rebuild the cache if the package root changed since it was written
    ///
    /// Staleness is checked again once the lock is held, so a rebuild
    /// finished by another process while we waited is not repeated.
    pub fn update_cache(&self) -> PkgDbResult<CacheUpdate> {
        let staleness = cache::staleness::check(&self.root, self.privileged)?;
        if !staleness.needs_rebuild() {
            if staleness == Staleness::NoDatabase {
                return Ok(CacheUpdate::NoDatabase);
            }
            debug!("Cache {} is up to date", self.cache_path().display());
            return Ok(CacheUpdate::Fresh);
        }

        let _lock = self.lock()?;
        match cache::staleness::check(&self.root, self.privileged)? {
            Staleness::NoDatabase => Ok(CacheUpdate::NoDatabase),
            Staleness::Fresh => {
                debug!("Cache rebuilt by another process");
                Ok(CacheUpdate::Fresh)
            }
            Staleness::Missing(_) | Staleness::Outdated(_) => {
                let outcome = cache::rebuild(&self.root, &self.source, &self.cache)?;
                Ok(CacheUpdate::Rebuilt(outcome))
            }
        }
    }

    /// Rebuild the cache regardless of staleness
    pub fn force_rebuild(&self) -> PkgDbResult<RebuildOutcome> {
        let _lock = self.lock()?;
        cache::rebuild(&self.root, &self.source, &self.cache)
    }

    fn lock(&self) -> PkgDbResult<DbLock> {
        if let Some(lock) = DbLock::try_acquire(&self.root)? {
            return Ok(lock);
        }
        info!("Waiting for another pkgdb process to release {}", self.root.display());
        DbLock::acquire(&self.root)
    }

    /// Open the published cache
    pub fn open_cache(&self) -> PkgDbResult<CdbReader> {
        CdbReader::open(&self.cache_path())
    }

    /// Records in the published cache, in index order
    pub fn cached_records(&self) -> PkgDbResult<Vec<PackageRecord>> {
        cache::read_records(&self.open_cache()?)
    }
}

fn is_superuser() -> bool {
    #[cfg(unix)]
    {
        rustix::process::getuid().is_root()
    }
    #[cfg(not(unix))]
    {
        false
    }
}
