//! Installed-package manifests
//!
//! A package directory is turned into a [`PackageRecord`] by a
//! [`ManifestSource`]. The default source reads the TOML `+MANIFEST` file
//! and falls back to converting the legacy `+CONTENTS` metadata.

pub mod legacy;
pub mod primary;

pub use legacy::LegacyConverter;
pub use primary::ManifestFile;

use crate::error::PkgDbResult;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::Path;
use tracing::warn;

/// One dependency of an installed package
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    pub version: String,
}

impl Dependency {
    /// `<name>-<version>`
    pub fn name_version(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }
}

/// Manifest fields indexed by the cache
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackageRecord {
    /// Package name (never empty)
    pub name: String,

    pub version: String,

    /// One-line summary
    #[serde(default)]
    pub comment: String,

    /// Ports origin, e.g. `devel/foo`
    #[serde(default)]
    pub origin: String,

    /// Long description
    #[serde(default)]
    pub desc: String,

    /// Dependencies in manifest order
    #[serde(default)]
    pub deps: Vec<Dependency>,
}

impl PackageRecord {
    /// `<name>-<version>`
    pub fn name_version(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }

    /// Index ordering: by name, then version.
    pub fn index_cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.version.cmp(&other.version))
    }
}

/// Loads a package record from an installed package's directory
pub trait ManifestSource {
    fn load(&self, pkg_dir: &Path) -> PkgDbResult<PackageRecord>;
}

impl<T: ManifestSource + ?Sized> ManifestSource for &T {
    fn load(&self, pkg_dir: &Path) -> PkgDbResult<PackageRecord> {
        (**self).load(pkg_dir)
    }
}

/// Tries `primary`, then `fallback` when the primary source fails
#[derive(Debug, Clone, Default)]
pub struct FallbackLoader<P, F> {
    primary: P,
    fallback: F,
}

impl<P, F> FallbackLoader<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P: ManifestSource, F: ManifestSource> ManifestSource for FallbackLoader<P, F> {
    fn load(&self, pkg_dir: &Path) -> PkgDbResult<PackageRecord> {
        match self.primary.load(pkg_dir) {
            Ok(record) => Ok(record),
            Err(e) => {
                warn!("{}, converting legacy metadata", e);
                self.fallback.load(pkg_dir)
            }
        }
    }
}

/// `+MANIFEST` first, legacy `+CONTENTS` second
pub type DefaultLoader = FallbackLoader<ManifestFile, LegacyConverter>;
