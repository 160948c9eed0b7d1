//! `+MANIFEST` parsing
//!
//! The manifest is a TOML document:
//!
//! ```toml
//! name = "foo"
//! version = "1.0"
//! comment = "Foo utility"
//! origin = "devel/foo"
//! desc = "Longer description"
//!
//! [[deps]]
//! name = "bar"
//! version = "2.3"
//! ```

use super::{ManifestSource, PackageRecord};
use crate::error::{PkgDbError, PkgDbResult};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Manifest file name inside each package directory
pub const MANIFEST_FILE: &str = "+MANIFEST";

/// Loads `<pkg_dir>/+MANIFEST`
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestFile;

impl ManifestFile {
    /// Parse a manifest from a TOML string
    pub fn parse(content: &str, path: &Path) -> PkgDbResult<PackageRecord> {
        let record: PackageRecord =
            toml::from_str(content).map_err(|e| PkgDbError::manifest(path, e.to_string()))?;

        if record.name.is_empty() {
            return Err(PkgDbError::manifest(path, "empty package name"));
        }

        Ok(record)
    }
}

impl ManifestSource for ManifestFile {
    fn load(&self, pkg_dir: &Path) -> PkgDbResult<PackageRecord> {
        let path = pkg_dir.join(MANIFEST_FILE);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(PkgDbError::ManifestMissing(path));
            }
            Err(e) => {
                return Err(PkgDbError::io(format!("reading manifest {}", path.display()), e));
            }
        };

        Self::parse(&content, &path)
    }
}
