//! Package directory scanning, record collection and ordering

use crate::error::{PkgDbError, PkgDbResult};
use crate::manifest::{ManifestSource, PackageRecord};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

/// List the package directories directly under `root`
///
/// Symbolic links are skipped unless `follow_symlinks` is set, in which case
/// links resolving to directories are included.
pub fn scan_package_dirs(root: &Path, follow_symlinks: bool) -> PkgDbResult<Vec<PathBuf>> {
    let entries = fs::read_dir(root)
        .map_err(|e| PkgDbError::io(format!("reading package root {}", root.display()), e))?;

    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PkgDbError::io("reading package root entry", e))?;
        let file_type = entry
            .file_type()
            .map_err(|e| PkgDbError::io(format!("stat {}", entry.path().display()), e))?;
        let path = entry.path();

        if file_type.is_dir() {
            dirs.push(path);
        } else if file_type.is_symlink() {
            if !follow_symlinks {
                debug!("Skipping symlinked package directory {}", path.display());
                continue;
            }
            match fs::metadata(&path) {
                Ok(meta) if meta.is_dir() => dirs.push(path),
                Ok(_) => {}
                Err(e) => warn!("{}: dangling symlink: {}", path.display(), e),
            }
        }
    }

    debug!("Found {} package directories in {}", dirs.len(), root.display());
    Ok(dirs)
}

/// Load one record per package directory, skipping those that fail to load
///
/// Bad metadata is a warning; an I/O failure inside a package directory is
/// logged as an error but still only drops that package.
pub fn collect_records<S: ManifestSource>(dirs: &[PathBuf], source: &S) -> Vec<PackageRecord> {
    let mut records = Vec::with_capacity(dirs.len());
    for dir in dirs {
        match source.load(dir) {
            Ok(record) => records.push(record),
            Err(e) if e.is_recoverable() => warn!("{}: {}, skipping", dir.display(), e),
            Err(e) => error!("{}: {}, skipping", dir.display(), e),
        }
    }
    records
}

/// Order records by name, then version
///
/// Records equal on both fall back to their remaining fields, so the
/// result does not depend on directory enumeration order.
pub fn sort_records(records: &mut [PackageRecord]) {
    records.sort_unstable_by(|a, b| a.index_cmp(b).then_with(|| a.cmp(b)));
}
