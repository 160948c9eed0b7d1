//! Package database lookup cache
//!
//! A cdb index over every installed package's manifest, kept at
//! `<package-root>/pkgdb.cache`. The cache is derived data: it is rebuilt
//! from the manifests whenever the package root is newer than it, and
//! never edited in place.
//!
//! # Rebuild pipeline
//!
//! | Step | Module |
//! |------|--------|
//! | Staleness check | [`staleness`] |
//! | Scan package directories | [`scan`] |
//! | Load and sort records | [`scan`] |
//! | Write keys | [`builder`], [`keys`] |
//! | Rename into place | [`publish`] |
//!
//! Callers hold the package database lock across the whole rebuild; see
//! [`crate::db::PackageDb`].

pub mod builder;
pub mod cdb;
pub mod keys;
pub mod publish;
pub mod scan;
pub mod staleness;

pub use builder::{BuildStats, IndexBuilder};
pub use cdb::{CdbReader, CdbWriter};
pub use publish::AtomicPublisher;
pub use staleness::{cache_path, Staleness};

use crate::config::schema::CacheConfig;
use crate::error::PkgDbResult;
use crate::manifest::{Dependency, ManifestSource, PackageRecord};
use keys::{decode_int, decode_text, CacheKey, Field};
use std::path::Path;
use tracing::{info, warn};

/// Cache file name inside the package root
pub const CACHE_FILE: &str = "pkgdb.cache";

/// What a rebuild did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildOutcome {
    /// No package directories were found; any existing cache is untouched
    NoPackages,
    /// A new cache was published
    Published(BuildStats),
}

/// Rebuild the cache for `root` from scratch
///
/// Packages whose metadata cannot be loaded are skipped with a warning.
/// Store write failures abort the rebuild and leave the old cache in place.
pub fn rebuild<S: ManifestSource>(
    root: &Path,
    source: &S,
    config: &CacheConfig,
) -> PkgDbResult<RebuildOutcome> {
    info!("Rebuilding cache for {}", root.display());

    let dirs = scan::scan_package_dirs(root, config.follow_symlinks)?;
    if dirs.is_empty() {
        warn!("No packages found in {}, cache not written", root.display());
        return Ok(RebuildOutcome::NoPackages);
    }

    let mut records = scan::collect_records(&dirs, source);
    scan::sort_records(&mut records);

    let publisher = AtomicPublisher::new(cache_path(root), config.mode);
    let stats = publisher.publish(|writer| {
        IndexBuilder::new(writer, config.max_key_len).build(&records)
    })?;

    info!(
        "Cache {} written with {} packages",
        publisher.cache_path().display(),
        stats.records
    );
    Ok(RebuildOutcome::Published(stats))
}

/// Decode every record stored in a published cache, in index order
///
/// Entries are walked in file order rather than looked up by key: a bare
/// package name such as `0d` shares its key with a field entry, and only
/// the write order tells the two apart. Each record is written as up to two
/// lookup entries, its six field entries, then its dependency entries.
pub fn read_records(reader: &CdbReader) -> PkgDbResult<Vec<PackageRecord>> {
    let count = reader
        .get_all(keys::COUNT_KEY.as_bytes())?
        .last()
        .and_then(|v| decode_int(v))
        .ok_or_else(|| reader.corrupt("missing record count"))?;

    let entries = reader.records()?;
    let text = |key: &[u8], value: &[u8]| -> PkgDbResult<String> {
        decode_text(value).map(str::to_string).ok_or_else(|| {
            reader.corrupt(format!(
                "bad text value for {}",
                String::from_utf8_lossy(key)
            ))
        })
    };

    let mut cursor = 0;
    let mut records = Vec::with_capacity(count);
    for pos in 0..count {
        let field_keys: Vec<String> = Field::ALL
            .iter()
            .map(|&field| CacheKey::Field(field, pos).to_string())
            .collect();

        // skip the lookup entries (either may have been dropped as too long)
        let start = (cursor..=cursor + 2)
            .find(|&at| {
                entries.get(at..at + field_keys.len()).is_some_and(|run| {
                    run.iter()
                        .zip(&field_keys)
                        .all(|((key, _), want)| *key == want.as_bytes())
                })
            })
            .ok_or_else(|| reader.corrupt(format!("missing field entries for record {pos}")))?;

        let mut fields = Vec::with_capacity(field_keys.len());
        for (key, value) in &entries[start..start + field_keys.len()] {
            fields.push(text(*key, *value)?);
        }
        cursor = start + field_keys.len();

        let mut deps = Vec::new();
        loop {
            let dep_key = CacheKey::Dep { pos, index: deps.len() }.to_string();
            let Some((key, value)) = entries.get(cursor) else {
                break;
            };
            if *key != dep_key.as_bytes() {
                break;
            }
            let dep = text(*key, *value)?;
            let (name, version) = dep.rsplit_once('-').unwrap_or((dep.as_str(), ""));
            deps.push(Dependency {
                name: name.to_string(),
                version: version.to_string(),
            });
            cursor += 1;
        }

        let [_, name, version, comment, origin, desc]: [String; 6] = fields
            .try_into()
            .map_err(|_| reader.corrupt(format!("bad field entries for record {pos}")))?;
        records.push(PackageRecord {
            name,
            version,
            comment,
            origin,
            desc,
            deps,
        });
    }
    Ok(records)
}
