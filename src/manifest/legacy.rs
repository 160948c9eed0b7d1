//! Legacy `+CONTENTS` conversion
//!
//! Older package databases carry a packing list instead of a manifest:
//!
//! ```text
//! @name foo-1.0
//! @comment ORIGIN:devel/foo
//! @pkgdep bar-2.3
//! @comment DEPORIGIN:devel/bar
//! bin/foo
//! ```
//!
//! with the summary in `+COMMENT` and the description in `+DESC`.

use super::{Dependency, ManifestSource, PackageRecord};
use crate::error::{PkgDbError, PkgDbResult};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

pub const CONTENTS_FILE: &str = "+CONTENTS";
pub const COMMENT_FILE: &str = "+COMMENT";
pub const DESC_FILE: &str = "+DESC";

/// Builds a record from legacy packing-list metadata
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyConverter;

/// Split `name-version` at the last dash
fn split_name_version(s: &str) -> Option<(&str, &str)> {
    let (name, version) = s.rsplit_once('-')?;
    if name.is_empty() || version.is_empty() {
        return None;
    }
    Some((name, version))
}

impl LegacyConverter {
    /// Convert the packing list plus the optional comment/description files
    pub fn convert(
        contents: &str,
        comment: Option<&str>,
        desc: Option<&str>,
        path: &Path,
    ) -> PkgDbResult<PackageRecord> {
        let mut name_version = None;
        let mut origin = String::new();
        let mut deps = Vec::new();

        for line in contents.lines() {
            let line = line.trim_end();
            if let Some(rest) = line.strip_prefix("@name ") {
                name_version = Some(rest.trim());
            } else if let Some(rest) = line.strip_prefix("@comment ORIGIN:") {
                origin = rest.trim().to_string();
            } else if let Some(rest) = line.strip_prefix("@pkgdep ") {
                let (name, version) = split_name_version(rest.trim())
                    .ok_or_else(|| PkgDbError::legacy(path, format!("bad @pkgdep: {rest}")))?;
                deps.push(Dependency {
                    name: name.to_string(),
                    version: version.to_string(),
                });
            }
        }

        let name_version = name_version.ok_or_else(|| PkgDbError::legacy(path, "no @name"))?;
        let (name, version) = split_name_version(name_version)
            .ok_or_else(|| PkgDbError::legacy(path, format!("bad @name: {name_version}")))?;

        Ok(PackageRecord {
            name: name.to_string(),
            version: version.to_string(),
            comment: comment
                .and_then(|c| c.lines().next())
                .unwrap_or_default()
                .to_string(),
            origin,
            desc: desc.unwrap_or_default().to_string(),
            deps,
        })
    }
}

fn read_optional(path: &Path) -> PkgDbResult<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(PkgDbError::legacy(path, e.to_string())),
    }
}

impl ManifestSource for LegacyConverter {
    fn load(&self, pkg_dir: &Path) -> PkgDbResult<PackageRecord> {
        let contents_path = pkg_dir.join(CONTENTS_FILE);
        let contents = read_optional(&contents_path)?
            .ok_or_else(|| PkgDbError::legacy(&contents_path, "file not found"))?;
        let comment = read_optional(&pkg_dir.join(COMMENT_FILE))?;
        let desc = read_optional(&pkg_dir.join(DESC_FILE))?;

        Self::convert(&contents, comment.as_deref(), desc.as_deref(), &contents_path)
    }
}
