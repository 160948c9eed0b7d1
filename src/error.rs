//! Error types for pkgdb
//!
//! All modules use `PkgDbResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pkgdb operations
pub type PkgDbResult<T> = Result<T, PkgDbError>;

/// All errors that can occur in pkgdb
#[derive(Error, Debug)]
pub enum PkgDbError {
    // Package root errors
    #[error("Package database {path} is not accessible: {source}")]
    RootInaccessible {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot stat cache file {path}: {source}")]
    CacheStat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to lock package database {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Cache store errors
    #[error("Key too long: {len} bytes (max {max})")]
    KeyTooLong { len: usize, max: usize },

    #[error("Cache store too large: {0} bytes exceeds the 4 GiB cdb limit")]
    StoreTooLarge(u64),

    #[error("Corrupt cache file {path}: {reason}")]
    CacheCorrupt { path: PathBuf, reason: String },

    // Manifest errors
    #[error("Manifest not found: {0}")]
    ManifestMissing(PathBuf),

    #[error("Invalid manifest {path}: {reason}")]
    ManifestParse { path: PathBuf, reason: String },

    #[error("Legacy conversion failed for {path}: {reason}")]
    LegacyConvert { path: PathBuf, reason: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl PkgDbError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a manifest parse error
    pub fn manifest(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ManifestParse {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a legacy conversion error
    pub fn legacy(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::LegacyConvert {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Errors caused by bad data in a single package or cache entry,
    /// rather than by the system.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::KeyTooLong { .. }
                | Self::ManifestMissing(_)
                | Self::ManifestParse { .. }
                | Self::LegacyConvert { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::RootInaccessible { .. } => {
                Some("Check --db-dir / PKG_DBDIR, or run as root to tolerate a missing database")
            }
            Self::Lock { .. } => Some("Another pkgdb process may be rebuilding; retry shortly"),
            Self::CacheCorrupt { .. } => Some("Run: pkgdb cache rebuild"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = PkgDbError::KeyTooLong { len: 2000, max: 1024 };
        assert_eq!(err.to_string(), "Key too long: 2000 bytes (max 1024)");
    }

    #[test]
    fn error_hint() {
        let err = PkgDbError::CacheCorrupt {
            path: PathBuf::from("/var/db/pkg/pkgdb.cache"),
            reason: "short header".to_string(),
        };
        assert_eq!(err.hint(), Some("Run: pkgdb cache rebuild"));
        assert_eq!(PkgDbError::StoreTooLarge(1).hint(), None);
    }

    #[test]
    fn error_recoverable() {
        assert!(PkgDbError::manifest("/x/+MANIFEST", "bad").is_recoverable());
        assert!(PkgDbError::KeyTooLong { len: 1, max: 0 }.is_recoverable());
        let fatal = PkgDbError::io("writing cache", std::io::Error::other("disk full"));
        assert!(!fatal.is_recoverable());
    }
}
