//! Configuration schema for pkgdb
//!
//! Configuration is stored at `~/.config/pkgdb/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Package database settings
    pub db: DbConfig,

    /// Cache settings
    pub cache: CacheConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
        }
    }
}

/// Package database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// Package root: one subdirectory per installed package
    pub dir: PathBuf,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("/var/db/pkg"),
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Longest key accepted by the index builder, in bytes
    pub max_key_len: usize,

    /// Permission bits applied to the published cache
    pub mode: u32,

    /// Index package directories reached through symbolic links
    pub follow_symlinks: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_key_len: 1024,
            mode: 0o644,
            follow_symlinks: false,
        }
    }
}
