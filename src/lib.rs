//! pkgdb - installed-package database
//!
//! Keeps a cdb lookup cache over the manifests of installed packages,
//! rebuilt atomically whenever the package root changes.

pub mod cache;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod lock;
pub mod manifest;

pub use db::{CacheUpdate, PackageDb};
pub use error::{PkgDbError, PkgDbResult};
