//! Cache key scheme and value encodings
//!
//! For the record at sorted position `i`:
//!
//! | Key | Value |
//! |-----|-------|
//! | `<name>-<version>` | `i` (native `usize`) |
//! | `<name>` | `i` (native `usize`) |
//! | `{i}nv` `{i}n` `{i}v` `{i}c` `{i}o` `{i}d` | field text, NUL-terminated |
//! | `{i}D{j}` | `<dep-name>-<dep-version>` of dependency `j`, NUL-terminated |
//!
//! plus [`COUNT_KEY`] holding the record count (native `usize`).

use crate::error::{PkgDbError, PkgDbResult};
use std::fmt;

/// Reserved key for the number of indexed records
pub const COUNT_KEY: &str = "count";

/// Position-keyed text fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    NameVersion,
    Name,
    Version,
    Comment,
    Origin,
    Desc,
}

impl Field {
    /// Emission order of the per-record field entries
    pub const ALL: [Field; 6] = [
        Field::NameVersion,
        Field::Name,
        Field::Version,
        Field::Comment,
        Field::Origin,
        Field::Desc,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            Self::NameVersion => "nv",
            Self::Name => "n",
            Self::Version => "v",
            Self::Comment => "c",
            Self::Origin => "o",
            Self::Desc => "d",
        }
    }
}

/// A key in the cache store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKey<'a> {
    /// Lookup by `name-version` or bare `name`
    Lookup(&'a str),
    Field(Field, usize),
    Dep { pos: usize, index: usize },
    Count,
}

impl fmt::Display for CacheKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lookup(s) => f.write_str(s),
            Self::Field(field, pos) => write!(f, "{}{}", pos, field.tag()),
            Self::Dep { pos, index } => write!(f, "{}D{}", pos, index),
            Self::Count => f.write_str(COUNT_KEY),
        }
    }
}

/// Formats keys, refusing any longer than `max_len` bytes
#[derive(Debug, Clone, Copy)]
pub struct KeyFormatter {
    max_len: usize,
}

impl KeyFormatter {
    pub fn new(max_len: usize) -> Self {
        Self { max_len }
    }

    pub fn format(&self, key: &CacheKey<'_>) -> PkgDbResult<String> {
        let key = key.to_string();
        if key.len() > self.max_len {
            return Err(PkgDbError::KeyTooLong {
                len: key.len(),
                max: self.max_len,
            });
        }
        Ok(key)
    }
}

/// Fixed-width binary value: a native-endian machine word
pub fn int_value(value: usize) -> [u8; std::mem::size_of::<usize>()] {
    value.to_ne_bytes()
}

/// Decode a value written by [`int_value`]
pub fn decode_int(bytes: &[u8]) -> Option<usize> {
    bytes.try_into().ok().map(usize::from_ne_bytes)
}

/// Text value with its terminating NUL
pub fn text_value(value: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(value.len() + 1);
    bytes.extend_from_slice(value.as_bytes());
    bytes.push(0);
    bytes
}

/// Decode a value written by [`text_value`]
pub fn decode_text(bytes: &[u8]) -> Option<&str> {
    let text = bytes.strip_suffix(&[0u8])?;
    std::str::from_utf8(text).ok()
}
