//! Index builder: sorted records to cdb entries

use super::cdb::CdbWriter;
use super::keys::{int_value, text_value, CacheKey, Field, KeyFormatter};
use crate::error::PkgDbResult;
use crate::manifest::PackageRecord;
use std::io::{Seek, Write};
use tracing::{debug, warn};

/// Outcome of one build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Records indexed, as stored under the count key
    pub records: usize,
    /// Entries written, count entry included
    pub entries: usize,
    /// Entries dropped because their key was too long
    pub skipped: usize,
}

/// Writes the key scheme described in [`super::keys`]
pub struct IndexBuilder<'w, W: Write + Seek> {
    writer: &'w mut CdbWriter<W>,
    keys: KeyFormatter,
    stats: BuildStats,
}

impl<'w, W: Write + Seek> IndexBuilder<'w, W> {
    pub fn new(writer: &'w mut CdbWriter<W>, max_key_len: usize) -> Self {
        Self {
            writer,
            keys: KeyFormatter::new(max_key_len),
            stats: BuildStats::default(),
        }
    }

    /// Add one entry; an over-long key drops only this entry
    fn add(&mut self, key: CacheKey<'_>, value: &[u8]) -> PkgDbResult<()> {
        let key = match self.keys.format(&key) {
            Ok(key) => key,
            Err(e) => {
                warn!("{}: {:.64}...", e, key.to_string());
                self.stats.skipped += 1;
                return Ok(());
            }
        };
        self.writer.add(key.as_bytes(), value)?;
        self.stats.entries += 1;
        Ok(())
    }

    fn add_record(&mut self, pos: usize, record: &PackageRecord) -> PkgDbResult<()> {
        let name_version = record.name_version();

        self.add(CacheKey::Lookup(&name_version), &int_value(pos))?;
        self.add(CacheKey::Lookup(&record.name), &int_value(pos))?;

        for field in Field::ALL {
            let value: &str = match field {
                Field::NameVersion => name_version.as_str(),
                Field::Name => &record.name,
                Field::Version => &record.version,
                Field::Comment => &record.comment,
                Field::Origin => &record.origin,
                Field::Desc => &record.desc,
            };
            self.add(CacheKey::Field(field, pos), &text_value(value))?;
        }

        for (index, dep) in record.deps.iter().enumerate() {
            self.add(CacheKey::Dep { pos, index }, &text_value(&dep.name_version()))?;
        }
        Ok(())
    }

    /// Index `records` in order, then write the count entry
    ///
    /// `records` must already be sorted; position `i` is the index into it.
    pub fn build(mut self, records: &[PackageRecord]) -> PkgDbResult<BuildStats> {
        for (pos, record) in records.iter().enumerate() {
            self.add_record(pos, record)?;
        }

        self.stats.records = records.len();
        self.add(CacheKey::Count, &int_value(records.len()))?;

        debug!(
            "Indexed {} records in {} entries ({} skipped)",
            self.stats.records, self.stats.entries, self.stats.skipped
        );
        Ok(self.stats)
    }
}
