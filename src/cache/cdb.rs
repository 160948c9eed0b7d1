//! Constant database (cdb) store
//!
//! Layout, all integers little-endian `u32`:
//!
//! | Section | Contents |
//! |---------|----------|
//! | header  | 256 × (table position, slot count) |
//! | records | klen, dlen, key bytes, data bytes |
//! | tables  | 256 hash tables of (hash, record position) slots |
//!
//! Duplicate keys are kept; lookups see them in insertion order.

use crate::error::{PkgDbError, PkgDbResult};
use std::fs;
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

const HEADER_LEN: u32 = 256 * 8;

/// djb hash used for bucket selection and probing
pub fn hash(key: &[u8]) -> u32 {
    key.iter()
        .fold(5381u32, |h, &b| (h << 5).wrapping_add(h) ^ u32::from(b))
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    hash: u32,
    pos: u32,
}

/// Streams records into a cdb file
pub struct CdbWriter<W: Write + Seek> {
    out: BufWriter<W>,
    pos: u32,
    slots: Vec<Slot>,
}

impl<W: Write + Seek> CdbWriter<W> {
    /// Start a store, reserving space for the header
    pub fn new(inner: W) -> PkgDbResult<Self> {
        let mut out = BufWriter::new(inner);
        out.seek(SeekFrom::Start(0))
            .and_then(|_| out.write_all(&[0u8; HEADER_LEN as usize]))
            .map_err(|e| PkgDbError::io("writing cdb header", e))?;

        Ok(Self {
            out,
            pos: HEADER_LEN,
            slots: Vec::new(),
        })
    }

    fn advance(&mut self, len: usize) -> PkgDbResult<()> {
        let next = u64::from(self.pos) + len as u64;
        self.pos = u32::try_from(next).map_err(|_| PkgDbError::StoreTooLarge(next))?;
        Ok(())
    }

    /// Append one key/value record
    pub fn add(&mut self, key: &[u8], data: &[u8]) -> PkgDbResult<()> {
        let klen = u32::try_from(key.len()).map_err(|_| PkgDbError::StoreTooLarge(key.len() as u64))?;
        let dlen =
            u32::try_from(data.len()).map_err(|_| PkgDbError::StoreTooLarge(data.len() as u64))?;

        let pos = self.pos;
        self.advance(8 + key.len() + data.len())?;

        let write = |out: &mut BufWriter<W>| -> io::Result<()> {
            out.write_all(&klen.to_le_bytes())?;
            out.write_all(&dlen.to_le_bytes())?;
            out.write_all(key)?;
            out.write_all(data)
        };
        write(&mut self.out).map_err(|e| PkgDbError::io("writing cdb record", e))?;

        self.slots.push(Slot {
            hash: hash(key),
            pos,
        });
        Ok(())
    }

    /// Write the hash tables and header, returning the flushed sink
    pub fn finish(mut self) -> PkgDbResult<W> {
        let mut buckets: Vec<Vec<Slot>> = vec![Vec::new(); 256];
        for slot in &self.slots {
            buckets[(slot.hash & 0xff) as usize].push(*slot);
        }

        let mut header = Vec::with_capacity(HEADER_LEN as usize);
        for bucket in &buckets {
            let len = bucket.len() * 2;
            header.extend_from_slice(&self.pos.to_le_bytes());
            header.extend_from_slice(&(len as u32).to_le_bytes());

            if len == 0 {
                continue;
            }

            let mut table = vec![Slot { hash: 0, pos: 0 }; len];
            for slot in bucket {
                let mut at = (slot.hash >> 8) as usize % len;
                while table[at].pos != 0 {
                    at = (at + 1) % len;
                }
                table[at] = *slot;
            }

            let mut bytes = Vec::with_capacity(len * 8);
            for slot in &table {
                bytes.extend_from_slice(&slot.hash.to_le_bytes());
                bytes.extend_from_slice(&slot.pos.to_le_bytes());
            }
            self.advance(bytes.len())?;
            self.out
                .write_all(&bytes)
                .map_err(|e| PkgDbError::io("writing cdb hash table", e))?;
        }

        self.out
            .seek(SeekFrom::Start(0))
            .and_then(|_| self.out.write_all(&header))
            .and_then(|_| self.out.flush())
            .map_err(|e| PkgDbError::io("writing cdb header", e))?;

        self.out
            .into_inner()
            .map_err(|e| PkgDbError::io("flushing cdb store", e.into_error()))
    }
}

/// In-memory reader for a finished cdb file
#[derive(Debug, Clone)]
pub struct CdbReader {
    path: PathBuf,
    data: Vec<u8>,
}

impl CdbReader {
    /// Read and validate a cdb file
    pub fn open(path: &Path) -> PkgDbResult<Self> {
        let data = fs::read(path)
            .map_err(|e| PkgDbError::io(format!("reading cache {}", path.display()), e))?;
        Self::from_bytes(path, data)
    }

    pub fn from_bytes(path: &Path, data: Vec<u8>) -> PkgDbResult<Self> {
        let reader = Self {
            path: path.to_path_buf(),
            data,
        };
        if reader.data.len() < HEADER_LEN as usize {
            return Err(reader.corrupt("short header"));
        }
        Ok(reader)
    }

    pub(crate) fn corrupt(&self, reason: impl Into<String>) -> PkgDbError {
        PkgDbError::CacheCorrupt {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }

    fn u32_at(&self, at: usize) -> PkgDbResult<u32> {
        self.data
            .get(at..at + 4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .ok_or_else(|| self.corrupt(format!("offset {at} out of bounds")))
    }

    /// Record at `pos`: (key, data, next record position)
    fn record_at(&self, pos: usize) -> PkgDbResult<(&[u8], &[u8], usize)> {
        let klen = self.u32_at(pos)? as usize;
        let dlen = self.u32_at(pos + 4)? as usize;
        let key_start = pos + 8;
        let data_start = key_start + klen;
        let end = data_start + dlen;
        if end > self.data.len() {
            return Err(self.corrupt(format!("record at {pos} overruns file")));
        }
        Ok((&self.data[key_start..data_start], &self.data[data_start..end], end))
    }

    /// All values stored under `key`, in insertion order
    pub fn get_all(&self, key: &[u8]) -> PkgDbResult<Vec<&[u8]>> {
        let h = hash(key);
        let bucket = (h & 0xff) as usize * 8;
        let table_pos = self.u32_at(bucket)? as usize;
        let table_len = self.u32_at(bucket + 4)? as usize;

        let mut found = Vec::new();
        if table_len == 0 {
            return Ok(found);
        }

        let mut at = (h >> 8) as usize % table_len;
        for _ in 0..table_len {
            let slot = table_pos + at * 8;
            let slot_hash = self.u32_at(slot)?;
            let pos = self.u32_at(slot + 4)? as usize;
            if pos == 0 {
                break;
            }
            if slot_hash == h {
                let (k, v, _) = self.record_at(pos)?;
                if k == key {
                    found.push(v);
                }
            }
            at = (at + 1) % table_len;
        }
        Ok(found)
    }

    /// First value stored under `key`
    pub fn get(&self, key: &[u8]) -> PkgDbResult<Option<&[u8]>> {
        Ok(self.get_all(key)?.into_iter().next())
    }

    /// Every record in file order
    pub fn records(&self) -> PkgDbResult<Vec<(&[u8], &[u8])>> {
        let end = self.u32_at(0)? as usize;
        let mut pos = HEADER_LEN as usize;
        let mut out = Vec::new();
        while pos < end {
            let (k, v, next) = self.record_at(pos)?;
            out.push((k, v));
            pos = next;
        }
        Ok(out)
    }
}
