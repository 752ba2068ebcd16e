//! Snapshot binary codec.
//!
//! Little-endian layout:
//!
//! ```text
//! header: magic "FHUB" | version u16 | key mode u8 | reserved u8
//!       | dimension u32 | next auto key u64 | record count u64
//! entry:  key u64 | dimension x f32 | tag length u32 | tag utf-8 bytes
//! ```
//!
//! Decoding validates magic, version, mode byte, key uniqueness, and exact
//! byte lengths; any truncation or trailing garbage is a corrupt snapshot.

use std::collections::HashSet;

use facehub_store::FeatureStore;
use facehub_types::{Embedding, FeatureRecord, PrimaryKey, PrimaryKeyMode};

use crate::error::PersistError;

/// File magic, first four bytes of every snapshot.
pub const MAGIC: &[u8; 4] = b"FHUB";

/// Current snapshot format version.
pub const FORMAT_VERSION: u16 = 1;

const HEADER_LEN: usize = 4 + 2 + 1 + 1 + 4 + 8 + 8;

/// A point-in-time copy of the store contents, decoupled from the live
/// store so disk writes can happen outside the hub's write lock.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub key_mode: PrimaryKeyMode,
    pub dimension: Option<usize>,
    pub next_key: PrimaryKey,
    pub records: Vec<FeatureRecord>,
}

impl Snapshot {
    /// Capture the current contents of a store.
    pub fn of_store(store: &FeatureStore) -> Self {
        Self {
            key_mode: store.key_mode(),
            dimension: store.dimension(),
            next_key: store.next_auto_key(),
            records: store.iter().cloned().collect(),
        }
    }

    /// Rebuild a live store from this snapshot.
    pub fn into_store(self) -> FeatureStore {
        FeatureStore::restore(self.key_mode, self.next_key, self.dimension, self.records)
    }

    /// Serialize to the on-disk byte layout.
    pub fn encode(&self) -> Vec<u8> {
        let dimension = self.dimension.unwrap_or(0);
        let mut buf = Vec::with_capacity(
            HEADER_LEN + self.records.len() * (8 + dimension * 4 + 4),
        );

        buf.extend_from_slice(MAGIC);
        buf.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        buf.push(mode_byte(self.key_mode));
        buf.push(0); // reserved
        buf.extend_from_slice(&(dimension as u32).to_le_bytes());
        buf.extend_from_slice(&self.next_key.to_le_bytes());
        buf.extend_from_slice(&(self.records.len() as u64).to_le_bytes());

        for record in &self.records {
            buf.extend_from_slice(&record.key.to_le_bytes());
            for value in &record.vector.values {
                buf.extend_from_slice(&value.to_le_bytes());
            }
            let tag = record.tag.as_deref().unwrap_or("");
            buf.extend_from_slice(&(tag.len() as u32).to_le_bytes());
            buf.extend_from_slice(tag.as_bytes());
        }

        buf
    }

    /// Deserialize and validate a snapshot.
    pub fn decode(bytes: &[u8]) -> Result<Self, PersistError> {
        let mut cursor = Cursor::new(bytes);

        let magic = cursor.take(4)?;
        if magic != MAGIC {
            return Err(PersistError::Corrupt("bad magic".into()));
        }
        let version = u16::from_le_bytes(cursor.take(2)?.try_into().unwrap());
        if version != FORMAT_VERSION {
            return Err(PersistError::Corrupt(format!(
                "unsupported format version {version}"
            )));
        }
        let key_mode = parse_mode(cursor.take(1)?[0])?;
        let _reserved = cursor.take(1)?;
        let dimension = u32::from_le_bytes(cursor.take(4)?.try_into().unwrap()) as usize;
        let next_key = u64::from_le_bytes(cursor.take(8)?.try_into().unwrap());
        let count = u64::from_le_bytes(cursor.take(8)?.try_into().unwrap()) as usize;

        if count > 0 && dimension == 0 {
            return Err(PersistError::Corrupt(
                "non-empty snapshot with zero dimension".into(),
            ));
        }

        let mut records = Vec::with_capacity(count.min(1 << 20));
        let mut seen = HashSet::with_capacity(count.min(1 << 20));
        for _ in 0..count {
            let key = u64::from_le_bytes(cursor.take(8)?.try_into().unwrap());
            if !seen.insert(key) {
                return Err(PersistError::Corrupt(format!("duplicate key {key}")));
            }

            let mut values = Vec::with_capacity(dimension);
            for _ in 0..dimension {
                values.push(f32::from_le_bytes(cursor.take(4)?.try_into().unwrap()));
            }

            let tag_len = u32::from_le_bytes(cursor.take(4)?.try_into().unwrap()) as usize;
            let tag = if tag_len == 0 {
                None
            } else {
                let raw = cursor.take(tag_len)?;
                Some(String::from_utf8(raw.to_vec()).map_err(|_| {
                    PersistError::Corrupt(format!("invalid tag encoding for key {key}"))
                })?)
            };

            // Vectors were normalized before being written
            records.push(FeatureRecord::new(key, Embedding::from_normalized(values), tag));
        }

        if !cursor.is_at_end() {
            return Err(PersistError::Corrupt("trailing bytes after records".into()));
        }

        Ok(Self {
            key_mode,
            dimension: if dimension == 0 { None } else { Some(dimension) },
            next_key,
            records,
        })
    }
}

fn mode_byte(mode: PrimaryKeyMode) -> u8 {
    match mode {
        PrimaryKeyMode::AutoIncrement => 0,
        PrimaryKeyMode::Manual => 1,
    }
}

fn parse_mode(byte: u8) -> Result<PrimaryKeyMode, PersistError> {
    match byte {
        0 => Ok(PrimaryKeyMode::AutoIncrement),
        1 => Ok(PrimaryKeyMode::Manual),
        other => Err(PersistError::Corrupt(format!("unknown key mode {other}"))),
    }
}

/// Bounds-checked reader over the snapshot bytes.
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], PersistError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| PersistError::Corrupt("truncated snapshot".into()))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn is_at_end(&self) -> bool {
        self.pos == self.bytes.len()
    }
}
