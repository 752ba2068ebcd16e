//! # facehub-persist
//!
//! Crash-safe snapshot persistence for the Feature Hub.
//!
//! The whole store is serialized to a single binary file: a fixed header
//! (magic, format version, key mode, dimension, auto-key high-water mark,
//! record count) followed by one entry per record. Saves go through a
//! temp-file-plus-rename sequence so an observer never sees a partially
//! written snapshot, even across a crash mid-write. Loads validate the
//! structure exhaustively and refuse to partially populate a store.

pub mod error;
pub mod snapshot;
pub mod writer;

pub use error::PersistError;
pub use snapshot::{Snapshot, FORMAT_VERSION, MAGIC};
pub use writer::{check_writable, load, SnapshotWriter};
