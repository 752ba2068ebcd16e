//! Persistence error types.

use thiserror::Error;

/// Errors from snapshot save/load.
///
/// An I/O failure during save is non-fatal to the in-memory mutation that
/// triggered it; the hub surfaces it as a durability warning. A corrupt
/// snapshot at load time makes the hub start empty rather than partially
/// populated.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Disk read/write failure (permissions, disk full, device error)
    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Structurally invalid snapshot file
    #[error("corrupt snapshot: {0}")]
    Corrupt(String),
}
