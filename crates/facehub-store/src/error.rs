//! Store error types.

use facehub_types::PrimaryKey;
use thiserror::Error;

/// Errors from feature store operations.
///
/// All variants are recoverable; a failed operation leaves the store
/// unchanged.
#[derive(Debug, Error)]
pub enum StoreError {
    /// MANUAL-mode insert with a key that is already present
    #[error("duplicate primary key: {0}")]
    DuplicateKey(PrimaryKey),

    /// Vector length disagrees with the store's fixed dimension
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Operation on an absent key
    #[error("feature not found: {0}")]
    NotFound(PrimaryKey),

    /// MANUAL mode requires a caller-supplied key
    #[error("manual key mode requires an explicit key")]
    KeyRequired,

    /// AUTO_INCREMENT mode forbids caller-supplied keys
    #[error("auto-increment key mode does not accept an explicit key")]
    KeyNotAllowed,

    /// Auto-increment key space exhausted
    #[error("primary key space exhausted")]
    KeySpaceExhausted,
}
