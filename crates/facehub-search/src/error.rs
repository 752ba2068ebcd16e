//! Search error types.

use thiserror::Error;

/// Errors from search operations. A failed search never touches the store.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Query length disagrees with the store's fixed dimension
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Per-call threshold override outside [0, 1]
    #[error("search threshold must be in [0.0, 1.0], got {0}")]
    ThresholdOutOfRange(f32),
}
