//! Configuration error type.

use thiserror::Error;

/// Errors that make a hub configuration unusable.
///
/// All variants are fatal to hub construction; a `HubConfig` that passed
/// validation never produces these afterwards.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Search threshold outside [0, 1]
    #[error("search threshold must be in [0.0, 1.0], got {0}")]
    ThresholdOutOfRange(f32),

    /// Persistence enabled without a database path
    #[error("persistence is enabled but no database path was provided")]
    MissingPersistencePath,

    /// Persistence path cannot be created or written
    #[error("persistence path {path:?} is not writable: {reason}")]
    PathNotWritable { path: String, reason: String },

    /// Configured key policy disagrees with a non-empty persisted store
    #[error(
        "configured primary key mode {configured:?} conflicts with persisted mode {persisted:?} \
         on a non-empty store"
    )]
    KeyPolicyConflict {
        configured: crate::config::PrimaryKeyMode,
        persisted: crate::config::PrimaryKeyMode,
    },

    /// Configured dimension disagrees with a non-empty persisted store
    #[error(
        "configured dimension {configured} conflicts with persisted dimension {persisted} \
         on a non-empty store"
    )]
    DimensionConflict { configured: usize, persisted: usize },

    /// Embedding dimension fixed in the configuration must be non-zero
    #[error("configured embedding dimension must be non-zero")]
    ZeroDimension,
}
