//! Aggregate hub error type.

use facehub_persist::PersistError;
use facehub_search::SearchError;
use facehub_store::StoreError;
use facehub_types::{ConfigError, PrimaryKey};
use thiserror::Error;

/// Errors surfaced by hub operations.
#[derive(Debug, Error)]
pub enum HubError {
    /// Invalid configuration; fatal to hub construction
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Store operation failure (duplicate key, dimension mismatch, not found)
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Search failure (dimension mismatch, bad threshold override)
    #[error(transparent)]
    Search(#[from] SearchError),

    /// Persistence failure outside a mutation (snapshot load at open)
    #[error(transparent)]
    Persist(#[from] PersistError),

    /// The in-memory mutation committed but the snapshot write failed.
    ///
    /// The store still holds the change; `key` is the record the mutation
    /// produced or touched, so callers lose nothing by this error. Retrying
    /// the save is a caller decision — any later successful mutation also
    /// re-persists the full store.
    #[error("mutation committed in memory but snapshot write failed: {source}")]
    Durability {
        /// Key the mutation produced or touched, when it has one
        key: Option<PrimaryKey>,
        source: PersistError,
    },
}
