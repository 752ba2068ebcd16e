//! # facehub
//!
//! The Feature Hub: a concurrent, optionally persistent store of
//! fixed-dimension face embeddings with threshold-gated similarity search.
//!
//! A hub is configured once through a validated, immutable [`HubConfig`]
//! and then serves `insert`/`remove`/`update`/`get`/`search` from any
//! number of threads. Reads run concurrently under a shared lock; writes
//! are serialized. With persistence enabled, every mutation is followed by
//! an atomic snapshot of the whole store to a single file, which is
//! reloaded the next time a hub opens on the same path.
//!
//! ```no_run
//! use facehub::{FeatureHub, HubConfig};
//!
//! let config = HubConfig::builder()
//!     .persistence_path("/var/lib/facehub/hub.db")
//!     .search_threshold(0.48)
//!     .build()?;
//! let hub = FeatureHub::open(config)?;
//!
//! let key = hub.insert(vec![0.1; 512], None, Some("alice".into()))?;
//! if let Some(hit) = hub.search(&vec![0.1; 512])? {
//!     assert_eq!(hit.key, key);
//! }
//! # Ok::<(), facehub::HubError>(())
//! ```

pub mod error;
pub mod hub;

pub use error::HubError;
pub use hub::FeatureHub;

pub use facehub_persist::PersistError;
pub use facehub_search::SearchError;
pub use facehub_store::StoreError;
pub use facehub_types::{
    ConfigError, Embedding, FeatureRecord, HubConfig, HubConfigBuilder, PrimaryKey,
    PrimaryKeyMode, SearchMatch, SearchMode,
};
