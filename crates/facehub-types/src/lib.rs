//! # facehub-types
//!
//! Core types for the Feature Hub: embeddings, feature records, search
//! results, and the validated hub configuration.
//!
//! The Feature Hub stores fixed-dimension face embeddings produced by an
//! external extraction pipeline. Every stored vector is unit-normalized at
//! the boundary so similarity reduces to a dot product.

pub mod config;
pub mod embedding;
pub mod error;
pub mod record;

pub use config::{HubConfig, HubConfigBuilder, PrimaryKeyMode, SearchMode};
pub use embedding::Embedding;
pub use error::ConfigError;
pub use record::{FeatureRecord, PrimaryKey, SearchMatch};
