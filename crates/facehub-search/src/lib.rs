//! # facehub-search
//!
//! Similarity search over the feature store.
//!
//! Two strategies behind one engine:
//! - **Exhaustive**: linear scan, exact best match, lowest-key tie-break.
//! - **Approximate**: random-hyperplane bucket index probed by Hamming
//!   distance, falling back to the exhaustive scan while the store is
//!   below a population floor.
//!
//! The similarity threshold is a hard gate: a best match below it is
//! reported as no match at all.

pub mod bucket;
pub mod engine;
pub mod error;
pub mod exhaustive;

pub use bucket::{BucketIndex, DEFAULT_POPULATION_FLOOR};
pub use engine::SearchEngine;
pub use error::SearchError;
