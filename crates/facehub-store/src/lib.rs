//! # facehub-store
//!
//! Authoritative in-memory table of face features for the Feature Hub.
//!
//! The store owns every `FeatureRecord`, preserves insertion order for
//! enumeration, and delegates key assignment to the [`KeyAllocator`]. It is
//! a plain data structure with no interior locking; the hub façade wraps it
//! in a reader-writer lock.

pub mod allocator;
pub mod error;
pub mod store;

pub use allocator::KeyAllocator;
pub use error::StoreError;
pub use store::FeatureStore;
