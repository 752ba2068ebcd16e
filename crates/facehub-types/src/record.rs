//! Feature records and search results.

use serde::{Deserialize, Serialize};

use crate::embedding::Embedding;

/// Identifier of a stored feature.
///
/// Assigned by the hub under AUTO_INCREMENT, or supplied by the caller
/// under MANUAL. Unique within a store at all times.
pub type PrimaryKey = u64;

/// A stored face feature: key, normalized embedding, and an optional
/// caller-supplied tag (a person name or external id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Primary key (immutable after insertion)
    pub key: PrimaryKey,
    /// Normalized embedding vector
    pub vector: Embedding,
    /// Opaque caller label carried alongside the vector
    #[serde(default)]
    pub tag: Option<String>,
}

impl FeatureRecord {
    pub fn new(key: PrimaryKey, vector: Embedding, tag: Option<String>) -> Self {
        Self { key, vector, tag }
    }
}

/// Best match returned by a search that cleared the similarity threshold.
///
/// A search that finds nothing above the threshold returns `None` rather
/// than a match with a `found` flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchMatch {
    /// Key of the matched record
    pub key: PrimaryKey,
    /// Cosine similarity between query and match, in [-1, 1]
    pub similarity: f32,
    /// Tag of the matched record, if any
    pub tag: Option<String>,
}

impl SearchMatch {
    pub fn new(key: PrimaryKey, similarity: f32, tag: Option<String>) -> Self {
        Self {
            key,
            similarity,
            tag,
        }
    }
}
