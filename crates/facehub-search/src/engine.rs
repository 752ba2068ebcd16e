//! Search engine: strategy dispatch and threshold gate.

use facehub_store::FeatureStore;
use facehub_types::{Embedding, FeatureRecord, SearchMatch, SearchMode};
use tracing::debug;

use crate::bucket::BucketIndex;
use crate::error::SearchError;
use crate::exhaustive;

/// Computes the best match for a query under a configured mode and
/// threshold. Stateless apart from configuration; the store and bucket
/// index are passed in per call under the hub's read lock.
#[derive(Debug, Clone)]
pub struct SearchEngine {
    mode: SearchMode,
    default_threshold: f32,
}

impl SearchEngine {
    pub fn new(mode: SearchMode, default_threshold: f32) -> Self {
        Self {
            mode,
            default_threshold,
        }
    }

    /// Configured search strategy.
    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    /// Find the stored record most similar to `query`.
    ///
    /// Returns `Ok(None)` when the store is empty or when the best
    /// similarity falls below the threshold; the threshold is a hard gate,
    /// not advisory. `threshold` overrides the configured default for this
    /// call only.
    pub fn search(
        &self,
        store: &FeatureStore,
        index: Option<&BucketIndex>,
        query: &[f32],
        threshold: Option<f32>,
    ) -> Result<Option<SearchMatch>, SearchError> {
        let threshold = match threshold {
            Some(t) if !(0.0..=1.0).contains(&t) => {
                return Err(SearchError::ThresholdOutOfRange(t))
            }
            Some(t) => t,
            None => self.default_threshold,
        };

        if store.is_empty() {
            return Ok(None);
        }

        // Non-empty store always has a fixed dimension
        if let Some(expected) = store.dimension() {
            if query.len() != expected {
                return Err(SearchError::DimensionMismatch {
                    expected,
                    actual: query.len(),
                });
            }
        }

        let query = Embedding::new(query.to_vec());

        let best = match (self.mode, index) {
            (SearchMode::Exhaustive, _) | (SearchMode::Approximate, None) => {
                exhaustive::best_match(store.iter(), &query)
            }
            (SearchMode::Approximate, Some(index)) => match index.candidates(&query) {
                // Below the population floor the index abstains and the
                // scan stays exact
                None => exhaustive::best_match(store.iter(), &query),
                Some(keys) => {
                    let records: Vec<&FeatureRecord> =
                        keys.iter().filter_map(|&k| store.get(k).ok()).collect();
                    exhaustive::best_match(records, &query)
                }
            },
        };

        match best {
            Some((record, similarity)) if similarity >= threshold => {
                debug!(key = record.key, similarity = similarity, "Search hit");
                Ok(Some(SearchMatch::new(
                    record.key,
                    similarity,
                    record.tag.clone(),
                )))
            }
            Some((_, similarity)) => {
                debug!(
                    best = similarity,
                    threshold = threshold,
                    "Best candidate below threshold"
                );
                Ok(None)
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facehub_types::PrimaryKeyMode;

    fn populated_store() -> FeatureStore {
        let mut store = FeatureStore::new(PrimaryKeyMode::AutoIncrement, None);
        store.insert(vec![1.0, 0.0], None, Some("a".into())).unwrap();
        store.insert(vec![0.0, 1.0], None, Some("b".into())).unwrap();
        store.insert(vec![0.9, 0.1], None, Some("c".into())).unwrap();
        store
    }

    #[test]
    fn test_exact_scenario_three_records() {
        let store = populated_store();
        let engine = SearchEngine::new(SearchMode::Exhaustive, 0.5);

        let hit = engine
            .search(&store, None, &[1.0, 0.0], None)
            .unwrap()
            .unwrap();
        assert_eq!(hit.key, 1);
        assert!((hit.similarity - 1.0).abs() < 0.001);
        assert_eq!(hit.tag.as_deref(), Some("a"));
    }

    #[test]
    fn test_threshold_rejection() {
        let store = populated_store();
        let engine = SearchEngine::new(SearchMode::Exhaustive, 0.5);

        // Best similarity to [0, -1] is negative; gate rejects it
        let result = engine.search(&store, None, &[0.0, -1.0], None).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_threshold_is_hard_gate() {
        let store = populated_store();
        let engine = SearchEngine::new(SearchMode::Exhaustive, 0.999);

        // [0.9, 0.3] is close to record 3 but not close enough
        let result = engine.search(&store, None, &[0.5, 0.5], None).unwrap();
        assert!(result.is_none());

        // Per-call override relaxes the gate
        let hit = engine
            .search(&store, None, &[0.5, 0.5], Some(0.2))
            .unwrap();
        assert!(hit.is_some());
    }

    #[test]
    fn test_empty_store() {
        let store = FeatureStore::new(PrimaryKeyMode::AutoIncrement, None);
        let engine = SearchEngine::new(SearchMode::Exhaustive, 0.5);
        // Wrong-length query on an empty store is still just a miss
        assert!(engine.search(&store, None, &[1.0], None).unwrap().is_none());
    }

    #[test]
    fn test_dimension_mismatch() {
        let store = populated_store();
        let engine = SearchEngine::new(SearchMode::Exhaustive, 0.5);
        let err = engine.search(&store, None, &[1.0, 0.0, 0.0], None);
        assert!(matches!(
            err,
            Err(SearchError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_invalid_threshold_override() {
        let store = populated_store();
        let engine = SearchEngine::new(SearchMode::Exhaustive, 0.5);
        let err = engine.search(&store, None, &[1.0, 0.0], Some(1.5));
        assert!(matches!(err, Err(SearchError::ThresholdOutOfRange(_))));
    }

    #[test]
    fn test_approximate_small_store_is_exact() {
        let store = populated_store();
        let engine = SearchEngine::new(SearchMode::Approximate, 0.5);
        let mut index = BucketIndex::new(2);
        for record in store.iter() {
            index.insert(record.key, &record.vector);
        }

        // Three records is far below the floor: identical to exhaustive
        let hit = engine
            .search(&store, Some(&index), &[1.0, 0.0], None)
            .unwrap()
            .unwrap();
        assert_eq!(hit.key, 1);
    }

    #[test]
    fn test_approximate_large_store_finds_inserted_vector() {
        let mut store = FeatureStore::new(PrimaryKeyMode::AutoIncrement, None);
        let mut index = BucketIndex::with_population_floor(4, 8);
        let engine = SearchEngine::new(SearchMode::Approximate, 0.9);

        // Spread filler vectors over several directions
        for i in 0..32 {
            let mut v = vec![0.1, 0.1, 0.1, 0.1];
            v[i % 4] = if i % 2 == 0 { 1.0 } else { -1.0 };
            let key = store.insert(v, None, None).unwrap();
            index.insert(key, &store.get(key).unwrap().vector);
        }
        let needle = vec![0.2, 0.9, -0.3, 0.1];
        let key = store.insert(needle.clone(), None, None).unwrap();
        index.insert(key, &store.get(key).unwrap().vector);

        // Searching with the inserted vector probes the bucket it landed in
        let hit = engine
            .search(&store, Some(&index), &needle, None)
            .unwrap()
            .unwrap();
        assert_eq!(hit.key, key);
        assert!((hit.similarity - 1.0).abs() < 0.001);
    }
}
