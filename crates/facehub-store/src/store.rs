//! In-memory feature table.
//!
//! Records live in a vector ordered by insertion, with a key index on the
//! side. The dimension is fixed by the first insertion (or up front via the
//! hub configuration) and enforced on every vector that enters the store.

use std::collections::HashMap;

use facehub_types::{Embedding, FeatureRecord, PrimaryKey, PrimaryKeyMode};
use tracing::debug;

use crate::allocator::KeyAllocator;
use crate::error::StoreError;

/// Authoritative table of (key -> feature record).
#[derive(Debug, Clone)]
pub struct FeatureStore {
    /// Records in insertion order
    records: Vec<FeatureRecord>,
    /// Key -> position in `records`
    by_key: HashMap<PrimaryKey, usize>,
    allocator: KeyAllocator,
    /// Fixed embedding dimension, set at construction or first insert
    dimension: Option<usize>,
}

impl FeatureStore {
    /// Create an empty store under the given key policy.
    pub fn new(mode: PrimaryKeyMode, dimension: Option<usize>) -> Self {
        Self {
            records: Vec::new(),
            by_key: HashMap::new(),
            allocator: KeyAllocator::new(mode),
            dimension,
        }
    }

    /// Rebuild a store from snapshot contents.
    ///
    /// Records must already be normalized and carry unique keys; the
    /// persistence layer validates both before calling this.
    pub fn restore(
        mode: PrimaryKeyMode,
        next_key: PrimaryKey,
        dimension: Option<usize>,
        records: Vec<FeatureRecord>,
    ) -> Self {
        let by_key = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.key, i))
            .collect();
        Self {
            records,
            by_key,
            allocator: KeyAllocator::restore(mode, next_key),
            dimension,
        }
    }

    /// Fixed embedding dimension, if one has been established.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Key assignment policy.
    pub fn key_mode(&self) -> PrimaryKeyMode {
        self.allocator.mode()
    }

    /// AUTO_INCREMENT high-water mark, persisted so removed keys are never
    /// reissued after a reload.
    pub fn next_auto_key(&self) -> PrimaryKey {
        self.allocator.next_key()
    }

    /// Number of stored records.
    pub fn count(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Insert a new feature. The raw vector is normalized before storage.
    ///
    /// On the first insertion into a store with no fixed dimension, the
    /// vector's length becomes the store dimension. A failed insert leaves
    /// the store (and the key allocator) untouched.
    pub fn insert(
        &mut self,
        vector: Vec<f32>,
        requested_key: Option<PrimaryKey>,
        tag: Option<String>,
    ) -> Result<PrimaryKey, StoreError> {
        self.check_dimension(vector.len())?;

        let by_key = &self.by_key;
        let key = self
            .allocator
            .allocate(requested_key, |k| by_key.contains_key(&k))?;

        // Dimension is fixed only once the insert is certain to succeed
        if self.dimension.is_none() {
            self.dimension = Some(vector.len());
        }

        let record = FeatureRecord::new(key, Embedding::new(vector), tag);
        self.by_key.insert(key, self.records.len());
        self.records.push(record);

        debug!(key = key, count = self.records.len(), "Inserted feature");
        Ok(key)
    }

    /// Remove a feature by key.
    pub fn remove(&mut self, key: PrimaryKey) -> Result<(), StoreError> {
        let idx = self.by_key.remove(&key).ok_or(StoreError::NotFound(key))?;
        self.records.remove(idx);
        // Positions after the removed slot shift down by one
        for record in &self.records[idx..] {
            if let Some(pos) = self.by_key.get_mut(&record.key) {
                *pos -= 1;
            }
        }

        debug!(key = key, count = self.records.len(), "Removed feature");
        Ok(())
    }

    /// Replace the vector of an existing record. Key, tag, and insertion
    /// order are preserved.
    pub fn update(&mut self, key: PrimaryKey, vector: Vec<f32>) -> Result<(), StoreError> {
        self.check_dimension(vector.len())?;
        let idx = *self.by_key.get(&key).ok_or(StoreError::NotFound(key))?;
        self.records[idx].vector = Embedding::new(vector);

        debug!(key = key, "Updated feature vector");
        Ok(())
    }

    /// Replace both the vector and the tag of an existing record.
    pub fn update_with_tag(
        &mut self,
        key: PrimaryKey,
        vector: Vec<f32>,
        tag: Option<String>,
    ) -> Result<(), StoreError> {
        self.update(key, vector)?;
        let idx = self.by_key[&key];
        self.records[idx].tag = tag;
        Ok(())
    }

    /// Look up a record by key.
    pub fn get(&self, key: PrimaryKey) -> Result<&FeatureRecord, StoreError> {
        self.by_key
            .get(&key)
            .map(|&idx| &self.records[idx])
            .ok_or(StoreError::NotFound(key))
    }

    /// Whether a key is present.
    pub fn contains(&self, key: PrimaryKey) -> bool {
        self.by_key.contains_key(&key)
    }

    /// Iterate records in insertion order. Each call yields a fresh
    /// iterator over the current contents.
    pub fn iter(&self) -> impl Iterator<Item = &FeatureRecord> {
        self.records.iter()
    }

    /// Remove every record. The key allocator keeps its high-water mark so
    /// AUTO_INCREMENT keys are still never reused.
    pub fn clear(&mut self) {
        self.records.clear();
        self.by_key.clear();
        debug!("Cleared feature store");
    }

    fn check_dimension(&self, actual: usize) -> Result<(), StoreError> {
        match self.dimension {
            Some(expected) if expected != actual => {
                Err(StoreError::DimensionMismatch { expected, actual })
            }
            None if actual == 0 => Err(StoreError::DimensionMismatch {
                expected: 0,
                actual: 0,
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> FeatureStore {
        FeatureStore::new(PrimaryKeyMode::AutoIncrement, None)
    }

    #[test]
    fn test_insert_assigns_sequential_keys() {
        let mut s = store();
        assert_eq!(s.insert(vec![1.0, 0.0], None, None).unwrap(), 1);
        assert_eq!(s.insert(vec![0.0, 1.0], None, None).unwrap(), 2);
        assert_eq!(s.count(), 2);
        assert_eq!(s.dimension(), Some(2));
    }

    #[test]
    fn test_first_insert_fixes_dimension() {
        let mut s = store();
        s.insert(vec![1.0, 0.0, 0.0], None, None).unwrap();

        let err = s.insert(vec![1.0, 0.0], None, None);
        assert!(matches!(
            err,
            Err(StoreError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
        // Failed insert consumed no key
        assert_eq!(s.insert(vec![0.0, 1.0, 0.0], None, None).unwrap(), 2);
    }

    #[test]
    fn test_insert_normalizes() {
        let mut s = store();
        let key = s.insert(vec![3.0, 4.0], None, None).unwrap();
        let record = s.get(key).unwrap();
        assert!((record.vector.values[0] - 0.6).abs() < 0.001);
        assert!((record.vector.values[1] - 0.8).abs() < 0.001);
    }

    #[test]
    fn test_manual_mode_duplicate() {
        let mut s = FeatureStore::new(PrimaryKeyMode::Manual, None);
        s.insert(vec![1.0, 0.0], Some(10), None).unwrap();

        let err = s.insert(vec![0.0, 1.0], Some(10), None);
        assert!(matches!(err, Err(StoreError::DuplicateKey(10))));
        assert_eq!(s.count(), 1);
    }

    #[test]
    fn test_remove_preserves_order_and_index() {
        let mut s = store();
        let a = s.insert(vec![1.0, 0.0], None, Some("a".into())).unwrap();
        let b = s.insert(vec![0.0, 1.0], None, Some("b".into())).unwrap();
        let c = s.insert(vec![1.0, 1.0], None, Some("c".into())).unwrap();

        s.remove(b).unwrap();

        let keys: Vec<_> = s.iter().map(|r| r.key).collect();
        assert_eq!(keys, vec![a, c]);
        assert_eq!(s.get(c).unwrap().tag.as_deref(), Some("c"));
        assert!(matches!(s.get(b), Err(StoreError::NotFound(2))));
    }

    #[test]
    fn test_removed_auto_key_not_reused() {
        let mut s = store();
        s.insert(vec![1.0, 0.0], None, None).unwrap();
        let b = s.insert(vec![0.0, 1.0], None, None).unwrap();
        s.remove(b).unwrap();

        let next = s.insert(vec![1.0, 1.0], None, None).unwrap();
        assert_eq!(next, 3);
    }

    #[test]
    fn test_update_replaces_vector_in_place() {
        let mut s = store();
        let a = s.insert(vec![1.0, 0.0], None, Some("alice".into())).unwrap();
        let b = s.insert(vec![0.0, 1.0], None, None).unwrap();

        s.update(a, vec![0.0, 2.0]).unwrap();

        let record = s.get(a).unwrap();
        assert!((record.vector.values[1] - 1.0).abs() < 0.001);
        assert_eq!(record.tag.as_deref(), Some("alice"));

        // Insertion order unchanged
        let keys: Vec<_> = s.iter().map(|r| r.key).collect();
        assert_eq!(keys, vec![a, b]);
    }

    #[test]
    fn test_update_missing_key() {
        let mut s = store();
        let err = s.update(99, vec![1.0, 0.0]);
        assert!(matches!(err, Err(StoreError::NotFound(99))));
    }

    #[test]
    fn test_update_wrong_dimension_has_no_effect() {
        let mut s = store();
        let a = s.insert(vec![1.0, 0.0], None, None).unwrap();
        let err = s.update(a, vec![1.0, 0.0, 0.0]);
        assert!(matches!(err, Err(StoreError::DimensionMismatch { .. })));
        assert!((s.get(a).unwrap().vector.values[0] - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_update_with_tag() {
        let mut s = store();
        let a = s.insert(vec![1.0, 0.0], None, Some("old".into())).unwrap();
        s.update_with_tag(a, vec![0.0, 1.0], Some("new".into()))
            .unwrap();
        assert_eq!(s.get(a).unwrap().tag.as_deref(), Some("new"));
    }

    #[test]
    fn test_clear_keeps_allocator_high_water_mark() {
        let mut s = store();
        s.insert(vec![1.0, 0.0], None, None).unwrap();
        s.insert(vec![0.0, 1.0], None, None).unwrap();
        s.clear();

        assert_eq!(s.count(), 0);
        assert!(s.iter().next().is_none());
        assert_eq!(s.insert(vec![1.0, 1.0], None, None).unwrap(), 3);
    }

    #[test]
    fn test_restore_round_trip() {
        let mut s = FeatureStore::new(PrimaryKeyMode::Manual, None);
        s.insert(vec![1.0, 0.0], Some(5), Some("five".into())).unwrap();
        s.insert(vec![0.0, 1.0], Some(9), None).unwrap();

        let records: Vec<_> = s.iter().cloned().collect();
        let restored = FeatureStore::restore(
            PrimaryKeyMode::Manual,
            s.next_auto_key(),
            s.dimension(),
            records,
        );

        assert_eq!(restored.count(), 2);
        assert_eq!(restored.get(5).unwrap().tag.as_deref(), Some("five"));
        assert!(restored.contains(9));
    }

    #[test]
    fn test_empty_vector_rejected() {
        let mut s = store();
        let err = s.insert(vec![], None, None);
        assert!(matches!(err, Err(StoreError::DimensionMismatch { .. })));
        assert_eq!(s.dimension(), None);
    }
}
