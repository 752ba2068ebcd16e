//! Coarse bucket index for approximate search.
//!
//! Each vector is quantized to an 8-bit signature by the sign of its dot
//! product with 8 fixed random hyperplanes (the hyperplane set is derived
//! from a fixed seed and the store dimension, so signatures are stable
//! across process restarts). Vectors that point in similar directions land
//! in buckets with nearby signatures, so a search probes only the buckets
//! within a small Hamming radius of the query signature.
//!
//! Below a population floor the index abstains and the engine runs the
//! exhaustive scan instead, keeping small stores exact.

use std::collections::HashMap;

use facehub_types::{Embedding, PrimaryKey};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Number of quantization hyperplanes (signature bits).
const NUM_PLANES: usize = 8;

/// Buckets within this Hamming distance of the query signature are probed.
const PROBE_RADIUS: u32 = 2;

/// Stores smaller than this are searched exhaustively.
pub const DEFAULT_POPULATION_FLOOR: usize = 256;

/// Seed for the hyperplane generator. Mixed with the dimension so every
/// store of a given dimension quantizes identically.
const HYPERPLANE_SEED: u64 = 0x_face_4b1d_0000_0001;

/// Coarse quantization index mapping bucket signatures to record keys.
#[derive(Debug, Clone)]
pub struct BucketIndex {
    planes: Vec<Vec<f32>>,
    buckets: HashMap<u8, Vec<PrimaryKey>>,
    population_floor: usize,
    len: usize,
}

impl BucketIndex {
    /// Create an index for vectors of the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self::with_population_floor(dimension, DEFAULT_POPULATION_FLOOR)
    }

    /// Create an index with an explicit exhaustive-fallback floor.
    pub fn with_population_floor(dimension: usize, population_floor: usize) -> Self {
        let mut rng = StdRng::seed_from_u64(HYPERPLANE_SEED ^ dimension as u64);
        let planes = (0..NUM_PLANES)
            .map(|_| {
                (0..dimension)
                    .map(|_| rng.random::<f32>() * 2.0 - 1.0)
                    .collect()
            })
            .collect();

        Self {
            planes,
            buckets: HashMap::new(),
            population_floor,
            len: 0,
        }
    }

    /// Number of indexed vectors.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the index holds no vectors.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bucket signature of a vector: one sign bit per hyperplane.
    pub fn signature(&self, vector: &Embedding) -> u8 {
        let mut sig = 0u8;
        for (bit, plane) in self.planes.iter().enumerate() {
            let dot: f32 = plane
                .iter()
                .zip(vector.values.iter())
                .map(|(p, v)| p * v)
                .sum();
            if dot >= 0.0 {
                sig |= 1 << bit;
            }
        }
        sig
    }

    /// Index a vector under its key.
    pub fn insert(&mut self, key: PrimaryKey, vector: &Embedding) {
        let sig = self.signature(vector);
        self.buckets.entry(sig).or_default().push(key);
        self.len += 1;
        debug!(key = key, bucket = sig, "Indexed vector");
    }

    /// Drop a key from the bucket its vector quantizes to.
    pub fn remove(&mut self, key: PrimaryKey, vector: &Embedding) {
        let sig = self.signature(vector);
        if let Some(bucket) = self.buckets.get_mut(&sig) {
            if let Some(pos) = bucket.iter().position(|&k| k == key) {
                bucket.swap_remove(pos);
                self.len -= 1;
                if bucket.is_empty() {
                    self.buckets.remove(&sig);
                }
            }
        }
    }

    /// Re-index a key whose vector changed.
    pub fn update(&mut self, key: PrimaryKey, old: &Embedding, new: &Embedding) {
        self.remove(key, old);
        self.insert(key, new);
    }

    /// Drop all indexed vectors.
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.len = 0;
    }

    /// Keys in buckets within the probe radius of the query signature.
    ///
    /// Returns `None` when the index is below its population floor, in
    /// which case the caller must run the exhaustive scan instead.
    pub fn candidates(&self, query: &Embedding) -> Option<Vec<PrimaryKey>> {
        if self.len < self.population_floor {
            return None;
        }

        let sig = self.signature(query);
        let mut keys = Vec::new();
        for (&bucket_sig, bucket) in &self.buckets {
            if (bucket_sig ^ sig).count_ones() <= PROBE_RADIUS {
                keys.extend_from_slice(bucket);
            }
        }
        debug!(
            bucket = sig,
            candidates = keys.len(),
            total = self.len,
            "Collected approximate candidates"
        );
        Some(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(dim: usize, axis: usize) -> Embedding {
        let mut v = vec![0.0; dim];
        v[axis] = 1.0;
        Embedding::new(v)
    }

    #[test]
    fn test_signature_is_deterministic() {
        let a = BucketIndex::new(16);
        let b = BucketIndex::new(16);
        let v = unit(16, 3);
        assert_eq!(a.signature(&v), b.signature(&v));
    }

    #[test]
    fn test_identical_vectors_share_a_bucket() {
        let index = BucketIndex::new(8);
        let v = unit(8, 0);
        let w = unit(8, 0);
        assert_eq!(index.signature(&v), index.signature(&w));
    }

    #[test]
    fn test_abstains_below_population_floor() {
        let mut index = BucketIndex::with_population_floor(4, 10);
        for i in 0..5 {
            index.insert(i, &unit(4, (i % 4) as usize));
        }
        assert!(index.candidates(&unit(4, 0)).is_none());
    }

    #[test]
    fn test_candidates_include_same_bucket_keys() {
        let mut index = BucketIndex::with_population_floor(4, 1);
        let v = unit(4, 0);
        index.insert(42, &v);
        index.insert(7, &unit(4, 1));

        let candidates = index.candidates(&v).unwrap();
        assert!(candidates.contains(&42));
    }

    #[test]
    fn test_remove_then_update_membership() {
        let mut index = BucketIndex::with_population_floor(4, 1);
        let v = unit(4, 0);
        index.insert(1, &v);
        assert_eq!(index.len(), 1);

        index.remove(1, &v);
        assert!(index.is_empty());

        index.insert(2, &v);
        let w = unit(4, 2);
        index.update(2, &v, &w);
        assert_eq!(index.len(), 1);
        let candidates = index.candidates(&w).unwrap();
        assert!(candidates.contains(&2));
    }

    #[test]
    fn test_clear() {
        let mut index = BucketIndex::new(4);
        index.insert(1, &unit(4, 0));
        index.insert(2, &unit(4, 1));
        index.clear();
        assert!(index.is_empty());
    }
}
