//! Feature hub façade.
//!
//! Owns the single `FeatureStore` behind a reader-writer lock, routes
//! operations to the store and search engine, and triggers snapshot saves
//! after mutations. The lock discipline: `search`/`get`/`count`/`enumerate`
//! take the read lock and proceed concurrently; mutations take the write
//! lock and are fully serialized. Snapshots are captured while the write
//! lock is held and written to disk after it is released, so a slow disk
//! never blocks readers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use tracing::{info, warn};

use facehub_persist::{self as persist, PersistError, Snapshot, SnapshotWriter};
use facehub_search::{BucketIndex, SearchEngine};
use facehub_store::FeatureStore;
use facehub_types::{
    ConfigError, Embedding, FeatureRecord, HubConfig, PrimaryKey, SearchMatch, SearchMode,
};

use crate::error::HubError;

/// Store plus the optional approximate-search index, guarded together so
/// the index can never drift from the store contents.
struct HubState {
    store: FeatureStore,
    index: Option<BucketIndex>,
}

/// The Feature Hub: concurrent embedding store, search, and persistence
/// behind one immutable configuration.
///
/// Exactly one hub instance may own a given snapshot path at a time;
/// concurrent hubs over the same file are disallowed by contract.
pub struct FeatureHub {
    config: HubConfig,
    engine: SearchEngine,
    state: RwLock<HubState>,
    writer: Option<SnapshotWriter>,
    /// Mutation counter, versions the snapshots
    version: AtomicU64,
    load_warning: Option<PersistError>,
}

impl FeatureHub {
    /// Open a hub under a validated configuration.
    ///
    /// With persistence enabled this verifies the path is writable, then
    /// loads the prior snapshot if one exists. A corrupt snapshot is
    /// non-fatal: the hub starts empty and reports the problem through
    /// [`load_warning`](Self::load_warning). A key-policy or dimension
    /// conflict with a non-empty persisted store is fatal.
    pub fn open(config: HubConfig) -> Result<Self, HubError> {
        let writer = match &config.persistence_path {
            Some(path) => {
                persist::check_writable(path).map_err(|e| ConfigError::PathNotWritable {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })?;
                Some(SnapshotWriter::new(path))
            }
            None => None,
        };

        let mut load_warning = None;
        let store = match &config.persistence_path {
            Some(path) => match persist::load(path) {
                Ok(Some(snapshot)) => Self::restore_store(&config, snapshot)?,
                Ok(None) => FeatureStore::new(config.primary_key_mode, config.dimension),
                Err(e @ PersistError::Corrupt(_)) => {
                    warn!(error = %e, "Snapshot corrupt; starting with an empty store");
                    load_warning = Some(e);
                    FeatureStore::new(config.primary_key_mode, config.dimension)
                }
                Err(e) => return Err(e.into()),
            },
            None => FeatureStore::new(config.primary_key_mode, config.dimension),
        };

        let index = if config.search_mode == SearchMode::Approximate {
            store.dimension().map(|dim| {
                let mut index = BucketIndex::new(dim);
                for record in store.iter() {
                    index.insert(record.key, &record.vector);
                }
                index
            })
        } else {
            None
        };

        info!(
            records = store.count(),
            mode = ?config.search_mode,
            persistent = config.persistence_enabled(),
            "Opened feature hub"
        );

        let engine = SearchEngine::new(config.search_mode, config.search_threshold);
        Ok(Self {
            config,
            engine,
            state: RwLock::new(HubState { store, index }),
            writer,
            version: AtomicU64::new(0),
            load_warning,
        })
    }

    fn restore_store(config: &HubConfig, snapshot: Snapshot) -> Result<FeatureStore, HubError> {
        if snapshot.records.is_empty() {
            // Nothing to conflict with; keep the auto-key high-water mark
            return Ok(FeatureStore::restore(
                config.primary_key_mode,
                snapshot.next_key,
                config.dimension,
                Vec::new(),
            ));
        }

        if snapshot.key_mode != config.primary_key_mode {
            return Err(ConfigError::KeyPolicyConflict {
                configured: config.primary_key_mode,
                persisted: snapshot.key_mode,
            }
            .into());
        }
        if let (Some(configured), Some(persisted)) = (config.dimension, snapshot.dimension) {
            if configured != persisted {
                return Err(ConfigError::DimensionConflict {
                    configured,
                    persisted,
                }
                .into());
            }
        }
        Ok(snapshot.into_store())
    }

    /// The configuration the hub was opened with.
    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Problem encountered loading the snapshot at open, if any. The hub
    /// started with an empty store in that case.
    pub fn load_warning(&self) -> Option<&PersistError> {
        self.load_warning.as_ref()
    }

    /// Insert a feature. Returns the assigned (or accepted) primary key.
    ///
    /// `requested_key` is required in MANUAL mode and forbidden in
    /// AUTO_INCREMENT mode. The vector is normalized before storage; its
    /// length fixes the hub dimension on the first insertion.
    pub fn insert(
        &self,
        vector: Vec<f32>,
        requested_key: Option<PrimaryKey>,
        tag: Option<String>,
    ) -> Result<PrimaryKey, HubError> {
        let (key, pending) = {
            let mut state = self.state.write().unwrap();
            let key = state.store.insert(vector, requested_key, tag)?;
            self.index_insert(&mut state, key);
            (key, self.capture(&state))
        };
        self.commit(pending, Some(key))?;
        Ok(key)
    }

    /// Remove a feature by key.
    pub fn remove(&self, key: PrimaryKey) -> Result<(), HubError> {
        let pending = {
            let mut state = self.state.write().unwrap();
            let old = state.store.get(key)?.vector.clone();
            state.store.remove(key)?;
            if let Some(index) = state.index.as_mut() {
                index.remove(key, &old);
            }
            self.capture(&state)
        };
        self.commit(pending, Some(key))
    }

    /// Replace the vector of an existing feature; key, tag, and insertion
    /// order are preserved.
    pub fn update(&self, key: PrimaryKey, vector: Vec<f32>) -> Result<(), HubError> {
        let pending = {
            let mut state = self.state.write().unwrap();
            let old = state.store.get(key)?.vector.clone();
            state.store.update(key, vector)?;
            self.index_update(&mut state, key, &old);
            self.capture(&state)
        };
        self.commit(pending, Some(key))
    }

    /// Replace both the vector and the tag of an existing feature.
    pub fn update_with_tag(
        &self,
        key: PrimaryKey,
        vector: Vec<f32>,
        tag: Option<String>,
    ) -> Result<(), HubError> {
        let pending = {
            let mut state = self.state.write().unwrap();
            let old = state.store.get(key)?.vector.clone();
            state.store.update_with_tag(key, vector, tag)?;
            self.index_update(&mut state, key, &old);
            self.capture(&state)
        };
        self.commit(pending, Some(key))
    }

    /// Look up a feature by key.
    pub fn get(&self, key: PrimaryKey) -> Result<FeatureRecord, HubError> {
        let state = self.state.read().unwrap();
        Ok(state.store.get(key)?.clone())
    }

    /// Number of stored features.
    pub fn count(&self) -> usize {
        self.state.read().unwrap().store.count()
    }

    /// Fixed embedding dimension, once established.
    pub fn dimension(&self) -> Option<usize> {
        self.state.read().unwrap().store.dimension()
    }

    /// All records in insertion order. Each call takes a fresh copy of the
    /// current contents.
    pub fn enumerate(&self) -> Vec<FeatureRecord> {
        self.state.read().unwrap().store.iter().cloned().collect()
    }

    /// Remove every feature. With persistence enabled the snapshot file is
    /// rewritten empty; AUTO_INCREMENT keys are still never reused.
    pub fn clear(&self) -> Result<(), HubError> {
        let pending = {
            let mut state = self.state.write().unwrap();
            state.store.clear();
            if let Some(index) = state.index.as_mut() {
                index.clear();
            }
            self.capture(&state)
        };
        self.commit(pending, None)
    }

    /// Find the stored feature most similar to `query` under the
    /// configured threshold. `None` means nothing cleared the gate.
    pub fn search(&self, query: &[f32]) -> Result<Option<SearchMatch>, HubError> {
        let state = self.state.read().unwrap();
        Ok(self
            .engine
            .search(&state.store, state.index.as_ref(), query, None)?)
    }

    /// Search with a per-call threshold override in [0, 1].
    pub fn search_with_threshold(
        &self,
        query: &[f32],
        threshold: f32,
    ) -> Result<Option<SearchMatch>, HubError> {
        let state = self.state.read().unwrap();
        Ok(self.engine.search(
            &state.store,
            state.index.as_ref(),
            query,
            Some(threshold),
        )?)
    }

    /// Index a freshly inserted record in approximate mode. The index is
    /// created on the first insertion, once the dimension is known.
    fn index_insert(&self, state: &mut HubState, key: PrimaryKey) {
        if self.config.search_mode != SearchMode::Approximate {
            return;
        }
        let HubState { store, index } = state;
        if let Ok(record) = store.get(key) {
            let index =
                index.get_or_insert_with(|| BucketIndex::new(record.vector.dimension()));
            index.insert(key, &record.vector);
        }
    }

    fn index_update(&self, state: &mut HubState, key: PrimaryKey, old: &Embedding) {
        let HubState { store, index } = state;
        if let (Some(index), Ok(record)) = (index.as_mut(), store.get(key)) {
            index.update(key, old, &record.vector);
        }
    }

    /// Capture a versioned snapshot under the write lock. Returns `None`
    /// when persistence is disabled.
    fn capture(&self, state: &HubState) -> Option<(u64, Snapshot)> {
        self.writer.as_ref()?;
        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        Some((version, Snapshot::of_store(&state.store)))
    }

    /// Write a captured snapshot after the lock is released. A failure is
    /// a durability warning: the in-memory mutation already committed.
    fn commit(
        &self,
        pending: Option<(u64, Snapshot)>,
        key: Option<PrimaryKey>,
    ) -> Result<(), HubError> {
        if let (Some(writer), Some((version, snapshot))) = (self.writer.as_ref(), pending) {
            writer
                .save(version, &snapshot)
                .map_err(|source| HubError::Durability { key, source })?;
        }
        Ok(())
    }
}
