//! Hub configuration.
//!
//! Built through a fluent builder whose `build()` is the single validating
//! factory: the resulting `HubConfig` is an immutable value with no
//! partially-valid intermediate states.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default similarity threshold for search.
pub const DEFAULT_SEARCH_THRESHOLD: f32 = 0.42;

/// Primary key assignment policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryKeyMode {
    /// Keys assigned by the hub, strictly increasing, never reused (default)
    #[default]
    AutoIncrement,
    /// Keys supplied by the caller; duplicates rejected
    Manual,
}

/// Search strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Linear scan over every stored vector (default)
    #[default]
    Exhaustive,
    /// Coarse-bucket scan; falls back to exhaustive on small stores
    Approximate,
}

/// Validated, immutable hub configuration.
///
/// Construct through [`HubConfig::builder`]. Reconfiguring a hub means
/// building a new config and opening a new hub, possibly over the same
/// persisted file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    /// Key assignment policy, fixed at construction
    pub primary_key_mode: PrimaryKeyMode,
    /// Snapshot file path; `None` means the hub never touches disk
    pub persistence_path: Option<PathBuf>,
    /// Minimum similarity for a search result to count as a match
    pub search_threshold: f32,
    /// Search strategy
    pub search_mode: SearchMode,
    /// Embedding dimension, if fixed up front. When `None`, the dimension
    /// is fixed by the first insertion.
    pub dimension: Option<usize>,
}

impl HubConfig {
    /// Start building a configuration with default values.
    pub fn builder() -> HubConfigBuilder {
        HubConfigBuilder::default()
    }

    /// Whether persistence is enabled.
    pub fn persistence_enabled(&self) -> bool {
        self.persistence_path.is_some()
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            primary_key_mode: PrimaryKeyMode::default(),
            persistence_path: None,
            search_threshold: DEFAULT_SEARCH_THRESHOLD,
            search_mode: SearchMode::default(),
            dimension: None,
        }
    }
}

/// Fluent builder for [`HubConfig`].
///
/// Each setter returns the builder; `build()` validates the whole value at
/// once and returns a `ConfigError` naming the first violated constraint.
#[derive(Debug, Clone, Default)]
pub struct HubConfigBuilder {
    primary_key_mode: PrimaryKeyMode,
    enable_persistence: bool,
    persistence_path: Option<PathBuf>,
    search_threshold: Option<f32>,
    search_mode: SearchMode,
    dimension: Option<usize>,
}

impl HubConfigBuilder {
    /// Set the primary key assignment policy.
    pub fn primary_key_mode(mut self, mode: PrimaryKeyMode) -> Self {
        self.primary_key_mode = mode;
        self
    }

    /// Enable or disable persistence. Requires a path when enabled.
    pub fn enable_persistence(mut self, enabled: bool) -> Self {
        self.enable_persistence = enabled;
        self
    }

    /// Set the snapshot file path and enable persistence.
    pub fn persistence_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.persistence_path = Some(path.into());
        self.enable_persistence = true;
        self
    }

    /// Set the similarity threshold (must be in [0, 1]).
    pub fn search_threshold(mut self, threshold: f32) -> Self {
        self.search_threshold = Some(threshold);
        self
    }

    /// Set the search strategy.
    pub fn search_mode(mut self, mode: SearchMode) -> Self {
        self.search_mode = mode;
        self
    }

    /// Fix the embedding dimension up front instead of at first insertion.
    pub fn dimension(mut self, dimension: usize) -> Self {
        self.dimension = Some(dimension);
        self
    }

    /// Validate and freeze the configuration.
    pub fn build(self) -> Result<HubConfig, ConfigError> {
        let threshold = self.search_threshold.unwrap_or(DEFAULT_SEARCH_THRESHOLD);
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::ThresholdOutOfRange(threshold));
        }

        let persistence_path = if self.enable_persistence {
            match self.persistence_path {
                Some(ref p) if p.as_os_str().is_empty() => {
                    return Err(ConfigError::MissingPersistencePath)
                }
                Some(p) => Some(p),
                None => return Err(ConfigError::MissingPersistencePath),
            }
        } else {
            None
        };

        if self.dimension == Some(0) {
            return Err(ConfigError::ZeroDimension);
        }

        Ok(HubConfig {
            primary_key_mode: self.primary_key_mode,
            persistence_path,
            search_threshold: threshold,
            search_mode: self.search_mode,
            dimension: self.dimension,
        })
    }
}
