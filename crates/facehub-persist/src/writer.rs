//! Atomic snapshot writer and loader.
//!
//! Saves write the full snapshot to a temp file in the destination
//! directory, fsync it, then rename it over the destination. A version
//! counter guards against a slow older write landing after a newer one.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info, warn};

use crate::error::PersistError;
use crate::snapshot::Snapshot;

/// Serializes snapshot writes to a single destination file.
///
/// One writer owns its path exclusively; pointing two hubs at the same
/// file is disallowed by contract.
pub struct SnapshotWriter {
    path: PathBuf,
    /// Version of the last snapshot actually written
    last_written: Mutex<u64>,
}

impl SnapshotWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last_written: Mutex::new(0),
        }
    }

    /// Destination snapshot path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Atomically replace the snapshot file.
    ///
    /// `version` must increase with every store mutation; a save whose
    /// version is not newer than the last completed one is skipped (a
    /// newer snapshot already covers it) and reported as `Ok(false)`.
    pub fn save(&self, version: u64, snapshot: &Snapshot) -> Result<bool, PersistError> {
        let mut last = self
            .last_written
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if version <= *last {
            debug!(
                version = version,
                last_written = *last,
                "Skipping stale snapshot"
            );
            return Ok(false);
        }

        let bytes = snapshot.encode();
        let tmp_path = self.tmp_path();

        let result = write_atomic(&tmp_path, &self.path, &bytes);
        if result.is_err() {
            // Leave no temp debris behind a failed save
            let _ = fs::remove_file(&tmp_path);
        }
        result?;

        *last = version;
        info!(
            path = ?self.path,
            records = snapshot.records.len(),
            version = version,
            "Saved snapshot"
        );
        Ok(true)
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "snapshot".into());
        name.push(format!(".tmp.{}", std::process::id()));
        self.path.with_file_name(name)
    }
}

fn write_atomic(tmp_path: &Path, dest: &Path, bytes: &[u8]) -> Result<(), PersistError> {
    let mut file = File::create(tmp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);
    fs::rename(tmp_path, dest)?;
    Ok(())
}

/// Load a snapshot from disk.
///
/// Returns `Ok(None)` when no snapshot exists yet (first run). Structural
/// problems are `PersistError::Corrupt`; the caller decides the fallback.
pub fn load(path: &Path) -> Result<Option<Snapshot>, PersistError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = ?path, "No snapshot to load");
            return Ok(None);
        }
        Err(e) => return Err(PersistError::Io(e)),
    };

    let snapshot = Snapshot::decode(&bytes).inspect_err(|e| {
        warn!(path = ?path, error = %e, "Snapshot failed validation");
    })?;

    info!(
        path = ?path,
        records = snapshot.records.len(),
        "Loaded snapshot"
    );
    Ok(Some(snapshot))
}

/// Verify the snapshot path's directory exists (creating it if needed)
/// and is writable, without disturbing any existing snapshot.
pub fn check_writable(path: &Path) -> Result<(), PersistError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;

    let probe = dir.join(format!(".facehub-probe.{}", std::process::id()));
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&probe)?;
    fs::remove_file(&probe)?;
    Ok(())
}
