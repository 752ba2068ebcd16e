//! Primary key allocation.
//!
//! AUTO_INCREMENT keys start at 1, are strictly increasing, and are never
//! reused even after removal, so a removed key cannot collide with a future
//! auto-assigned key. MANUAL keys come from the caller and are checked for
//! duplicates against the live store.

use facehub_types::{PrimaryKey, PrimaryKeyMode};

use crate::error::StoreError;

/// First key handed out under AUTO_INCREMENT.
pub const AUTO_KEY_ORIGIN: PrimaryKey = 1;

/// Assigns and validates primary keys under a fixed policy.
#[derive(Debug, Clone)]
pub struct KeyAllocator {
    mode: PrimaryKeyMode,
    /// Next key to hand out in AUTO_INCREMENT mode
    next_key: PrimaryKey,
}

impl KeyAllocator {
    /// Create an allocator for an empty store.
    pub fn new(mode: PrimaryKeyMode) -> Self {
        Self {
            mode,
            next_key: AUTO_KEY_ORIGIN,
        }
    }

    /// Create an allocator restored from a snapshot. `next_key` is the
    /// persisted high-water mark, which already accounts for removed keys.
    pub fn restore(mode: PrimaryKeyMode, next_key: PrimaryKey) -> Self {
        Self {
            mode,
            next_key: next_key.max(AUTO_KEY_ORIGIN),
        }
    }

    /// Key assignment policy.
    pub fn mode(&self) -> PrimaryKeyMode {
        self.mode
    }

    /// High-water mark for AUTO_INCREMENT assignment.
    pub fn next_key(&self) -> PrimaryKey {
        self.next_key
    }

    /// Allocate a key for a new record.
    ///
    /// `exists` reports whether a candidate key is already present in the
    /// store; it is only consulted in MANUAL mode.
    pub fn allocate(
        &mut self,
        requested: Option<PrimaryKey>,
        exists: impl Fn(PrimaryKey) -> bool,
    ) -> Result<PrimaryKey, StoreError> {
        match (self.mode, requested) {
            (PrimaryKeyMode::AutoIncrement, Some(_)) => Err(StoreError::KeyNotAllowed),
            (PrimaryKeyMode::AutoIncrement, None) => {
                let key = self.next_key;
                self.next_key = self
                    .next_key
                    .checked_add(1)
                    .ok_or(StoreError::KeySpaceExhausted)?;
                Ok(key)
            }
            (PrimaryKeyMode::Manual, None) => Err(StoreError::KeyRequired),
            (PrimaryKeyMode::Manual, Some(key)) => {
                if exists(key) {
                    Err(StoreError::DuplicateKey(key))
                } else {
                    Ok(key)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_increment_starts_at_origin() {
        let mut alloc = KeyAllocator::new(PrimaryKeyMode::AutoIncrement);
        assert_eq!(alloc.allocate(None, |_| false).unwrap(), 1);
        assert_eq!(alloc.allocate(None, |_| false).unwrap(), 2);
        assert_eq!(alloc.allocate(None, |_| false).unwrap(), 3);
    }

    #[test]
    fn test_auto_increment_never_reuses() {
        let mut alloc = KeyAllocator::new(PrimaryKeyMode::AutoIncrement);
        alloc.allocate(None, |_| false).unwrap();
        alloc.allocate(None, |_| false).unwrap();
        // Removing key 2 from the store must not affect the allocator:
        // the next key is still 3.
        assert_eq!(alloc.allocate(None, |_| false).unwrap(), 3);
    }

    #[test]
    fn test_auto_increment_rejects_explicit_key() {
        let mut alloc = KeyAllocator::new(PrimaryKeyMode::AutoIncrement);
        let err = alloc.allocate(Some(7), |_| false);
        assert!(matches!(err, Err(StoreError::KeyNotAllowed)));
    }

    #[test]
    fn test_manual_requires_key() {
        let mut alloc = KeyAllocator::new(PrimaryKeyMode::Manual);
        let err = alloc.allocate(None, |_| false);
        assert!(matches!(err, Err(StoreError::KeyRequired)));
    }

    #[test]
    fn test_manual_rejects_duplicate() {
        let mut alloc = KeyAllocator::new(PrimaryKeyMode::Manual);
        let err = alloc.allocate(Some(42), |k| k == 42);
        assert!(matches!(err, Err(StoreError::DuplicateKey(42))));
        assert_eq!(alloc.allocate(Some(42), |_| false).unwrap(), 42);
    }

    #[test]
    fn test_restore_high_water_mark() {
        let mut alloc = KeyAllocator::restore(PrimaryKeyMode::AutoIncrement, 100);
        assert_eq!(alloc.allocate(None, |_| false).unwrap(), 100);
    }

    #[test]
    fn test_restore_clamps_to_origin() {
        let mut alloc = KeyAllocator::restore(PrimaryKeyMode::AutoIncrement, 0);
        assert_eq!(alloc.allocate(None, |_| false).unwrap(), 1);
    }
}
