//! UnifiedStore: ordered storage with version management
//!
//! This module implements the Storage trait using:
//! - `Arc<BTreeMap<Vec<u8>, VersionedValue>>` for ordered byte-keyed storage
//! - `parking_lot::RwLock` for thread-safe access
//! - `AtomicU64` for the monotonically increasing commit version
//!
//! # Design Notes
//!
//! - **No version history**: each key stores only its latest value. Older
//!   states live on in snapshots that still hold the previous map.
//! - **Copy-on-write**: snapshots share the map through its `Arc`. A commit
//!   that finds snapshots alive clones the map before mutating it, so
//!   snapshot creation stays O(1) and snapshots never change.
//! - **One lock per batch**: a whole commit is applied under a single
//!   write-lock acquisition, so readers never see half a transaction.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use tkv_core::{KvResult, Storage, VersionedValue};

use crate::snapshot::StoreSnapshot;

/// Unified storage backend using a copy-on-write BTreeMap with RwLock
#[derive(Debug, Default)]
pub struct UnifiedStore {
    /// Ordered map from key to its latest committed value
    data: RwLock<Arc<BTreeMap<Vec<u8>, VersionedValue>>>,
    /// Highest commit version applied
    version: AtomicU64,
}

impl UnifiedStore {
    /// Create a new empty UnifiedStore
    ///
    /// Initial version is 0 (no commits have occurred).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a snapshot of the current state
    ///
    /// O(1): clones the `Arc` of the current map under the read lock and tags
    /// it with the current version. Later commits are not visible through it.
    pub fn create_snapshot(&self) -> StoreSnapshot {
        let data = self.data.read();
        let version = self.version.load(Ordering::Acquire);
        StoreSnapshot::new(version, Arc::clone(&data))
    }

    /// Snapshots still sharing the current map
    ///
    /// A commit copies the map only while this is non-zero.
    pub fn live_snapshots(&self) -> usize {
        Arc::strong_count(&self.data.read()) - 1
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// True when no key is stored
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// All live pairs in key order, with the version they are current at
    ///
    /// Used to rewrite the log as a single record.
    pub fn export(&self) -> (u64, Vec<(Vec<u8>, Vec<u8>)>) {
        let data = self.data.read();
        let version = self.version.load(Ordering::Acquire);
        let pairs = data
            .iter()
            .map(|(k, vv)| (k.clone(), vv.value.clone()))
            .collect();
        (version, pairs)
    }
}

impl Storage for UnifiedStore {
    fn get(&self, key: &[u8]) -> KvResult<Option<VersionedValue>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn get_version(&self, key: &[u8]) -> u64 {
        self.data.read().get(key).map_or(0, |vv| vv.version)
    }

    fn current_version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    fn apply_batch(
        &self,
        writes: &[(Vec<u8>, Vec<u8>)],
        deletes: &[Vec<u8>],
        version: u64,
    ) -> KvResult<()> {
        let mut guard = self.data.write();
        let data = Arc::make_mut(&mut *guard);
        for (key, value) in writes {
            data.insert(key.clone(), VersionedValue::new(value.clone(), version));
        }
        for key in deletes {
            data.remove(key.as_slice());
        }
        self.version.fetch_max(version, Ordering::AcqRel);
        trace!(
            target: "tkv::storage",
            version,
            writes = writes.len(),
            deletes = deletes.len(),
            "Applied batch"
        );
        Ok(())
    }
}
