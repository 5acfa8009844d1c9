//! StoreSnapshot: point-in-time views for transaction isolation
//!
//! A snapshot holds an `Arc` of the map as it was when the snapshot was
//! taken. The store never mutates a shared map in place, so the view is
//! immutable and needs no lock.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use tkv_core::bound::is_empty_range;
use tkv_core::{RangeIter, SnapshotView, VersionedValue};

/// Immutable view of a [`crate::UnifiedStore`]
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    /// The store version at which this snapshot was created
    version: u64,
    /// Shared map, frozen for this snapshot
    data: Arc<BTreeMap<Vec<u8>, VersionedValue>>,
}

impl StoreSnapshot {
    /// Wrap a shared map
    ///
    /// Normally called by `UnifiedStore::create_snapshot()`.
    pub fn new(version: u64, data: Arc<BTreeMap<Vec<u8>, VersionedValue>>) -> Self {
        Self { version, data }
    }

    /// Number of keys visible in this snapshot
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the snapshot holds no key
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl SnapshotView for StoreSnapshot {
    fn get(&self, key: &[u8]) -> Option<&VersionedValue> {
        self.data.get(key)
    }

    fn range<'a>(&'a self, begin: &[u8], end: Option<&[u8]>) -> RangeIter<'a> {
        // BTreeMap::range panics on reversed bounds
        if is_empty_range(begin, end) {
            return Box::new(std::iter::empty());
        }
        let upper = end.map_or(Bound::Unbounded, Bound::Excluded);
        Box::new(
            self.data
                .range::<[u8], _>((Bound::Included(begin), upper))
                .map(|(k, v)| (k.as_slice(), v)),
        )
    }

    fn version(&self) -> u64 {
        self.version
    }
}
