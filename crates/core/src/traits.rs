//! Storage and snapshot abstraction for the native engine
//!
//! The concurrency layer only talks to these traits, so the ordered store
//! behind the native engine can be swapped without touching commit logic.

use crate::error::KvResult;
use crate::value::VersionedValue;

/// Iterator over `(key, value)` pairs in ascending key order
pub type RangeIter<'a> = Box<dyn Iterator<Item = (&'a [u8], &'a VersionedValue)> + 'a>;

/// Committed state of an ordered byte-keyed store
///
/// Thread safety: all methods must be safe to call concurrently.
pub trait Storage: Send + Sync {
    /// Latest committed value for `key`
    fn get(&self, key: &[u8]) -> KvResult<Option<VersionedValue>>;

    /// Commit version of `key`, 0 when absent
    fn get_version(&self, key: &[u8]) -> u64;

    /// Highest commit version applied so far
    fn current_version(&self) -> u64;

    /// Apply writes and deletes atomically with one commit version
    ///
    /// No reader observes a partial batch.
    fn apply_batch(
        &self,
        writes: &[(Vec<u8>, Vec<u8>)],
        deletes: &[Vec<u8>],
        version: u64,
    ) -> KvResult<()>;
}

/// Immutable point-in-time view of a [`Storage`]
pub trait SnapshotView: Send + Sync {
    /// Value of `key` as of this snapshot
    fn get(&self, key: &[u8]) -> Option<&VersionedValue>;

    /// Entries with `begin <= key < end` (`end == None` is unbounded)
    ///
    /// Reversed or empty ranges yield nothing.
    fn range<'a>(&'a self, begin: &[u8], end: Option<&[u8]>) -> RangeIter<'a>;

    /// Store version this snapshot was taken at
    fn version(&self) -> u64;
}
