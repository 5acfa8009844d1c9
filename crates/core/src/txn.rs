//! The transaction contract
//!
//! [`KvTxn`] is the surface a metadata engine programs against. Adapters
//! implement four primitives (`get`, `set`, `delete`, `walk`); everything else
//! is a provided method built on them, so batched reads, prefix scans,
//! counters and appends behave identically on every backend.
//!
//! Reads see the transaction's own buffered writes and deletes. Nothing
//! written here is visible outside until the owning backend commits.

use std::collections::BTreeMap;

use tracing::trace;

use crate::bound;
use crate::counter::{pack_counter, parse_counter};
use crate::error::{KvError, KvResult};

/// Predicate applied to `(key, value)` during scans
pub type ScanFilter<'f> = &'f dyn Fn(&[u8], &[u8]) -> bool;

/// Ordered map returned by scans
pub type KvMap = BTreeMap<Vec<u8>, Vec<u8>>;

/// Operations available inside one unit of work
///
/// The trait is object safe; work closures receive it as a trait object.
pub trait KvTxn {
    /// Read one key, `None` when absent or deleted in this transaction
    fn get(&mut self, key: &[u8]) -> KvResult<Option<Vec<u8>>>;

    /// Buffer a write
    fn set(&mut self, key: &[u8], value: &[u8]) -> KvResult<()>;

    /// Buffer a delete (deleting an absent key is not an error)
    fn delete(&mut self, key: &[u8]) -> KvResult<()>;

    /// Visit every entry with `begin <= key < end` in ascending key order
    ///
    /// `end == None` means no upper bound. `visit` returns `false` to stop.
    /// Buffered writes are included and buffered deletes excluded.
    fn walk(
        &mut self,
        begin: &[u8],
        end: Option<&[u8]>,
        visit: &mut dyn FnMut(&[u8], &[u8]) -> bool,
    ) -> KvResult<()>;

    /// Read several keys; result order matches `keys`
    fn gets(&mut self, keys: &[&[u8]]) -> KvResult<Vec<Option<Vec<u8>>>> {
        keys.iter().map(|key| self.get(key)).collect()
    }

    /// True iff some key starting with `prefix` exists
    ///
    /// An empty prefix asks whether the store holds any key at all.
    fn exist(&mut self, prefix: &[u8]) -> KvResult<bool> {
        // Every key >= an all-0xFF prefix starts with it, so no upper bound
        let end = match bound::next_key(prefix) {
            Ok(end) => end,
            Err(KvError::KeyOverflow(_)) => None,
            Err(e) => return Err(e),
        };
        let mut found = false;
        self.walk(prefix, end.as_deref(), &mut |_, _| {
            found = true;
            false
        })?;
        Ok(found)
    }

    /// All entries with `begin <= key < end` that pass `filter`
    ///
    /// `begin >= end` yields an empty map without touching the engine.
    fn scan_range(
        &mut self,
        begin: &[u8],
        end: &[u8],
        filter: Option<ScanFilter<'_>>,
    ) -> KvResult<KvMap> {
        collect_range(self, begin, Some(end), filter)
    }

    /// Keys starting with `prefix`, ascending
    fn scan_keys(&mut self, prefix: &[u8]) -> KvResult<Vec<Vec<u8>>> {
        let end = bound::next_key(prefix)?;
        let mut keys = Vec::new();
        self.walk(prefix, end.as_deref(), &mut |k, _| {
            keys.push(k.to_vec());
            true
        })?;
        Ok(keys)
    }

    /// Entries whose key starts with `prefix` and that pass `filter`
    fn scan_values(&mut self, prefix: &[u8], filter: Option<ScanFilter<'_>>) -> KvResult<KvMap> {
        let end = bound::next_key(prefix)?;
        collect_range(self, prefix, end.as_deref(), filter)
    }

    /// Exclusive upper bound of the keys prefixed by `key`
    fn next_key(&self, key: &[u8]) -> KvResult<Option<Vec<u8>>> {
        bound::next_key(key)
    }

    /// Append `suffix` to the current value (absent reads as empty)
    fn append(&mut self, key: &[u8], suffix: &[u8]) -> KvResult<Vec<u8>> {
        let mut value = self.get(key)?.unwrap_or_default();
        value.extend_from_slice(suffix);
        self.set(key, &value)?;
        Ok(value)
    }

    /// Add `delta` to the counter at `key` and return the new value
    ///
    /// Absent and zero-length values count as 0. The key is only written
    /// when `delta != 0`.
    fn incr_by(&mut self, key: &[u8], delta: i64) -> KvResult<i64> {
        let current = match self.get(key)? {
            Some(buf) if !buf.is_empty() => parse_counter(&buf)?,
            _ => 0,
        };
        let next = current
            .checked_add(delta)
            .ok_or(KvError::CounterOverflow { current, delta })?;
        if delta != 0 {
            self.set(key, &pack_counter(next))?;
        }
        trace!(target: "tkv::txn", key = ?key, current, delta, "incr_by");
        Ok(next)
    }

    /// Buffer deletes for every key
    fn dels(&mut self, keys: &[&[u8]]) -> KvResult<()> {
        for key in keys {
            self.delete(key)?;
        }
        Ok(())
    }
}

fn collect_range<T: KvTxn + ?Sized>(
    txn: &mut T,
    begin: &[u8],
    end: Option<&[u8]>,
    filter: Option<ScanFilter<'_>>,
) -> KvResult<KvMap> {
    let mut out = KvMap::new();
    if bound::is_empty_range(begin, end) {
        return Ok(out);
    }
    txn.walk(begin, end, &mut |k, v| {
        if filter.map_or(true, |f| f(k, v)) {
            out.insert(k.to_vec(), v.to_vec());
        }
        true
    })?;
    Ok(out)
}
