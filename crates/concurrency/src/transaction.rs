//! Transaction context for optimistic concurrency control
//!
//! A [`TransactionContext`] reads from an immutable snapshot, buffers writes
//! and deletes locally, and records the version of every key it reads so the
//! commit can be validated against the current store.
//!
//! # Read-Your-Writes Semantics
//!
//! When reading a key, the transaction checks in order:
//! 1. **write_set**: returns the uncommitted write from this transaction
//! 2. **delete_set**: returns None for an uncommitted delete
//! 3. **snapshot**: returns the snapshot value, tracked in read_set
//!
//! Scans merge the snapshot range with the write_set range and skip keys in
//! the delete_set. Every snapshot key a scan visits is tracked in read_set.
//!
//! # Lifecycle
//!
//! `Active` → `Validating` → `Committed` | `Aborted { reason }`. Once a
//! transaction leaves `Active` every operation fails with
//! `KvError::NotActive`.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Bound;

use thiserror::Error;

use tkv_core::bound::is_empty_range;
use tkv_core::{KvError, KvResult, KvTxn, RangeIter, SnapshotView, Storage, VersionedValue};

use crate::validation::{validate_read_set, ValidationResult};

/// Errors that can occur during commit
#[derive(Debug, Error)]
pub enum CommitError {
    /// Transaction aborted due to read-set conflicts
    #[error("commit failed: {} conflict(s)", .0.conflict_count())]
    ValidationFailed(ValidationResult),

    /// Transaction was not in the correct state for commit
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Appending the commit record failed; nothing was applied
    #[error("WAL error: {0}")]
    Wal(#[source] KvError),
}

impl From<CommitError> for KvError {
    fn from(e: CommitError) -> Self {
        match e {
            CommitError::ValidationFailed(result) => {
                let detail = result
                    .conflicts
                    .first()
                    .map(|c| c.to_string())
                    .unwrap_or_default();
                KvError::Conflict(format!(
                    "{} conflict(s): {}",
                    result.conflict_count(),
                    detail
                ))
            }
            CommitError::InvalidState(msg) => KvError::NotActive(msg),
            CommitError::Wal(e) => e,
        }
    }
}

/// Status of a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Transaction is executing, can read/write
    Active,
    /// Transaction is being validated for conflicts
    Validating,
    /// Transaction committed successfully
    Committed,
    /// Transaction was aborted
    Aborted {
        /// Human-readable reason for abort
        reason: String,
    },
}

/// Per-transaction state of the native engine
pub struct TransactionContext {
    /// Unique transaction ID
    pub txn_id: u64,

    /// Store version at transaction start (snapshot version)
    pub start_version: u64,

    /// Consistent point-in-time view of storage
    snapshot: Box<dyn SnapshotView>,

    /// Keys read and their versions (0 = absent when read)
    pub read_set: HashMap<Vec<u8>, u64>,

    /// Keys written with their new values (buffered)
    pub write_set: BTreeMap<Vec<u8>, Vec<u8>>,

    /// Keys to delete (buffered)
    ///
    /// A key is never in both write_set and delete_set.
    pub delete_set: BTreeSet<Vec<u8>>,

    /// Current transaction status
    pub status: TransactionStatus,
}

impl std::fmt::Debug for TransactionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionContext")
            .field("txn_id", &self.txn_id)
            .field("start_version", &self.start_version)
            .field("reads", &self.read_set.len())
            .field("writes", &self.write_set.len())
            .field("deletes", &self.delete_set.len())
            .field("status", &self.status)
            .finish()
    }
}

impl TransactionContext {
    /// Create an active transaction reading from `snapshot`
    pub fn with_snapshot(txn_id: u64, snapshot: impl SnapshotView + 'static) -> Self {
        let start_version = snapshot.version();
        Self {
            txn_id,
            start_version,
            snapshot: Box::new(snapshot),
            read_set: HashMap::new(),
            write_set: BTreeMap::new(),
            delete_set: BTreeSet::new(),
            status: TransactionStatus::Active,
        }
    }

    /// True while operations are allowed
    pub fn is_active(&self) -> bool {
        self.status == TransactionStatus::Active
    }

    /// Fail with `NotActive` unless the transaction is active
    pub fn ensure_active(&self) -> KvResult<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(KvError::NotActive(format!(
                "transaction {} is {:?}",
                self.txn_id, self.status
            )))
        }
    }

    /// True when nothing was written or deleted
    pub fn is_read_only(&self) -> bool {
        self.write_set.is_empty() && self.delete_set.is_empty()
    }

    /// Validate against `store` and move to `Committed` or `Aborted`
    ///
    /// Does not apply anything; see `TransactionManager::commit`.
    pub fn commit<S: Storage + ?Sized>(&mut self, store: &S) -> Result<(), CommitError> {
        if !self.is_active() {
            return Err(CommitError::InvalidState(format!(
                "cannot commit transaction {} from {:?} state",
                self.txn_id, self.status
            )));
        }
        self.status = TransactionStatus::Validating;

        let result = validate_read_set(&self.read_set, store);
        if !result.is_valid() {
            self.status = TransactionStatus::Aborted {
                reason: format!("{} conflict(s) detected", result.conflict_count()),
            };
            return Err(CommitError::ValidationFailed(result));
        }

        self.status = TransactionStatus::Committed;
        Ok(())
    }

    /// Abort and discard every buffered operation
    ///
    /// The read_set is kept for diagnostics.
    pub fn mark_aborted(&mut self, reason: impl Into<String>) -> KvResult<()> {
        match &self.status {
            TransactionStatus::Committed => Err(KvError::NotActive(format!(
                "cannot abort committed transaction {}",
                self.txn_id
            ))),
            TransactionStatus::Aborted { .. } => Err(KvError::NotActive(format!(
                "transaction {} already aborted",
                self.txn_id
            ))),
            _ => {
                self.status = TransactionStatus::Aborted {
                    reason: reason.into(),
                };
                self.write_set.clear();
                self.delete_set.clear();
                Ok(())
            }
        }
    }

    /// Drain buffered writes and deletes in key order
    ///
    /// Also drops the snapshot, so applying the batch does not have to copy
    /// a map that only this transaction still referenced.
    pub(crate) fn take_mutations(&mut self) -> (Vec<(Vec<u8>, Vec<u8>)>, Vec<Vec<u8>>) {
        self.snapshot = Box::new(Released {
            version: self.start_version,
        });
        let writes = std::mem::take(&mut self.write_set).into_iter().collect();
        let deletes = std::mem::take(&mut self.delete_set).into_iter().collect();
        (writes, deletes)
    }
}

/// Stand-in view once a transaction has handed its mutations to the manager
struct Released {
    version: u64,
}

impl SnapshotView for Released {
    fn get(&self, _key: &[u8]) -> Option<&VersionedValue> {
        None
    }

    fn range<'a>(&'a self, _begin: &[u8], _end: Option<&[u8]>) -> RangeIter<'a> {
        Box::new(std::iter::empty())
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl KvTxn for TransactionContext {
    fn get(&mut self, key: &[u8]) -> KvResult<Option<Vec<u8>>> {
        self.ensure_active()?;

        // Own writes and deletes are not tracked in read_set
        if let Some(value) = self.write_set.get(key) {
            return Ok(Some(value.clone()));
        }
        if self.delete_set.contains(key) {
            return Ok(None);
        }

        let found = self.snapshot.get(key);
        let version = found.map_or(0, |vv| vv.version);
        self.read_set.entry(key.to_vec()).or_insert(version);
        Ok(found.map(|vv| vv.value.clone()))
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> KvResult<()> {
        self.ensure_active()?;
        self.delete_set.remove(key);
        self.write_set.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> KvResult<()> {
        self.ensure_active()?;
        self.write_set.remove(key);
        self.delete_set.insert(key.to_vec());
        Ok(())
    }

    fn walk(
        &mut self,
        begin: &[u8],
        end: Option<&[u8]>,
        visit: &mut dyn FnMut(&[u8], &[u8]) -> bool,
    ) -> KvResult<()> {
        self.ensure_active()?;
        if is_empty_range(begin, end) {
            return Ok(());
        }

        let upper = end.map_or(Bound::Unbounded, Bound::Excluded);
        let mut base = self.snapshot.range(begin, end).peekable();
        let mut local = self
            .write_set
            .range::<[u8], _>((Bound::Included(begin), upper))
            .peekable();

        loop {
            let order = match (base.peek(), local.peek()) {
                (None, None) => break,
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (Some((bk, _)), Some((lk, _))) => (*bk).cmp(lk.as_slice()),
            };
            let from_base = if order != Ordering::Greater { base.next() } else { None };
            let from_local = if order != Ordering::Less { local.next() } else { None };

            if let Some((k, vv)) = from_base {
                self.read_set.entry(k.to_vec()).or_insert(vv.version);
            }

            let entry = match (from_base, from_local) {
                (_, Some((k, v))) => Some((k.as_slice(), v.as_slice())),
                (Some((k, vv)), None) if !self.delete_set.contains(k) => {
                    Some((k, vv.value.as_slice()))
                }
                _ => None,
            };
            if let Some((k, v)) = entry {
                if !visit(k, v) {
                    break;
                }
            }
        }
        Ok(())
    }
}
