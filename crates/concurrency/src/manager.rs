//! Transaction manager for coordinating commit operations
//!
//! Provides atomic commit by orchestrating:
//! 1. Validation (first-committer-wins)
//! 2. WAL append (durability)
//! 3. Storage application (visibility)
//!
//! ## Commit Sequence
//!
//! ```text
//! 1. txn.commit(store)   - Active → Validating → Committed | Aborted
//! 2. read-only?          - done, nothing to log or apply
//! 3. allocate version    - one version for the whole transaction
//! 4. wal.append(record)  - DURABILITY POINT
//! 5. store.apply_batch() - writes become visible
//! ```
//!
//! The caller must hold its commit lock across `commit`: validation and
//! application have to be atomic with respect to other committers.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, error, warn};

use tkv_core::Storage;
use tkv_durability::{Wal, WalRecord};

use crate::transaction::{CommitError, TransactionContext, TransactionStatus};

/// Manages transaction ids and commit versions
#[derive(Debug)]
pub struct TransactionManager {
    /// Global version counter, incremented once per committed transaction
    version: AtomicU64,
    /// Next transaction ID
    next_txn_id: AtomicU64,
}

impl TransactionManager {
    /// Create a manager continuing from `initial_version`
    ///
    /// `initial_version` is normally the recovered store version.
    pub fn new(initial_version: u64) -> Self {
        Self {
            version: AtomicU64::new(initial_version),
            next_txn_id: AtomicU64::new(1),
        }
    }

    /// Current global version
    pub fn current_version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    /// Allocate the next transaction ID
    pub fn next_txn_id(&self) -> u64 {
        self.next_txn_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Allocate the next commit version
    pub fn allocate_version(&self) -> u64 {
        self.version.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Commit a transaction atomically
    ///
    /// Returns the commit version. A read-only transaction returns its start
    /// version and touches neither the log nor the store.
    pub fn commit<S: Storage + ?Sized>(
        &self,
        txn: &mut TransactionContext,
        store: &S,
        wal: &mut Wal,
    ) -> Result<u64, CommitError> {
        if let Err(e) = txn.commit(store) {
            if let CommitError::ValidationFailed(result) = &e {
                warn!(
                    target: "tkv::txn",
                    txn_id = txn.txn_id,
                    conflicts = result.conflict_count(),
                    "Commit conflict"
                );
            }
            return Err(e);
        }

        if txn.is_read_only() {
            return Ok(txn.start_version);
        }

        let version = self.allocate_version();
        let (writes, deletes) = txn.take_mutations();
        let record = WalRecord {
            version,
            writes,
            deletes,
        };

        if let Err(e) = wal.append(&record) {
            txn.status = TransactionStatus::Aborted {
                reason: format!("WAL append failed: {}", e),
            };
            return Err(CommitError::Wal(e));
        }

        // DURABILITY POINT: the record is in the log
        if let Err(e) = store.apply_batch(&record.writes, &record.deletes, version) {
            error!(
                target: "tkv::txn",
                txn_id = txn.txn_id,
                version,
                error = %e,
                "Storage application failed after WAL append; will be recovered on restart"
            );
        }

        debug!(
            target: "tkv::txn",
            txn_id = txn.txn_id,
            version,
            writes = record.writes.len(),
            deletes = record.deletes.len(),
            "Committed"
        );
        Ok(version)
    }

    /// Abort a transaction, discarding its buffered operations
    pub fn abort(&self, txn: &mut TransactionContext, reason: &str) {
        if txn.mark_aborted(reason).is_ok() {
            debug!(target: "tkv::txn", txn_id = txn.txn_id, reason, "Aborted");
        }
    }
}
