//! Backend contract
//!
//! An [`Engine`] is one opened storage backend. Each unit of work runs in a
//! fresh [`Transaction`] obtained from [`Engine::begin`] and is finished by
//! exactly one call to `commit` or `rollback`.

use crate::error::KvResult;
use crate::txn::KvTxn;

/// One in-flight transaction against a backend
///
/// Both terminal operations consume the transaction, so a transaction cannot
/// be reused after it finished.
pub trait Transaction: KvTxn {
    /// Make every buffered write visible atomically
    ///
    /// # Errors
    ///
    /// `KvError::Conflict` when an optimistic backend detects that a key read
    /// by this transaction changed since it began; engine faults otherwise.
    fn commit(self: Box<Self>) -> KvResult<()>;

    /// Discard every buffered write
    fn rollback(self: Box<Self>);
}

/// An opened backend
pub trait Engine: Send + Sync {
    /// Registered backend name
    fn name(&self) -> &'static str;

    /// Start a transaction with a consistent view of committed state
    fn begin(&self) -> KvResult<Box<dyn Transaction + '_>>;
}
