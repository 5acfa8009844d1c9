//! tkv - one transactional key-value contract over interchangeable engines
//!
//! A host opens a named backend in a directory and runs units of work
//! against it. Each unit of work sees a consistent view, and its writes
//! become visible all at once or not at all.
//!
//! # Quick Start
//!
//! ```ignore
//! use tkv::{open, KvResult, KvTxn};
//!
//! let client = tkv::open("native", "/var/lib/meta")?;
//!
//! client.txn(|tx| -> KvResult<()> {
//!     tx.set(b"inode/1", b"root")?;
//!     tx.incr_by(b"next_inode", 1)?;
//!     Ok(())
//! })?;
//!
//! let children = client.txn(|tx| tx.scan_keys(b"dirent/1/"))?;
//! ```
//!
//! # Backends
//!
//! - `native`: in-memory ordered store with a write-ahead log and
//!   optimistic concurrency control (always available)
//! - `redb`: redb database file (feature `redb`, on by default)
//! - `lmdb`: LMDB environment through heed (feature `lmdb`)

pub use tkv_core::{
    next_key, pack_counter, parse_counter, Engine, KvError, KvMap, KvResult, KvTxn, ScanFilter,
    Transaction, COUNTER_WIDTH,
};
pub use tkv_engine::{
    backends, default_registry, open, Client, Constructor, LmdbConfig, NativeConfig, RedbConfig,
    Registry, RetryConfig, TkvConfig,
};
