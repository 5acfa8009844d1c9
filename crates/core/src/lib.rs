//! Core types and traits for tkv
//!
//! This crate defines the contract shared by every backend:
//! - KvTxn: the transaction surface (reads, scans, counters, buffered writes)
//! - Engine / Transaction: what a backend adapter implements
//! - Counter codec and key-bound calculator
//! - KvError: the error type of every layer
//! - Storage / SnapshotView: the ordered store seen by the native engine

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod bound;
pub mod counter;
pub mod error;
pub mod traits;
pub mod txn;
pub mod value;

pub use backend::{Engine, Transaction};
pub use bound::next_key;
pub use counter::{pack_counter, parse_counter, COUNTER_WIDTH};
pub use error::{KvError, KvResult};
pub use traits::{RangeIter, SnapshotView, Storage};
pub use txn::{KvMap, KvTxn, ScanFilter};
pub use value::VersionedValue;
