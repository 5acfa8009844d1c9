//! Storage layer for the native engine
//!
//! This crate implements the ordered in-memory state behind the `native`
//! backend:
//! - UnifiedStore: copy-on-write BTreeMap behind a RwLock
//! - Version management with AtomicU64
//! - StoreSnapshot: O(1) point-in-time views for transaction isolation

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod snapshot;
pub mod unified;

pub use snapshot::StoreSnapshot;
pub use unified::UnifiedStore;
