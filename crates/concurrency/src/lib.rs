//! Concurrency layer for the native engine
//!
//! This crate implements optimistic concurrency control (OCC) with:
//! - TransactionContext: read/write/delete set tracking over a snapshot
//! - Snapshot isolation with read-your-writes for point reads and scans
//! - Read-set validation at commit time (first committer wins)
//! - TransactionManager: validate, log, then apply

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod manager;
pub mod transaction;
pub mod validation;

pub use manager::TransactionManager;
pub use transaction::{CommitError, TransactionContext, TransactionStatus};
pub use validation::{validate_read_set, ConflictType, ValidationResult};
