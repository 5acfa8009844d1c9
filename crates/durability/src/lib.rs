//! Durability layer for the native engine
//!
//! This crate implements:
//! - WalRecord: one record per committed transaction
//! - Entry encoding with CRC32 checksums
//! - Wal: append-only log with configurable fsync policy and compaction
//! - Recovery: replay of the log into a store, torn-tail truncation

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod encoding;
pub mod recovery;
pub mod wal;

pub use encoding::{decode_record, encode_record, Decoded};
pub use recovery::{recover, RecoveryStats};
pub use wal::{DurabilityMode, Wal, WalRecord};
