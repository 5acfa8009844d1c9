//! WAL replay for recovery
//!
//! Restores a store from the write-ahead log on open.
//!
//! ## Replay Process
//!
//! 1. Read the log from the beginning
//! 2. Apply every complete record in order, preserving its commit version
//! 3. Truncate an incomplete trailing record (crash mid-append)
//!
//! A checksum mismatch or undecodable record in the middle of the log is
//! `KvError::Corruption`; recovery refuses to guess past it.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;

use tracing::{info, warn};

use tkv_core::{KvResult, Storage};

use crate::encoding::decode_all;

/// Statistics from WAL replay
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecoveryStats {
    /// Records applied
    pub records: usize,
    /// Highest commit version seen (0 for an empty log)
    pub final_version: u64,
    /// Bytes of torn trailing record removed from the log
    pub truncated_bytes: u64,
}

/// Replay the log at `path` into `store`
///
/// A missing file is an empty log.
pub fn recover<S: Storage + ?Sized>(path: &Path, store: &S) -> KvResult<RecoveryStats> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(RecoveryStats::default()),
        Err(e) => return Err(e.into()),
    };

    let (records, valid_len) = decode_all(&bytes)?;

    let mut stats = RecoveryStats::default();
    for record in &records {
        store.apply_batch(&record.writes, &record.deletes, record.version)?;
        stats.records += 1;
        stats.final_version = stats.final_version.max(record.version);
    }

    if valid_len < bytes.len() {
        stats.truncated_bytes = (bytes.len() - valid_len) as u64;
        warn!(
            target: "tkv::recovery",
            path = %path.display(),
            offset = valid_len,
            bytes = stats.truncated_bytes,
            "Truncating incomplete trailing WAL record"
        );
        let file = OpenOptions::new().write(true).open(path)?;
        file.set_len(valid_len as u64)?;
        file.sync_all()?;
    }

    info!(
        target: "tkv::recovery",
        path = %path.display(),
        records = stats.records,
        final_version = stats.final_version,
        "Recovered from WAL"
    );
    Ok(stats)
}
