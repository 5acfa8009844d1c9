//! Write-ahead log
//!
//! Every committed transaction of the native engine is appended here as one
//! [`WalRecord`] before its writes become visible. The log is the only
//! durable state of that engine: on open it is replayed into an empty store
//! (see [`crate::recovery`]).
//!
//! ## Operations
//!
//! - `Wal::open()` - open or create the log file
//! - `Wal::append()` - append a record, syncing per [`DurabilityMode`]
//! - `Wal::flush()` - flush buffered writes to the OS
//! - `Wal::fsync()` - flush and force to disk
//! - `Wal::compact()` - atomically replace the log with a single record
//!
//! A failed append is cut back out of the file before the error is returned,
//! so a commit reported as failed never reappears on replay. If the cut
//! itself fails the log is poisoned and refuses further writes.
//!
//! ## Durability Modes
//!
//! - `Strict` - fsync after every commit (slow, maximum durability)
//! - `Batched` - fsync every N commits (DEFAULT)
//! - `Cache` - flush to the OS only; a machine crash may lose recent commits

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use tkv_core::{KvError, KvResult};

use crate::encoding::{decode_all, encode_record};

/// One committed transaction
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WalRecord {
    /// Commit version assigned to every write in the record
    pub version: u64,
    /// Keys written with their new values
    pub writes: Vec<(Vec<u8>, Vec<u8>)>,
    /// Keys deleted
    pub deletes: Vec<Vec<u8>>,
}

impl WalRecord {
    /// True when the record changes nothing
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty() && self.deletes.is_empty()
    }
}

/// When appended records are forced to disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurabilityMode {
    /// fsync after every commit
    Strict,
    /// fsync once every `batch_size` commits; flush after each one
    Batched {
        /// Commits between fsyncs
        batch_size: usize,
    },
    /// Flush to OS buffers only
    Cache,
}

impl Default for DurabilityMode {
    fn default() -> Self {
        DurabilityMode::Batched { batch_size: 64 }
    }
}

/// Append-only log file
///
/// Not internally synchronized: the native engine keeps it behind its commit
/// lock.
#[derive(Debug)]
pub struct Wal {
    path: PathBuf,
    /// `None` once poisoned by an append that could not be undone
    writer: Option<BufWriter<File>>,
    /// Current file size (offset of the next record)
    size: u64,
    /// File size right after the last compaction (0 before any)
    compacted_size: u64,
    mode: DurabilityMode,
    /// Records appended since the last fsync
    unsynced: usize,
}

impl Wal {
    /// Open an existing log or create an empty one
    ///
    /// Creates parent directories if they don't exist. The file must already
    /// have been recovered; appends go after whatever it holds.
    pub fn open<P: AsRef<Path>>(path: P, mode: DurabilityMode) -> KvResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = open_append(&path)?;
        let size = file.metadata()?.len();
        debug!(target: "tkv::wal", path = %path.display(), size, ?mode, "Opened WAL");

        Ok(Self {
            path,
            writer: Some(BufWriter::new(file)),
            size,
            compacted_size: 0,
            mode,
            unsynced: 0,
        })
    }

    /// Append a record, returning the offset it was written at
    ///
    /// On error nothing of the record remains in the file or the buffer.
    pub fn append(&mut self, record: &WalRecord) -> KvResult<u64> {
        let offset = self.size;
        let encoded = encode_record(record)?;
        if let Err(e) = self.write_durable(&encoded) {
            self.discard_from(offset);
            return Err(e);
        }
        self.size += encoded.len() as u64;
        Ok(offset)
    }

    fn write_durable(&mut self, encoded: &[u8]) -> KvResult<()> {
        self.writer()?.write_all(encoded)?;
        match self.mode {
            DurabilityMode::Strict => self.fsync(),
            DurabilityMode::Batched { batch_size } => {
                self.unsynced += 1;
                if self.unsynced >= batch_size.max(1) {
                    self.fsync()
                } else {
                    self.flush()
                }
            }
            DurabilityMode::Cache => self.flush(),
        }
    }

    /// Drop buffered bytes and truncate the file back to `offset`
    fn discard_from(&mut self, offset: u64) {
        let Some(stale) = self.writer.take() else {
            return;
        };
        // into_parts hands the file back without flushing the buffer
        let (file, _unwritten) = stale.into_parts();
        match file.set_len(offset) {
            Ok(()) => {
                warn!(target: "tkv::wal", offset, "Discarded failed append");
                self.writer = Some(BufWriter::new(file));
                self.size = offset;
            }
            Err(e) => {
                error!(target: "tkv::wal", offset, error = %e, "Could not discard failed append; WAL poisoned");
            }
        }
    }

    fn writer(&mut self) -> KvResult<&mut BufWriter<File>> {
        self.writer.as_mut().ok_or_else(|| {
            KvError::Io(io::Error::new(
                io::ErrorKind::Other,
                "write-ahead log is poisoned by an earlier failed append",
            ))
        })
    }

    /// True after an append failed and could not be undone
    pub fn is_poisoned(&self) -> bool {
        self.writer.is_none()
    }

    /// Flush buffered writes to OS buffers
    pub fn flush(&mut self) -> KvResult<()> {
        self.writer()?.flush()?;
        Ok(())
    }

    /// Flush and force all appended records to disk
    pub fn fsync(&mut self) -> KvResult<()> {
        let writer = self.writer()?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        self.unsynced = 0;
        Ok(())
    }

    /// Read every complete record from the start of the log
    pub fn read_all(&mut self) -> KvResult<Vec<WalRecord>> {
        self.flush()?;
        let bytes = fs::read(&self.path)?;
        let (records, _) = decode_all(&bytes)?;
        Ok(records)
    }

    /// Replace the whole log with `record`
    ///
    /// The record is written to a temporary file which is synced and renamed
    /// over the log, so a crash leaves either the old or the new log.
    pub fn compact(&mut self, record: &WalRecord) -> KvResult<()> {
        self.flush()?;
        let before = self.size;

        let tmp_path = self.path.with_extension("compact");
        let encoded = encode_record(record)?;
        {
            let mut tmp = File::create(&tmp_path)?;
            tmp.write_all(&encoded)?;
            tmp.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        sync_parent_dir(&self.path);

        self.writer = Some(BufWriter::new(open_append(&self.path)?));
        self.size = encoded.len() as u64;
        self.compacted_size = self.size;
        self.unsynced = 0;

        info!(
            target: "tkv::wal",
            before,
            after = self.size,
            version = record.version,
            keys = record.writes.len(),
            "Compacted WAL"
        );
        Ok(())
    }

    /// Current file size in bytes
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Size the log had right after the last `compact`, 0 if never compacted
    pub fn compacted_size(&self) -> u64 {
        self.compacted_size
    }
}

impl Drop for Wal {
    fn drop(&mut self) {
        // Final fsync so nothing flushed-but-unsynced is lost on clean shutdown
        if !self.is_poisoned() {
            let _ = self.fsync();
        }
    }
}

fn open_append(path: &Path) -> KvResult<File> {
    Ok(OpenOptions::new()
        .create(true)
        .append(true)
        .read(true)
        .open(path)?)
}

#[cfg(unix)]
fn sync_parent_dir(path: &Path) {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Ok(dir) = File::open(parent) {
            let _ = dir.sync_all();
        }
    }
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) {}
