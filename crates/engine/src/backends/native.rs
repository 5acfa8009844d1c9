//! Native backend: ordered in-memory store, write-ahead log and OCC
//!
//! Layout of the backend directory:
//!
//! ```text
//! <dir>/LOCK      exclusive advisory lock held while open
//! <dir>/wal.log   one record per committed transaction
//! <dir>/tkv.toml  configuration
//! ```
//!
//! Transactions read from an O(1) snapshot of the store taken at `begin`.
//! Commit runs under the log mutex: validate the read set, append the
//! record, apply it to the store. The first committer wins; a transaction
//! whose reads were invalidated fails with `KvError::Conflict`.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use parking_lot::Mutex;
use tracing::{error, info};

use tkv_concurrency::{TransactionContext, TransactionManager};
use tkv_core::{Engine, KvError, KvResult, KvTxn, Storage, Transaction};
use tkv_durability::{recover, Wal, WalRecord};
use tkv_storage::UnifiedStore;

use crate::client::Client;
use crate::config::TkvConfig;

/// Registered name
pub const NAME: &str = "native";

const WAL_FILE_NAME: &str = "wal.log";
const LOCK_FILE_NAME: &str = "LOCK";
/// Growth over the last compacted size needed before compacting again
const COMPACT_GROWTH_FACTOR: u64 = 2;

/// Open (or create) a native backend in `dir`
pub fn open(dir: &Path, config: &TkvConfig) -> KvResult<Client> {
    Ok(Client::new(NativeEngine::open(dir, config)?))
}

/// An opened native backend
pub struct NativeEngine {
    dir: PathBuf,
    store: UnifiedStore,
    manager: TransactionManager,
    /// Doubles as the commit lock
    wal: Mutex<Wal>,
    compact_threshold: u64,
    /// Held for the lifetime of the engine; released on drop
    _lock_file: File,
}

impl std::fmt::Debug for NativeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeEngine")
            .field("dir", &self.dir)
            .field("version", &self.manager.current_version())
            .field("keys", &self.store.len())
            .field("snapshots", &self.store.live_snapshots())
            .finish()
    }
}

impl NativeEngine {
    /// Lock the directory, replay the log and start accepting transactions
    ///
    /// # Errors
    ///
    /// `KvError::Io` if the directory is locked by another handle or cannot
    /// be created; `KvError::Corruption` if the log is damaged before its
    /// last record; `KvError::Config` for invalid settings.
    pub fn open(dir: &Path, config: &TkvConfig) -> KvResult<Self> {
        let mode = config.native.durability_mode()?;
        std::fs::create_dir_all(dir)?;

        let lock_path = dir.join(LOCK_FILE_NAME);
        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)?;
        lock_file.try_lock_exclusive().map_err(|_| {
            KvError::Io(io::Error::new(
                io::ErrorKind::WouldBlock,
                format!(
                    "backend directory '{}' is already in use (lock file: {})",
                    dir.display(),
                    lock_path.display()
                ),
            ))
        })?;

        let wal_path = dir.join(WAL_FILE_NAME);
        let store = UnifiedStore::new();
        let stats = recover(&wal_path, &store)?;
        let wal = Wal::open(&wal_path, mode)?;

        info!(
            target: "tkv::native",
            path = %dir.display(),
            records = stats.records,
            version = stats.final_version,
            keys = store.len(),
            "Opened native backend"
        );

        Ok(Self {
            dir: dir.to_path_buf(),
            manager: TransactionManager::new(store.current_version()),
            store,
            wal: Mutex::new(wal),
            compact_threshold: config.native.compact_threshold_bytes,
            _lock_file: lock_file,
        })
    }

    /// Version of the most recent commit
    pub fn current_version(&self) -> u64 {
        self.store.current_version()
    }

    /// True once the log passed the threshold and doubled since it was last
    /// rewritten, so a large live set is not rewritten on every commit
    fn should_compact(&self, wal: &Wal) -> bool {
        let floor = wal.compacted_size().saturating_mul(COMPACT_GROWTH_FACTOR);
        wal.size() > self.compact_threshold.max(floor)
    }

    /// Rewrite the log as a single record holding every live pair
    ///
    /// Must be called with the log mutex held so no commit interleaves.
    fn compact_locked(&self, wal: &mut Wal) -> KvResult<()> {
        let (version, writes) = self.store.export();
        wal.compact(&WalRecord {
            version,
            writes,
            deletes: Vec::new(),
        })
    }
}

impl Engine for NativeEngine {
    fn name(&self) -> &'static str {
        NAME
    }

    fn begin(&self) -> KvResult<Box<dyn Transaction + '_>> {
        let ctx =
            TransactionContext::with_snapshot(self.manager.next_txn_id(), self.store.create_snapshot());
        Ok(Box::new(NativeTxn { engine: self, ctx }))
    }
}

struct NativeTxn<'e> {
    engine: &'e NativeEngine,
    ctx: TransactionContext,
}

impl KvTxn for NativeTxn<'_> {
    fn get(&mut self, key: &[u8]) -> KvResult<Option<Vec<u8>>> {
        self.ctx.get(key)
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> KvResult<()> {
        self.ctx.set(key, value)
    }

    fn delete(&mut self, key: &[u8]) -> KvResult<()> {
        self.ctx.delete(key)
    }

    fn walk(
        &mut self,
        begin: &[u8],
        end: Option<&[u8]>,
        visit: &mut dyn FnMut(&[u8], &[u8]) -> bool,
    ) -> KvResult<()> {
        self.ctx.walk(begin, end, visit)
    }
}

impl Transaction for NativeTxn<'_> {
    fn commit(self: Box<Self>) -> KvResult<()> {
        let NativeTxn { engine, mut ctx } = *self;
        let mut wal = engine.wal.lock();
        engine.manager.commit(&mut ctx, &engine.store, &mut wal)?;

        if engine.should_compact(&wal) {
            // The commit itself is durable; a failed rewrite leaves the old log
            if let Err(e) = engine.compact_locked(&mut wal) {
                error!(target: "tkv::native", error = %e, "WAL compaction failed");
            }
        }
        Ok(())
    }

    fn rollback(self: Box<Self>) {
        let NativeTxn { engine, mut ctx } = *self;
        engine.manager.abort(&mut ctx, "rolled back by caller");
    }
}
