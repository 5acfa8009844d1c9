//! LMDB backend via heed
//!
//! The environment lives directly in the backend directory (`data.mdb`,
//! `lock.mdb`). Each [`Transaction`] holds one LMDB write transaction on the
//! unnamed database; LMDB serializes writers, giving the same guarantees as
//! the redb backend.
//!
//! LMDB cannot store empty keys or keys longer than 511 bytes. Reading or
//! deleting such a key finds nothing; writing one fails with
//! `KvError::Engine`.

use std::fmt::Display;
use std::ops::Bound;
use std::path::{Path, PathBuf};

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions, RwTxn};
use tracing::info;

use tkv_core::{Engine, KvError, KvResult, KvTxn, Transaction};

use crate::client::Client;
use crate::config::TkvConfig;

/// Registered name
pub const NAME: &str = "lmdb";

/// Longest key LMDB accepts with its default page size
const MAX_KEY_SIZE: usize = 511;

fn storable(key: &[u8]) -> bool {
    !key.is_empty() && key.len() <= MAX_KEY_SIZE
}

fn engine_err(e: impl Display) -> KvError {
    KvError::engine(NAME, e)
}

/// Open (or create) an LMDB backend in `dir`
pub fn open(dir: &Path, config: &TkvConfig) -> KvResult<Client> {
    Ok(Client::new(LmdbEngine::open(dir, config)?))
}

/// An opened LMDB environment
pub struct LmdbEngine {
    dir: PathBuf,
    env: Env,
    db: Database<Bytes, Bytes>,
}

impl std::fmt::Debug for LmdbEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LmdbEngine").field("dir", &self.dir).finish()
    }
}

impl LmdbEngine {
    /// Open the environment in `dir` with the `[lmdb]` settings
    pub fn open(dir: &Path, config: &TkvConfig) -> KvResult<Self> {
        std::fs::create_dir_all(dir)?;

        // SAFETY: the environment is opened once per directory per process;
        // the directory lock of LMDB guards against concurrent writers and
        // the memory map is never truncated while this handle is alive.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(config.lmdb.map_size)
                .max_readers(config.lmdb.max_readers)
                .open(dir)
        }
        .map_err(engine_err)?;

        let mut init = env.write_txn().map_err(engine_err)?;
        let db: Database<Bytes, Bytes> = env
            .create_database(&mut init, None)
            .map_err(engine_err)?;
        init.commit().map_err(engine_err)?;

        info!(
            target: "tkv::lmdb",
            path = %dir.display(),
            map_size = config.lmdb.map_size,
            "Opened lmdb backend"
        );
        Ok(Self {
            dir: dir.to_path_buf(),
            env,
            db,
        })
    }
}

impl Engine for LmdbEngine {
    fn name(&self) -> &'static str {
        NAME
    }

    fn begin(&self) -> KvResult<Box<dyn Transaction + '_>> {
        let txn = self.env.write_txn().map_err(engine_err)?;
        Ok(Box::new(LmdbTxn { txn, db: self.db }))
    }
}

struct LmdbTxn<'e> {
    txn: RwTxn<'e>,
    db: Database<Bytes, Bytes>,
}

impl KvTxn for LmdbTxn<'_> {
    fn get(&mut self, key: &[u8]) -> KvResult<Option<Vec<u8>>> {
        if !storable(key) {
            return Ok(None);
        }
        let found = self.db.get(&self.txn, key).map_err(engine_err)?;
        Ok(found.map(<[u8]>::to_vec))
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> KvResult<()> {
        self.db.put(&mut self.txn, key, value).map_err(engine_err)
    }

    fn delete(&mut self, key: &[u8]) -> KvResult<()> {
        if !storable(key) {
            return Ok(());
        }
        self.db.delete(&mut self.txn, key).map_err(engine_err)?;
        Ok(())
    }

    fn walk(
        &mut self,
        begin: &[u8],
        end: Option<&[u8]>,
        visit: &mut dyn FnMut(&[u8], &[u8]) -> bool,
    ) -> KvResult<()> {
        if tkv_core::bound::is_empty_range(begin, end) {
            return Ok(());
        }
        // An empty key cannot be passed to LMDB, and sorts first anyway
        let lower = if begin.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Included(begin)
        };
        let bounds: (Bound<&[u8]>, Bound<&[u8]>) =
            (lower, end.map_or(Bound::Unbounded, Bound::Excluded));
        let range = self.db.range(&self.txn, &bounds).map_err(engine_err)?;
        for entry in range {
            let (key, value) = entry.map_err(engine_err)?;
            if !visit(key, value) {
                break;
            }
        }
        Ok(())
    }
}

impl Transaction for LmdbTxn<'_> {
    fn commit(self: Box<Self>) -> KvResult<()> {
        self.txn.commit().map_err(engine_err)
    }

    fn rollback(self: Box<Self>) {
        self.txn.abort();
    }
}
