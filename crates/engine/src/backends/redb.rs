//! redb backend
//!
//! One redb write transaction per [`Transaction`]. redb admits a single
//! writer at a time, so a transaction's view is stable for its lifetime and
//! concurrent read-modify-write cannot lose an update. A second `begin` on
//! the same thread while a transaction is open blocks forever.

use std::fmt::Display;
use std::ops::Bound;
use std::path::{Path, PathBuf};

use ::redb::{Database, ReadableTable, TableDefinition, WriteTransaction};
use tracing::{info, warn};

use tkv_core::{Engine, KvError, KvResult, KvTxn, Transaction};

use crate::client::Client;
use crate::config::TkvConfig;

/// Registered name
pub const NAME: &str = "redb";

const DATA_FILE_NAME: &str = "data.redb";
const TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("tkv");

fn engine_err(e: impl Display) -> KvError {
    KvError::engine(NAME, e)
}

/// Open (or create) a redb backend in `dir`
pub fn open(dir: &Path, config: &TkvConfig) -> KvResult<Client> {
    Ok(Client::new(RedbEngine::open(dir, config)?))
}

/// An opened redb database
pub struct RedbEngine {
    path: PathBuf,
    db: Database,
}

impl std::fmt::Debug for RedbEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbEngine").field("path", &self.path).finish()
    }
}

impl RedbEngine {
    /// Open `<dir>/data.redb`, creating the file and table if missing
    pub fn open(dir: &Path, config: &TkvConfig) -> KvResult<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(DATA_FILE_NAME);

        let mut builder = Database::builder();
        if let Some(bytes) = config.redb.cache_size {
            builder.set_cache_size(bytes);
        }
        let db = builder.create(&path).map_err(engine_err)?;

        // Make sure the table exists so reads never see TableDoesNotExist
        let init = db.begin_write().map_err(engine_err)?;
        init.open_table(TABLE).map_err(engine_err)?;
        init.commit().map_err(engine_err)?;

        info!(target: "tkv::redb", path = %path.display(), "Opened redb backend");
        Ok(Self { path, db })
    }
}

impl Engine for RedbEngine {
    fn name(&self) -> &'static str {
        NAME
    }

    fn begin(&self) -> KvResult<Box<dyn Transaction + '_>> {
        let txn = self.db.begin_write().map_err(engine_err)?;
        Ok(Box::new(RedbTxn { txn }))
    }
}

struct RedbTxn {
    txn: WriteTransaction,
}

impl KvTxn for RedbTxn {
    fn get(&mut self, key: &[u8]) -> KvResult<Option<Vec<u8>>> {
        let table = self.txn.open_table(TABLE).map_err(engine_err)?;
        let found = table.get(key).map_err(engine_err)?;
        Ok(found.map(|guard| guard.value().to_vec()))
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> KvResult<()> {
        let mut table = self.txn.open_table(TABLE).map_err(engine_err)?;
        table.insert(key, value).map_err(engine_err)?;
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> KvResult<()> {
        let mut table = self.txn.open_table(TABLE).map_err(engine_err)?;
        table.remove(key).map_err(engine_err)?;
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
        let upper = end.map_or(Bound::Unbounded, Bound::Excluded);
        let table = self.txn.open_table(TABLE).map_err(engine_err)?;
        let range = table
            .range::<&[u8]>((Bound::Included(begin), upper))
            .map_err(engine_err)?;
        for entry in range {
            let (key, value) = entry.map_err(engine_err)?;
            if !visit(key.value(), value.value()) {
                break;
            }
        }
        Ok(())
    }
}

impl Transaction for RedbTxn {
    fn commit(self: Box<Self>) -> KvResult<()> {
        self.txn.commit().map_err(engine_err)
    }

    fn rollback(self: Box<Self>) {
        if let Err(e) = self.txn.abort() {
            warn!(target: "tkv::redb", error = %e, "Rollback failed");
        }
    }
}
